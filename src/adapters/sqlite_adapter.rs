//! SQLite snapshot adapter.
//!
//! Keeps the single committed snapshot as a JSON payload in a one-row table.

use crate::domain::error::EngineError;
use crate::domain::signal::CacheSnapshot;
use crate::ports::snapshot_port::SnapshotStore;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

pub struct SqliteSnapshotStore {
    pool: Pool<SqliteConnectionManager>,
}

fn storage_err(e: impl std::fmt::Display) -> EngineError {
    EngineError::Storage {
        reason: e.to_string(),
    }
}

impl SqliteSnapshotStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(storage_err)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, EngineError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(storage_err)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, EngineError> {
        self.pool.get().map_err(storage_err)
    }

    fn initialize_schema(&self) -> Result<(), EngineError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS signal_snapshot (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    generation INTEGER NOT NULL,
                    generated_at TEXT NOT NULL,
                    payload TEXT NOT NULL
                );",
            )
            .map_err(storage_err)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), EngineError> {
        let payload = serde_json::to_string(snapshot)?;
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO signal_snapshot (id, generation, generated_at, payload)
                 VALUES (1, ?1, ?2, ?3)",
                params![
                    snapshot.generation as i64,
                    snapshot.generated_at.to_rfc3339(),
                    payload
                ],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<CacheSnapshot>, EngineError> {
        let payload: Option<String> = self
            .conn()?
            .query_row(
                "SELECT payload FROM signal_snapshot WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage_err)?;

        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }
}
