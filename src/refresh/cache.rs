//! In-memory holder of the last committed result set.
//!
//! The snapshot behind the lock is immutable; a commit swaps in a new `Arc`
//! so readers only ever hold the lock long enough to clone a pointer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::macro_context::MacroContext;
use crate::domain::signal::{CacheSnapshot, SignalResult, SkippedSymbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Ready,
    Loading,
}

/// Reader-facing copy of the cache contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResults {
    pub status: CacheStatus,
    pub generation: u64,
    pub generated_at: Option<DateTime<Utc>>,
    pub macro_context: Option<MacroContext>,
    pub results: Vec<SignalResult>,
    pub skipped: Vec<SkippedSymbol>,
}

impl CachedResults {
    pub fn loading() -> Self {
        CachedResults {
            status: CacheStatus::Loading,
            generation: 0,
            generated_at: None,
            macro_context: None,
            results: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn from_snapshot(snapshot: &CacheSnapshot) -> Self {
        CachedResults {
            status: CacheStatus::Ready,
            generation: snapshot.generation,
            generated_at: Some(snapshot.generated_at),
            macro_context: Some(snapshot.macro_context),
            results: snapshot.results.values().cloned().collect(),
            skipped: snapshot.skipped.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResultCache {
    current: RwLock<Option<Arc<CacheSnapshot>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.current.read().await.clone()
    }

    pub async fn read(&self) -> CachedResults {
        match self.snapshot().await {
            Some(snapshot) => CachedResults::from_snapshot(&snapshot),
            None => CachedResults::loading(),
        }
    }

    pub async fn generation(&self) -> u64 {
        self.current
            .read()
            .await
            .as_ref()
            .map_or(0, |s| s.generation)
    }

    /// Replaces the committed snapshot.
    pub async fn commit(&self, snapshot: CacheSnapshot) -> Arc<CacheSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().await = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Installs `snapshot` only if nothing has been committed yet.
    pub async fn seed(&self, snapshot: CacheSnapshot) -> bool {
        let mut current = self.current.write().await;
        if current.is_some() {
            return false;
        }
        *current = Some(Arc::new(snapshot));
        true
    }
}
