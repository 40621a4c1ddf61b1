//! Durable storage for the committed result set.

use crate::domain::error::EngineError;
use crate::domain::signal::CacheSnapshot;

pub trait SnapshotStore: Send + Sync {
    /// Overwrites the single stored snapshot.
    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), EngineError>;

    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<CacheSnapshot>, EngineError>;
}
