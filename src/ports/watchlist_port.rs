//! Watch-listed symbols (read-only from the engine's side).

use crate::domain::error::EngineError;

pub trait WatchlistStore: Send + Sync {
    fn list(&self) -> Result<Vec<String>, EngineError>;
}
