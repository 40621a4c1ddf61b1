//! Watchlist read from a JSON array of symbols.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::domain::error::EngineError;
use crate::ports::watchlist_port::WatchlistStore;

pub struct JsonWatchlistStore {
    path: PathBuf,
}

impl JsonWatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WatchlistStore for JsonWatchlistStore {
    fn list(&self) -> Result<Vec<String>, EngineError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let symbols: Vec<String> = serde_json::from_str(&content)?;
        Ok(symbols
            .into_iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Watchlist used when none is configured.
#[derive(Debug, Default)]
pub struct EmptyWatchlist;

impl WatchlistStore for EmptyWatchlist {
    fn list(&self) -> Result<Vec<String>, EngineError> {
        Ok(Vec::new())
    }
}
