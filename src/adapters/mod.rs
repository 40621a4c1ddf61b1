//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_snapshot_adapter;
pub mod json_watchlist_adapter;
pub mod neutral_sentiment;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
