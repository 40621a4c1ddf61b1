//! Port traits for the engine's external collaborators.
//!
//! Every port is `Send + Sync` so one instance can be shared between the
//! scheduler task and the scoring worker pool.

pub mod config_port;
pub mod forecast_port;
pub mod price_port;
pub mod sentiment_port;
pub mod snapshot_port;
pub mod watchlist_port;
