//! Scheduled and on-demand rescoring with a stale-readable result cache.

pub mod cache;
pub mod coordinator;

pub use cache::{CacheStatus, CachedResults, ResultCache};
pub use coordinator::{RefreshCoordinator, RefreshOutcome};
