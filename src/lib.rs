//! signalcast: technical-indicator signal scoring with a cached refresh loop
//! and a daily long-only backtester.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], the refresh loop in [`refresh`]
//! and explicit wiring in [`engine`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod refresh;
