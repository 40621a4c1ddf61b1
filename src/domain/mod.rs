//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod forecast;
pub mod indicator;
pub mod indicator_helpers;
pub mod macro_context;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod price;
pub mod sentiment;
pub mod settings;
pub mod signal;
pub mod universe;
