//! Historical price access port.

use crate::domain::error::EngineError;
use crate::domain::price::PriceSeries;

pub trait PriceSource: Send + Sync {
    /// Returns at most the `lookback` most recent daily bars for `symbol`,
    /// date-ordered, or `EngineError::DataUnavailable`.
    fn fetch(&self, symbol: &str, lookback: usize) -> Result<PriceSeries, EngineError>;
}
