//! News sentiment port.

use crate::domain::sentiment::SentimentReading;

pub trait SentimentProvider: Send + Sync {
    /// Never fails: implementations return `SentimentReading::error()` or a
    /// neutral reading when headlines cannot be scored.
    fn analyze(&self, symbol: &str) -> SentimentReading;
}
