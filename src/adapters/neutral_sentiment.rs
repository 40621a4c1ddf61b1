//! Sentiment provider used when no headline source is wired in.

use crate::domain::sentiment::SentimentReading;
use crate::ports::sentiment_port::SentimentProvider;

#[derive(Debug, Default, Clone, Copy)]
pub struct NeutralSentiment;

impl SentimentProvider for NeutralSentiment {
    fn analyze(&self, _symbol: &str) -> SentimentReading {
        SentimentReading::neutral()
    }
}
