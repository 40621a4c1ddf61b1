//! News sentiment reading attached to each scored symbol.

use serde::{Deserialize, Serialize};

/// Average polarity above this is bullish, below its negation bearish.
pub const POLARITY_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    #[default]
    Neutral,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub label: SentimentLabel,
    pub polarity: f64,
    pub article_count: usize,
}

impl Default for SentimentReading {
    fn default() -> Self {
        SentimentReading::neutral()
    }
}

impl SentimentReading {
    pub fn neutral() -> Self {
        SentimentReading {
            label: SentimentLabel::Neutral,
            polarity: 0.0,
            article_count: 0,
        }
    }

    /// Reading returned when headlines could not be fetched or scored.
    pub fn error() -> Self {
        SentimentReading {
            label: SentimentLabel::Error,
            polarity: 0.0,
            article_count: 0,
        }
    }

    /// Averages per-headline polarities in [-1, 1] into one reading.
    pub fn from_polarities(polarities: &[f64]) -> Self {
        if polarities.is_empty() {
            return SentimentReading::neutral();
        }

        let avg = polarities.iter().sum::<f64>() / polarities.len() as f64;
        let polarity = avg.clamp(-1.0, 1.0);
        let label = if polarity > POLARITY_THRESHOLD {
            SentimentLabel::Bullish
        } else if polarity < -POLARITY_THRESHOLD {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        };

        SentimentReading {
            label,
            polarity,
            article_count: polarities.len(),
        }
    }
}
