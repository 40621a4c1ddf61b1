//! Short-horizon price projection attached to each signal.
//!
//! A trained model is optional. Without one the projection is derived from
//! the technical score and tagged `ForecastSource::RuleBased`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ports::forecast_port::ForecastProvider;

pub const DEFAULT_HORIZON_DAYS: u32 = 5;

/// Raw output of a forecasting model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    pub predicted_prices: Vec<f64>,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSource {
    Model,
    RuleBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: u32,
    pub predicted_price: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub source: ForecastSource,
    pub trend: Trend,
    pub days: Vec<ForecastDay>,
    pub average_change_percent: f64,
}

impl Forecast {
    /// Uses the model when it produced a usable forecast, otherwise projects from the score.
    pub fn resolve(
        provider: Option<&dyn ForecastProvider>,
        symbol: &str,
        current_price: f64,
        score: f64,
    ) -> Forecast {
        provider
            .and_then(|p| p.predict(symbol))
            .and_then(|model| Forecast::from_model(current_price, &model))
            .unwrap_or_else(|| {
                debug!(symbol, "no model forecast, using rule-based projection");
                Forecast::rule_based(current_price, score, DEFAULT_HORIZON_DAYS)
            })
    }

    pub fn from_model(current_price: f64, model: &ModelForecast) -> Option<Forecast> {
        if !model.success || model.predicted_prices.is_empty() || current_price <= 0.0 {
            return None;
        }

        let days: Vec<ForecastDay> = model
            .predicted_prices
            .iter()
            .enumerate()
            .map(|(i, &price)| ForecastDay {
                day: i as u32 + 1,
                predicted_price: price,
                change_percent: (price - current_price) / current_price * 100.0,
            })
            .collect();

        let average_change_percent =
            days.iter().map(|d| d.change_percent).sum::<f64>() / days.len() as f64;
        let trend = if average_change_percent > 1.0 {
            Trend::Bullish
        } else if average_change_percent < -1.0 {
            Trend::Bearish
        } else {
            Trend::Neutral
        };

        Some(Forecast {
            source: ForecastSource::Model,
            trend,
            days,
            average_change_percent,
        })
    }

    pub fn rule_based(current_price: f64, score: f64, horizon: u32) -> Forecast {
        let daily_change = if score >= 2.5 {
            0.005
        } else if score >= 1.0 {
            0.002
        } else if score <= -2.0 {
            -0.005
        } else if score <= -1.0 {
            -0.002
        } else {
            0.0
        };

        let mut price = current_price;
        let mut days = Vec::with_capacity(horizon as usize);
        for day in 1..=horizon {
            price *= 1.0 + daily_change;
            let change_percent = if current_price > 0.0 {
                (price - current_price) / current_price * 100.0
            } else {
                0.0
            };
            days.push(ForecastDay {
                day,
                predicted_price: price,
                change_percent,
            });
        }

        let trend = if score > 0.0 {
            Trend::Bullish
        } else if score < 0.0 {
            Trend::Bearish
        } else {
            Trend::Neutral
        };

        Forecast {
            source: ForecastSource::RuleBased,
            trend,
            average_change_percent: days.last().map_or(0.0, |d| d.change_percent),
            days,
        }
    }
}
