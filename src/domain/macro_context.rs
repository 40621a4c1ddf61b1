//! Market-wide fear classification from the volatility index and long-term yield.
//!
//! Resolution never fails: if either index cannot be fetched the neutral
//! fallback context is returned, tagged `DataQuality::Fallback`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::price::{DataQuality, PriceSeries};
use crate::ports::price_port::PriceSource;

pub const DEFAULT_VOLATILITY_SYMBOL: &str = "^VIX";
pub const DEFAULT_YIELD_SYMBOL: &str = "^TNX";

/// Bars fetched when only the latest value is needed.
const LATEST_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    #[default]
    Neutral,
    Fear,
    ExtremeFear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroThresholds {
    pub fear: f64,
    pub extreme_fear: f64,
}

impl Default for MacroThresholds {
    fn default() -> Self {
        MacroThresholds {
            fear: 20.0,
            extreme_fear: 30.0,
        }
    }
}

impl MacroThresholds {
    pub fn classify(&self, vix: f64) -> MarketStatus {
        if vix > self.extreme_fear {
            MarketStatus::ExtremeFear
        } else if vix > self.fear {
            MarketStatus::Fear
        } else {
            MarketStatus::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroContext {
    pub vix: Option<f64>,
    pub ten_year_yield: Option<f64>,
    pub status: MarketStatus,
    pub quality: DataQuality,
}

impl MacroContext {
    pub fn from_values(vix: f64, ten_year_yield: f64, thresholds: &MacroThresholds) -> Self {
        MacroContext {
            vix: Some(vix),
            ten_year_yield: Some(ten_year_yield),
            status: thresholds.classify(vix),
            quality: DataQuality::Real,
        }
    }

    /// Fixed neutral context used whenever index data is unavailable.
    pub fn neutral_fallback() -> Self {
        MacroContext {
            vix: None,
            ten_year_yield: None,
            status: MarketStatus::Neutral,
            quality: DataQuality::Fallback,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MacroResolver {
    pub volatility_symbol: String,
    pub yield_symbol: String,
    pub thresholds: MacroThresholds,
}

impl Default for MacroResolver {
    fn default() -> Self {
        MacroResolver {
            volatility_symbol: DEFAULT_VOLATILITY_SYMBOL.to_string(),
            yield_symbol: DEFAULT_YIELD_SYMBOL.to_string(),
            thresholds: MacroThresholds::default(),
        }
    }
}

impl MacroResolver {
    pub fn new(volatility_symbol: &str, yield_symbol: &str, thresholds: MacroThresholds) -> Self {
        MacroResolver {
            volatility_symbol: volatility_symbol.to_string(),
            yield_symbol: yield_symbol.to_string(),
            thresholds,
        }
    }

    /// Latest context, shared read-only by every symbol of one scoring cycle.
    pub fn resolve(&self, prices: &dyn PriceSource) -> MacroContext {
        let vix = self.latest_close(prices, &self.volatility_symbol);
        let ten_year = self.latest_close(prices, &self.yield_symbol);

        match (vix, ten_year) {
            (Some(vix), Some(ten_year)) => {
                let ctx = MacroContext::from_values(vix, ten_year, &self.thresholds);
                debug!(vix, ten_year, status = ?ctx.status, "macro context resolved");
                ctx
            }
            _ => MacroContext::neutral_fallback(),
        }
    }

    /// Per-day contexts for replaying history; see [`MacroHistory::at`].
    pub fn history(&self, prices: &dyn PriceSource, lookback: usize) -> MacroHistory {
        let fetch = |symbol: &str| match prices.fetch(symbol, lookback) {
            Ok(series) if !series.is_empty() => Some(series),
            Ok(_) => None,
            Err(e) => {
                warn!(symbol, error = %e, "macro history unavailable, replay uses neutral context");
                None
            }
        };

        MacroHistory {
            vix: fetch(&self.volatility_symbol),
            ten_year: fetch(&self.yield_symbol),
            thresholds: self.thresholds,
        }
    }

    fn latest_close(&self, prices: &dyn PriceSource, symbol: &str) -> Option<f64> {
        match prices.fetch(symbol, LATEST_LOOKBACK) {
            Ok(series) => {
                let close = series.last().map(|p| p.close);
                if close.is_none() {
                    warn!(symbol, "macro series is empty, using neutral fallback");
                }
                close
            }
            Err(e) => {
                warn!(symbol, error = %e, "macro fetch failed, using neutral fallback");
                None
            }
        }
    }
}

/// Historical index series for day-by-day macro classification.
#[derive(Debug, Clone)]
pub struct MacroHistory {
    vix: Option<PriceSeries>,
    ten_year: Option<PriceSeries>,
    thresholds: MacroThresholds,
}

impl MacroHistory {
    pub fn unavailable() -> Self {
        MacroHistory {
            vix: None,
            ten_year: None,
            thresholds: MacroThresholds::default(),
        }
    }

    /// Context as known at the close of `date`. The yield is informational
    /// only, so a missing yield still classifies from the volatility index.
    pub fn at(&self, date: NaiveDate) -> MacroContext {
        let vix = self.vix.as_ref().and_then(|s| s.close_on_or_before(date));
        let ten_year = self
            .ten_year
            .as_ref()
            .and_then(|s| s.close_on_or_before(date));

        match vix {
            Some(vix) => MacroContext {
                vix: Some(vix),
                ten_year_yield: ten_year,
                status: self.thresholds.classify(vix),
                quality: if ten_year.is_some() {
                    DataQuality::Real
                } else {
                    DataQuality::Fallback
                },
            },
            None => MacroContext::neutral_fallback(),
        }
    }
}
