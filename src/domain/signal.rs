//! Signal scorer: turns indicators, macro context and sentiment into an
//! additive opportunity score and a discrete recommendation.
//!
//! Terms are evaluated in a fixed order and each contributing term appends
//! one reason, so `reasons` always reads in evaluation order:
//!
//! 1. RSI oversold (or the silent soft-RSI bonus)
//! 2. price below the lower Bollinger band
//! 3. MACD line above its signal line
//! 4. price above SMA200
//! 5. macro fear / extreme fear penalty
//! 6. news sentiment
//!
//! An indicator without enough history contributes nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;
use crate::domain::forecast::Forecast;
use crate::domain::indicator::bollinger;
use crate::domain::indicator_helpers::{IndicatorFrame, IndicatorParams, IndicatorSnapshot};
use crate::domain::macro_context::{MacroContext, MarketStatus};
use crate::domain::price::{DataQuality, PriceSeries};
use crate::domain::sentiment::{SentimentLabel, SentimentReading};
use crate::ports::forecast_port::ForecastProvider;

/// Point values and thresholds of the scoring rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub rsi_oversold: f64,
    pub rsi_soft: f64,
    pub rsi_overbought: f64,
    pub oversold_points: f64,
    pub soft_rsi_points: f64,
    pub lower_band_points: f64,
    pub macd_points: f64,
    pub trend_points: f64,
    pub fear_penalty: f64,
    pub extreme_fear_penalty: f64,
    pub news_points: f64,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub bollinger_std_dev: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            rsi_oversold: 30.0,
            rsi_soft: 40.0,
            rsi_overbought: 70.0,
            oversold_points: 2.0,
            soft_rsi_points: 0.5,
            lower_band_points: 2.0,
            macd_points: 1.0,
            trend_points: 0.5,
            fear_penalty: 1.0,
            extreme_fear_penalty: 2.0,
            news_points: 1.0,
            buy_threshold: 2.5,
            sell_threshold: -1.0,
            bollinger_std_dev: 2.0,
        }
    }
}

impl ScoringConfig {
    /// Indicator windows with the configured Bollinger width applied.
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            bollinger_stddev_mult_x100: bollinger::mult_to_x100(self.bollinger_std_dev),
            ..IndicatorParams::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "COMPRAR")]
    Buy,
    #[serde(rename = "VENDER")]
    Sell,
    #[serde(rename = "MANTENER")]
    Hold,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::Buy => "COMPRAR",
            Recommendation::Sell => "VENDER",
            Recommendation::Hold => "MANTENER",
        };
        write!(f, "{label}")
    }
}

/// Score and ordered reasons produced by one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub symbol: String,
    pub current_price: f64,
    pub score: f64,
    pub recommendation: Recommendation,
    pub reasons: Vec<String>,
    pub is_opportunity: bool,
    pub watchlisted: bool,
    pub quality: DataQuality,
    pub indicators: IndicatorSnapshot,
    pub sentiment: SentimentReading,
    pub forecast: Option<Forecast>,
    pub generated_at: DateTime<Utc>,
}

impl SignalResult {
    /// Watch-listed symbols are always surfaced as opportunities.
    pub fn watchlisted(mut self) -> Self {
        self.watchlisted = true;
        self.is_opportunity = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// One committed result set. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub generation: u64,
    pub generated_at: DateTime<Utc>,
    pub macro_context: MacroContext,
    pub results: BTreeMap<String, SignalResult>,
    #[serde(default)]
    pub skipped: Vec<SkippedSymbol>,
}

impl CacheSnapshot {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn opportunities(&self) -> impl Iterator<Item = &SignalResult> {
        self.results.values().filter(|r| r.is_opportunity)
    }
}

#[derive(Clone, Default)]
pub struct SignalScorer {
    config: ScoringConfig,
    params: IndicatorParams,
    forecast: Option<Arc<dyn ForecastProvider>>,
}

impl fmt::Debug for SignalScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalScorer")
            .field("config", &self.config)
            .field("params", &self.params)
            .field("forecast", &self.forecast.is_some())
            .finish()
    }
}

impl SignalScorer {
    pub fn new(config: ScoringConfig) -> Self {
        let params = config.indicator_params();
        SignalScorer {
            config,
            params,
            forecast: None,
        }
    }

    pub fn with_forecast(mut self, provider: Arc<dyn ForecastProvider>) -> Self {
        self.forecast = Some(provider);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn indicator_params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Applies the additive rule to one bar's indicator values.
    pub fn evaluate(
        &self,
        price: f64,
        ind: &IndicatorSnapshot,
        status: MarketStatus,
        sentiment: SentimentLabel,
    ) -> Evaluation {
        let cfg = &self.config;
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if let Some(rsi) = ind.rsi14 {
            if rsi < cfg.rsi_oversold {
                score += cfg.oversold_points;
                reasons.push(format!("RSI oversold ({rsi:.1})"));
            } else if rsi < cfg.rsi_soft {
                score += cfg.soft_rsi_points;
            }
        }

        if let Some(lower) = ind.bb_lower
            && price < lower
        {
            score += cfg.lower_band_points;
            reasons.push("price below lower Bollinger band".to_string());
        }

        if let (Some(line), Some(signal)) = (ind.macd_line, ind.macd_signal)
            && line > signal
        {
            score += cfg.macd_points;
            reasons.push("bullish MACD crossover".to_string());
        }

        if let Some(sma200) = ind.sma200
            && price > sma200
        {
            score += cfg.trend_points;
            reasons.push("above long-term trend (SMA200)".to_string());
        }

        match status {
            MarketStatus::Fear if score > 0.0 => {
                score -= cfg.fear_penalty;
                reasons.push("market fear penalty".to_string());
            }
            MarketStatus::ExtremeFear => {
                score -= cfg.extreme_fear_penalty;
                reasons.push("extreme fear penalty".to_string());
            }
            _ => {}
        }

        match sentiment {
            SentimentLabel::Bullish => {
                score += cfg.news_points;
                reasons.push("positive news".to_string());
            }
            SentimentLabel::Bearish => {
                score -= cfg.news_points;
                reasons.push("negative news".to_string());
            }
            SentimentLabel::Neutral | SentimentLabel::Error => {}
        }

        Evaluation { score, reasons }
    }

    pub fn recommend(&self, score: f64) -> Recommendation {
        if score >= self.config.buy_threshold {
            Recommendation::Buy
        } else if score <= self.config.sell_threshold {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }

    /// Scores the latest bar of `series`.
    pub fn score(
        &self,
        series: &PriceSeries,
        macro_context: &MacroContext,
        sentiment: SentimentReading,
        generated_at: DateTime<Utc>,
    ) -> Result<SignalResult, EngineError> {
        let last = series
            .last()
            .ok_or_else(|| EngineError::data_unavailable(&series.symbol, "empty price series"))?;
        let current_price = last.close;

        let indicators = IndicatorFrame::compute(series, &self.params).latest();
        let Evaluation { score, reasons } = self.evaluate(
            current_price,
            &indicators,
            macro_context.status,
            sentiment.label,
        );
        let recommendation = self.recommend(score);
        let forecast = Forecast::resolve(
            self.forecast.as_deref(),
            &series.symbol,
            current_price,
            score,
        );

        Ok(SignalResult {
            symbol: series.symbol.clone(),
            current_price,
            score,
            recommendation,
            reasons,
            is_opportunity: recommendation != Recommendation::Hold,
            watchlisted: false,
            quality: series.quality,
            indicators,
            sentiment,
            forecast: Some(forecast),
            generated_at,
        })
    }
}
