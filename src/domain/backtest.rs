//! Day-by-day replay of the scoring rule over a historical window.
//!
//! Each simulated day is either Flat or Long. Risk exits (stop-loss, then
//! take-profit) are checked first and end that day's processing; otherwise a
//! Flat portfolio may enter on a buy score and a Long one may exit on an
//! overbought RSI or a close above the upper band. Indicator values for day
//! `i` only use bars up to `i`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::EngineError;
use super::execution::{check_risk, enter_long, exit_long, EntryResult, ExecutionParams};
use super::indicator_helpers::{IndicatorFrame, IndicatorSnapshot};
use super::macro_context::MacroHistory;
use super::metrics::{max_drawdown_pct, Metrics};
use super::portfolio::{EquityPoint, Portfolio};
use super::price::{DataQuality, PriceSeries};
use super::sentiment::SentimentLabel;
use super::signal::SignalScorer;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub days: usize,
    /// Extra bars fetched ahead of the window so slow indicators are defined.
    pub warmup_bars: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            days: 365,
            warmup_bars: 200,
            stop_loss_pct: 7.0,
            take_profit_pct: 15.0,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn fetch_window(&self) -> usize {
        self.days.saturating_add(self.warmup_bars)
    }

    /// Macro bars the replay reads: one per simulated day, plus the close
    /// on or before the first day.
    pub fn macro_window(&self) -> usize {
        self.days.saturating_add(1)
    }

    /// Rejects requests that cannot be simulated.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.days == 0 {
            return Err(EngineError::Simulation {
                reason: "days must be positive".to_string(),
            });
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(EngineError::Simulation {
                reason: format!(
                    "initial capital must be positive, got {}",
                    self.initial_capital
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: TradeSide,
    pub date: NaiveDate,
    pub price: f64,
    pub shares: i64,
    pub reason: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub quality: DataQuality,
    pub initial_capital: f64,
    pub final_value: f64,
    pub return_pct: f64,
    pub benchmark_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub benchmark_max_drawdown_pct: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub benchmark_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
}

pub fn run_backtest(
    series: &PriceSeries,
    macro_history: &MacroHistory,
    scorer: &SignalScorer,
    config: &BacktestConfig,
) -> Result<BacktestResult, EngineError> {
    replay(series, macro_history, scorer, config, |_, _| {})
}

/// Runs the simulation, handing the portfolio to `inspect` at the close of
/// every simulated day.
fn replay(
    series: &PriceSeries,
    macro_history: &MacroHistory,
    scorer: &SignalScorer,
    config: &BacktestConfig,
    mut inspect: impl FnMut(NaiveDate, &Portfolio),
) -> Result<BacktestResult, EngineError> {
    config.validate()?;

    let points = series.points();
    if points.is_empty() {
        return Err(EngineError::data_unavailable(&series.symbol, "empty price series"));
    }

    let start = points.len() - config.days.min(points.len());
    let day0_price = points[start].close;
    if !day0_price.is_finite() || day0_price <= 0.0 {
        return Err(EngineError::data_unavailable(
            &series.symbol,
            format!("non-positive close on {}", points[start].date),
        ));
    }

    let frame = IndicatorFrame::compute(series, scorer.indicator_params());
    let scoring = scorer.config();
    let params = ExecutionParams {
        stop_loss_pct: config.stop_loss_pct,
        take_profit_pct: config.take_profit_pct,
    };
    let benchmark_shares = config.initial_capital / day0_price;

    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut trades = Vec::new();
    let mut benchmark_curve = Vec::with_capacity(points.len() - start);

    for (i, point) in points.iter().enumerate().skip(start) {
        let price = point.close;
        let indicators = frame.snapshot_at(i);
        let status = macro_history.at(point.date).status;
        let eval = scorer.evaluate(price, &indicators, status, SentimentLabel::Neutral);

        if let Some(risk) = check_risk(&portfolio, price) {
            if let Some(trip) = exit_long(&mut portfolio, price, point.date) {
                trades.push(Trade {
                    side: TradeSide::Sell,
                    date: point.date,
                    price,
                    shares: trip.shares,
                    reason: risk.reason().to_string(),
                    score: eval.score,
                });
            }
        } else if portfolio.is_flat() {
            if eval.score >= scoring.buy_threshold
                && let EntryResult::Entered { shares, .. } =
                    enter_long(&mut portfolio, price, point.date, &params)
            {
                let reason = if eval.reasons.is_empty() {
                    "buy score".to_string()
                } else {
                    eval.reasons.join(", ")
                };
                trades.push(Trade {
                    side: TradeSide::Buy,
                    date: point.date,
                    price,
                    shares,
                    reason,
                    score: eval.score,
                });
            }
        } else if let Some(reason) = signal_exit(price, &indicators, scoring.rsi_overbought)
            && let Some(trip) = exit_long(&mut portfolio, price, point.date)
        {
            trades.push(Trade {
                side: TradeSide::Sell,
                date: point.date,
                price,
                shares: trip.shares,
                reason,
                score: eval.score,
            });
        }

        portfolio.record_equity(point.date, price);
        inspect(point.date, &portfolio);
        benchmark_curve.push(EquityPoint {
            date: point.date,
            value: benchmark_shares * price,
        });
    }

    let final_value = portfolio.final_value();
    let benchmark_final = benchmark_curve
        .last()
        .map_or(config.initial_capital, |p| p.value);
    let metrics = Metrics::compute(
        &portfolio.equity_curve,
        &portfolio.round_trips,
        config.initial_capital,
        config.risk_free_rate,
    );

    debug!(
        symbol = %series.symbol,
        trades = trades.len(),
        final_value,
        "backtest finished"
    );

    Ok(BacktestResult {
        symbol: series.symbol.clone(),
        quality: series.quality,
        initial_capital: config.initial_capital,
        final_value,
        return_pct: (final_value / config.initial_capital - 1.0) * 100.0,
        benchmark_return_pct: (benchmark_final / config.initial_capital - 1.0) * 100.0,
        max_drawdown_pct: metrics.max_drawdown_pct,
        benchmark_max_drawdown_pct: max_drawdown_pct(&benchmark_curve),
        trades,
        equity_curve: portfolio.equity_curve,
        benchmark_curve,
        metrics,
    })
}

fn signal_exit(price: f64, ind: &IndicatorSnapshot, rsi_overbought: f64) -> Option<String> {
    if let Some(rsi) = ind.rsi14
        && rsi > rsi_overbought
    {
        return Some(format!("RSI overbought ({rsi:.1})"));
    }
    match ind.bb_upper {
        Some(upper) if price > upper => Some("price above upper Bollinger band".to_string()),
        _ => None,
    }
}
