//! Performance metrics for a simulated equity curve.

use serde::{Deserialize, Serialize};

use super::portfolio::EquityPoint;
use super::position::RoundTrip;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub annualized_return_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_duration: i64,
    pub round_trips: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    /// `None` when there were no losing round trips.
    pub profit_factor: Option<f64>,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(
        equity_curve: &[EquityPoint],
        round_trips: &[RoundTrip],
        initial_capital: f64,
        risk_free_rate: f64,
    ) -> Self {
        let final_value = equity_curve.last().map_or(initial_capital, |p| p.value);
        let total_return = if initial_capital > 0.0 {
            final_value / initial_capital - 1.0
        } else {
            0.0
        };

        let years = equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return_pct = if years > 0.0 && total_return > -1.0 {
            ((1.0 + total_return).powf(1.0 / years) - 1.0) * 100.0
        } else {
            0.0
        };

        let (max_drawdown_pct, max_drawdown_duration) = compute_drawdown(equity_curve);
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_duration_days = 0i64;

        for trip in round_trips {
            if trip.pnl > 0.0 {
                trades_won += 1;
                total_wins += trip.pnl;
                largest_win = largest_win.max(trip.pnl);
            } else if trip.pnl < 0.0 {
                trades_lost += 1;
                total_losses += trip.pnl.abs();
                largest_loss = largest_loss.max(trip.pnl.abs());
            }
            total_duration_days += (trip.exit_date - trip.entry_date).num_days();
        }

        let count = round_trips.len();
        let win_rate = if count > 0 {
            trades_won as f64 / count as f64
        } else {
            0.0
        };
        let profit_factor = if total_losses > 0.0 {
            Some(total_wins / total_losses)
        } else {
            None
        };
        let avg_trade_duration = if count > 0 {
            total_duration_days as f64 / count as f64
        } else {
            0.0
        };

        Metrics {
            annualized_return_pct,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown_pct,
            max_drawdown_duration,
            round_trips: count,
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            largest_win,
            largest_loss,
            avg_trade_duration,
        }
    }
}

/// Largest peak-to-trough decline in percent of the running peak.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    compute_drawdown(equity_curve).0
}

/// Returns (max drawdown percent, longest run of bars below a prior peak).
fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.value;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0i64;
    let mut duration = 0i64;

    for point in equity_curve {
        if point.value >= peak {
            peak = point.value;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.value) / peak * 100.0);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].value;
            if prev > 0.0 {
                (w[1].value - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        excess_return / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        excess_return / downside_stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
