//! Open long position and completed round trips of the backtest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }

    /// A zero level disables the rule.
    pub fn should_stop_loss(&self, price: f64) -> bool {
        self.stop_loss > 0.0 && price <= self.stop_loss
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        self.take_profit > 0.0 && price >= self.take_profit
    }
}

/// A BUY matched with the SELL that closed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub shares: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            shares: 100,
            entry_price: 50.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            stop_loss: 46.5,
            take_profit: 57.5,
        }
    }

    #[test]
    fn market_value() {
        assert!((sample_position().market_value(55.0) - 5500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl() {
        let pos = sample_position();
        assert!((pos.unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(45.0) - (-500.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_loss_triggers_at_or_below_level() {
        let pos = sample_position();
        assert!(pos.should_stop_loss(46.5));
        assert!(pos.should_stop_loss(40.0));
        assert!(!pos.should_stop_loss(47.0));
    }

    #[test]
    fn take_profit_triggers_at_or_above_level() {
        let pos = sample_position();
        assert!(pos.should_take_profit(57.5));
        assert!(pos.should_take_profit(60.0));
        assert!(!pos.should_take_profit(57.0));
    }

    #[test]
    fn zero_levels_disable_rules() {
        let pos = Position {
            stop_loss: 0.0,
            take_profit: 0.0,
            ..sample_position()
        };
        assert!(!pos.should_stop_loss(0.01));
        assert!(!pos.should_take_profit(1_000_000.0));
    }
}
