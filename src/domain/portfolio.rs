//! Single-instrument portfolio state and equity tracking for the backtest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::{Position, RoundTrip};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub round_trips: Vec<RoundTrip>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            round_trips: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn shares(&self) -> i64 {
        self.position.as_ref().map_or(0, |p| p.shares)
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    pub fn record_equity(&mut self, date: NaiveDate, price: f64) {
        let value = self.total_equity(price);
        self.equity_curve.push(EquityPoint { date, value });
    }

    pub fn final_value(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |p| p.value)
    }
}
