//! Fill simulation for the backtest: whole-share entries at the close,
//! full exits, and stop-loss/take-profit trigger checks.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::{Position, RoundTrip};

/// Risk levels applied to every entry, in percent of the entry price.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionParams {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        ExecutionParams {
            stop_loss_pct: 7.0,
            take_profit_pct: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { shares: i64, price: f64, cost: f64 },
    InsufficientCash,
}

/// Buys as many whole shares as cash allows. The remainder stays uninvested.
pub fn enter_long(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    params: &ExecutionParams,
) -> EntryResult {
    if price <= 0.0 || !price.is_finite() || !portfolio.is_flat() {
        return EntryResult::InsufficientCash;
    }

    let mut shares = (portfolio.cash / price).floor() as i64;
    // Float division can round up by one share at exact multiples.
    while shares > 0 && shares as f64 * price > portfolio.cash {
        shares -= 1;
    }
    if shares <= 0 {
        return EntryResult::InsufficientCash;
    }

    let cost = shares as f64 * price;
    portfolio.cash -= cost;

    let stop_loss = if params.stop_loss_pct > 0.0 {
        price * (1.0 - params.stop_loss_pct / 100.0)
    } else {
        0.0
    };
    let take_profit = if params.take_profit_pct > 0.0 {
        price * (1.0 + params.take_profit_pct / 100.0)
    } else {
        0.0
    };

    portfolio.position = Some(Position {
        shares,
        entry_price: price,
        entry_date: date,
        stop_loss,
        take_profit,
    });

    EntryResult::Entered {
        shares,
        price,
        cost,
    }
}

/// Sells the whole position at `price`. `None` when already flat.
pub fn exit_long(portfolio: &mut Portfolio, price: f64, date: NaiveDate) -> Option<RoundTrip> {
    let position = portfolio.position.take()?;

    portfolio.cash += position.market_value(price);

    let trip = RoundTrip {
        shares: position.shares,
        entry_price: position.entry_price,
        exit_price: price,
        entry_date: position.entry_date,
        exit_date: date,
        pnl: position.unrealized_pnl(price),
    };
    portfolio.round_trips.push(trip.clone());
    Some(trip)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskExit {
    StopLoss,
    TakeProfit,
}

impl RiskExit {
    pub fn reason(self) -> &'static str {
        match self {
            RiskExit::StopLoss => "stop loss",
            RiskExit::TakeProfit => "take profit",
        }
    }
}

/// Stop-loss is checked before take-profit.
pub fn check_risk(portfolio: &Portfolio, price: f64) -> Option<RiskExit> {
    let position = portfolio.position.as_ref()?;
    if position.should_stop_loss(price) {
        Some(RiskExit::StopLoss)
    } else if position.should_take_profit(price) {
        Some(RiskExit::TakeProfit)
    } else {
        None
    }
}
