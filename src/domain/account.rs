//! Cash, the single long position, and equity tracking for one run.
//!
//! Fills happen at the bar's close with whole shares only; there is no
//! slippage or commission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { quantity: u64, cost: f64 },
    AlreadyLong,
    InsufficientCapital,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub initial_capital: f64,
    pub cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Account {
    pub fn new(initial_capital: f64) -> Self {
        Account {
            initial_capital,
            cash: initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_long(&self) -> bool {
        self.position.is_some()
    }

    /// Open a long position with all available cash.
    ///
    /// Steps:
    /// 1. Refuse if a position is already open
    /// 2. Require cash strictly above the price
    /// 3. quantity = floor(cash / price), refuse if zero
    /// 4. Deduct quantity * price from cash and open the position
    pub fn enter_long(&mut self, price: f64, date: NaiveDate, index: usize) -> EntryResult {
        if self.position.is_some() {
            return EntryResult::AlreadyLong;
        }
        if price.is_nan() || price <= 0.0 || self.cash <= price {
            return EntryResult::InsufficientCapital;
        }

        let quantity = (self.cash / price).floor() as u64;
        if quantity == 0 {
            return EntryResult::InsufficientCapital;
        }

        let cost = quantity as f64 * price;
        self.cash -= cost;
        self.position = Some(Position {
            entry_price: price,
            quantity,
            entry_index: index,
            entry_date: date,
        });

        EntryResult::Entered { quantity, cost }
    }

    /// Liquidate the open position at `price`, crediting the proceeds and
    /// recording the trade. Returns `None` when flat.
    pub fn exit_long(&mut self, price: f64, date: NaiveDate) -> Option<&ClosedTrade> {
        let position = self.position.take()?;
        self.cash += position.market_value(price);
        self.trades.push(position.close(price, date));
        self.trades.last()
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |p| p.market_value(price))
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }
}
