//! Open long position and the closed-trade ledger entry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub entry_price: f64,
    pub quantity: u64,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.market_value(price) - self.cost_basis()
    }

    /// Liquidate at `exit_price`.
    pub fn close(self, exit_price: f64, exit_date: NaiveDate) -> ClosedTrade {
        let cost = self.cost_basis();
        let pnl = self.market_value(exit_price) - cost;
        let pnl_percent = if cost > 0.0 { pnl / cost } else { 0.0 };
        ClosedTrade {
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date,
            exit_price,
            quantity: self.quantity,
            pnl,
            pnl_percent,
        }
    }
}

/// `pnl_percent` is a fraction of the cost basis (0.1 == 10%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTrade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub quantity: u64,
    pub pnl: f64,
    pub pnl_percent: f64,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
