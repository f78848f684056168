//! Open position and closed trade records.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::metrics::round_cents;

/// The single open long lot.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// Close the whole lot at `exit_price`, producing the round-trip record.
    pub fn close(&self, exit_date: NaiveDate, exit_price: f64) -> Trade {
        let cost_basis = self.cost_basis();
        let pnl = self.market_value(exit_price) - cost_basis;
        let return_pct = if cost_basis != 0.0 {
            round_cents(pnl / cost_basis * 100.0)
        } else {
            0.0
        };
        Trade {
            entry_date: self.entry_date,
            exit_date,
            entry_price: round_cents(self.entry_price),
            exit_price: round_cents(exit_price),
            shares: self.shares,
            pnl: round_cents(pnl),
            return_pct,
        }
    }
}

/// A closed round trip. Prices, PnL and return are stored rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
    pub pnl: f64,
    pub return_pct: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
