//! Order scheduling, sizing and settlement.
//!
//! Signals seen on one bar become a [`PendingOrder`] executed at the next
//! bar's open ([`ExecutionPolicy::OrderLag`]), or are filled on the spot at
//! the bar's known next open ([`ExecutionPolicy::Immediate`]).

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::equity::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    /// Schedule an order on signal, settle it when the loop reaches its bar.
    #[default]
    OrderLag,
    /// Fill at the signal bar's `next_open`; force-close on the final bar.
    Immediate,
}

impl fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPolicy::OrderLag => write!(f, "order_lag"),
            ExecutionPolicy::Immediate => write!(f, "immediate"),
        }
    }
}

impl FromStr for ExecutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "order_lag" | "lag" => Ok(ExecutionPolicy::OrderLag),
            "immediate" => Ok(ExecutionPolicy::Immediate),
            other => Err(format!(
                "unknown execution policy '{}' (expected order_lag or immediate)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTicket {
    pub date: NaiveDate,
    pub price: f64,
    pub shares: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PendingOrder {
    #[default]
    None,
    Buy(OrderTicket),
    Sell(OrderTicket),
}

impl PendingOrder {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingOrder::None)
    }

    /// Take the order if it is due on `date`, leaving `None` behind.
    pub fn take_due(&mut self, date: NaiveDate) -> PendingOrder {
        let due = match self {
            PendingOrder::Buy(t) | PendingOrder::Sell(t) => t.date == date,
            PendingOrder::None => false,
        };
        if due {
            std::mem::take(self)
        } else {
            PendingOrder::None
        }
    }
}

/// Why a buy crossover produced no order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    /// The sized share count rounded down to zero.
    InsufficientFunds { cash: f64, price: f64 },
    /// The fill would land on the final bar and be liquidated at once.
    NoHoldingPeriod,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientFunds { cash, price } => write!(
                f,
                "insufficient funds: cash {:.2} buys no shares at {:.2}",
                cash, price
            ),
            SkipReason::NoHoldingPeriod => write!(f, "fill would fall on the final bar"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSignal {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Whole shares affordable with `allocation` of `cash` at `price`.
pub fn size_order(cash: f64, price: f64, allocation: f64) -> u64 {
    if price.is_nan() || price <= 0.0 || cash.is_nan() || cash <= 0.0 {
        return 0;
    }
    let shares = (cash * allocation / price).floor();
    if shares.is_finite() && shares > 0.0 {
        shares as u64
    } else {
        0
    }
}

/// Apply a due order to the ledger.
pub fn settle(ledger: &mut Ledger, order: PendingOrder) {
    match order {
        PendingOrder::Buy(ticket) => {
            if ledger.open(ticket.date, ticket.price, ticket.shares) {
                tracing::debug!(
                    date = %ticket.date,
                    price = ticket.price,
                    shares = ticket.shares,
                    cash = ledger.cash,
                    "buy settled"
                );
            }
        }
        PendingOrder::Sell(ticket) => {
            if let Some(trade) = ledger.close(ticket.date, ticket.price) {
                tracing::debug!(
                    date = %ticket.date,
                    price = ticket.price,
                    shares = trade.shares,
                    pnl = trade.pnl,
                    "sell settled"
                );
            }
        }
        PendingOrder::None => {}
    }
}
