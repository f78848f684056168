//! Cash ledger and equity-curve tracking.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::metrics::round_cents;
use crate::domain::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Append-only equity series with a single sanctioned revision.
///
/// During the bar loop exactly one point is recorded per bar. After the loop,
/// [`EquityCurve::finalize`] may replace the value of the last point once,
/// when an open position is liquidated at the end of the series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, date: NaiveDate, equity: f64) {
        self.points.push(EquityPoint {
            date,
            equity: round_cents(equity),
        });
    }

    /// Overwrite the last recorded value. No-op on an empty curve.
    pub fn finalize(&mut self, equity: f64) {
        if let Some(last) = self.points.last_mut() {
            last.equity = round_cents(equity);
        }
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<EquityPoint> {
        self.points
    }
}

/// Points dated within `[start, end]`, inclusive. Expects date-ascending input.
pub fn equity_window(points: &[EquityPoint], start: NaiveDate, end: NaiveDate) -> &[EquityPoint] {
    if start > end {
        return &[];
    }
    let lo = points.partition_point(|p| p.date < start);
    let hi = points.partition_point(|p| p.date <= end);
    &points[lo..hi]
}

/// Cash, the single open lot, closed trades and the equity curve of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub equity: EquityCurve,
}

impl Ledger {
    pub fn new(initial_capital: f64, bar_count: usize) -> Self {
        Ledger {
            cash: initial_capital,
            initial_capital,
            position: None,
            trades: Vec::new(),
            equity: EquityCurve::with_capacity(bar_count),
        }
    }

    pub fn shares(&self) -> u64 {
        self.position.as_ref().map_or(0, |p| p.shares)
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Buy `shares` at `price`, debiting cash. Ignored if a lot is already open
    /// or `shares` is zero.
    pub fn open(&mut self, date: NaiveDate, price: f64, shares: u64) -> bool {
        if self.position.is_some() || shares == 0 {
            return false;
        }
        self.cash -= shares as f64 * price;
        self.position = Some(Position {
            shares,
            entry_price: price,
            entry_date: date,
        });
        true
    }

    /// Sell the whole open lot at `price`, crediting cash and logging the trade.
    pub fn close(&mut self, date: NaiveDate, price: f64) -> Option<&Trade> {
        let position = self.position.take()?;
        self.cash += position.market_value(price);
        self.trades.push(position.close(date, price));
        self.trades.last()
    }

    /// Cash plus the open lot valued at `price`.
    pub fn equity_at(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    /// Record the mark-to-market equity for one bar.
    pub fn mark(&mut self, date: NaiveDate, close: f64) {
        let equity = self.equity_at(close);
        self.equity.record(date, equity);
    }
}
