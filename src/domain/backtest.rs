//! Backtest engine and bar loop.
//!
//! Converts a validated price history into a trade log and an equity curve
//! using a fast/slow SMA crossover over adjusted closes. The run is pure:
//! the same bars and config always produce the same [`BacktestResult`].

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::domain::equity::{equity_window, EquityPoint, Ledger};
use crate::domain::error::HindsightError;
use crate::domain::execution::{
    settle, size_order, ExecutionPolicy, OrderTicket, PendingOrder, SkipReason, SkippedSignal,
};
use crate::domain::metrics::BacktestSummary;
use crate::domain::position::Trade;
use crate::domain::price_bar::{PriceBar, PriceHistory};
use crate::domain::signal::{Crossover, CrossoverSignals};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_FAST_PERIOD: usize = 5;
pub const DEFAULT_SLOW_PERIOD: usize = 15;
pub const DEFAULT_ALLOCATION: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub fast_period: usize,
    pub slow_period: usize,
    /// Fraction of cash committed to each entry.
    pub allocation: f64,
    pub policy: ExecutionPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
            allocation: DEFAULT_ALLOCATION,
            policy: ExecutionPolicy::OrderLag,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), HindsightError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(HindsightError::validation(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !(self.allocation > 0.0 && self.allocation <= 1.0) {
            return Err(HindsightError::validation(format!(
                "allocation must be in (0, 1], got {}",
                self.allocation
            )));
        }
        if self.fast_period == 0 || self.slow_period == 0 {
            return Err(HindsightError::validation(
                "moving average periods must be at least 1",
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(HindsightError::validation(format!(
                "fast period ({}) must be shorter than slow period ({})",
                self.fast_period, self.slow_period
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub symbol: String,
    pub name: String,
    pub summary: BacktestSummary,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub price_history: Vec<PriceBar>,
    pub skipped_signals: Vec<SkippedSignal>,
}

impl BacktestResult {
    /// Equity points dated within `[start, end]`.
    pub fn equity_window(&self, start: NaiveDate, end: NaiveDate) -> &[EquityPoint] {
        equity_window(&self.equity_curve, start, end)
    }
}

/// Validate `bars` and run the backtest.
pub fn run_backtest(
    symbol: &str,
    name: &str,
    bars: &[PriceBar],
    config: &BacktestConfig,
) -> Result<BacktestResult, HindsightError> {
    let history = PriceHistory::new(bars.to_vec())?;
    run_history(symbol, name, history, config)
}

/// Run the backtest over an already-validated history.
#[instrument(skip(name, history, config), fields(bars = history.len(), policy = %config.policy))]
pub fn run_history(
    symbol: &str,
    name: &str,
    history: PriceHistory,
    config: &BacktestConfig,
) -> Result<BacktestResult, HindsightError> {
    config.validate()?;

    let signals = CrossoverSignals::compute(
        &history.adj_closes(),
        config.fast_period,
        config.slow_period,
    );

    let mut run = Run {
        bars: history.bars(),
        signals,
        config,
        ledger: Ledger::new(config.initial_capital, history.len()),
        pending: PendingOrder::None,
        skipped: Vec::new(),
    };
    match config.policy {
        ExecutionPolicy::OrderLag => run.order_lag(),
        ExecutionPolicy::Immediate => run.immediate(),
    }

    let Run {
        ledger, skipped, ..
    } = run;
    let equity_curve = ledger.equity.into_points();
    let summary = BacktestSummary::compute(&equity_curve, &ledger.trades, config.initial_capital);
    debug!(
        trades = summary.trade_count,
        final_equity = summary.final_equity,
        "backtest complete"
    );

    Ok(BacktestResult {
        symbol: symbol.trim().to_uppercase(),
        name: name.to_string(),
        summary,
        equity_curve,
        trades: ledger.trades,
        price_history: history.into_bars(),
        skipped_signals: skipped,
    })
}

/// Mutable state of one run. Fresh per invocation.
struct Run<'a> {
    bars: &'a [PriceBar],
    signals: CrossoverSignals,
    config: &'a BacktestConfig,
    ledger: Ledger,
    pending: PendingOrder,
    skipped: Vec<SkippedSignal>,
}

impl Run<'_> {
    fn order_lag(&mut self) {
        let bars = self.bars;
        for (i, bar) in bars.iter().enumerate() {
            let due = self.pending.take_due(bar.date);
            settle(&mut self.ledger, due);

            let next = if self.pending.is_none() { bars.get(i + 1) } else { None };
            if let Some(next) = next {
                match (self.signals.at(i), self.ledger.is_flat()) {
                    (Crossover::Up, true) => {
                        if let Some(shares) = self.entry_shares(i, bar.date, next.open) {
                            self.pending = PendingOrder::Buy(OrderTicket {
                                date: next.date,
                                price: next.open,
                                shares,
                            });
                            debug!(signal = %bar.date, fill = %next.date, shares, "buy scheduled");
                        }
                    }
                    (Crossover::Down, false) => {
                        self.pending = PendingOrder::Sell(OrderTicket {
                            date: next.date,
                            price: next.open,
                            shares: self.ledger.shares(),
                        });
                        debug!(signal = %bar.date, fill = %next.date, "sell scheduled");
                    }
                    _ => {}
                }
            }

            self.ledger.mark(bar.date, bar.close);
        }

        if let Some(last) = bars.last() {
            if self.ledger.close(last.date, last.close).is_some() {
                debug!(date = %last.date, price = last.close, "open position liquidated");
                let cash = self.ledger.cash;
                self.ledger.equity.finalize(cash);
            }
        }
    }

    fn immediate(&mut self) {
        let bars = self.bars;
        for (i, bar) in bars.iter().enumerate() {
            match (bar.next_open, bars.get(i + 1)) {
                (Some(price), Some(next)) => match (self.signals.at(i), self.ledger.is_flat()) {
                    (Crossover::Up, true) => {
                        if let Some(shares) = self.entry_shares(i, bar.date, price) {
                            self.ledger.open(next.date, price, shares);
                            debug!(signal = %bar.date, fill = %next.date, shares, "buy filled");
                        }
                    }
                    (Crossover::Down, false) => {
                        self.ledger.close(next.date, price);
                        debug!(signal = %bar.date, fill = %next.date, "sell filled");
                    }
                    _ => {}
                },
                _ => {
                    if self.ledger.close(bar.date, bar.close).is_some() {
                        debug!(date = %bar.date, price = bar.close, "open position liquidated");
                    }
                }
            }

            self.ledger.mark(bar.date, bar.close);
        }
    }

    /// Share count for a buy signalled at bar `index` filling at `price`, or
    /// `None` (recorded as skipped) when no position can be opened.
    fn entry_shares(&mut self, index: usize, date: NaiveDate, price: f64) -> Option<u64> {
        let reason = if index + 2 >= self.bars.len() {
            SkipReason::NoHoldingPeriod
        } else {
            let shares = size_order(self.ledger.cash, price, self.config.allocation);
            if shares > 0 {
                return Some(shares);
            }
            SkipReason::InsufficientFunds {
                cash: self.ledger.cash,
                price,
            }
        };
        warn!(%date, %reason, "buy signal skipped");
        self.skipped.push(SkippedSignal { date, reason });
        None
    }
}
