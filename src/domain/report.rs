//! A strategy result paired with its buy-and-hold benchmark.

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::benchmark::{buy_and_hold, Benchmark};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReport {
    #[serde(flatten)]
    pub result: BacktestResult,
    pub benchmark: Benchmark,
}

impl SymbolReport {
    /// Benchmark starts from the strategy's initial equity.
    pub fn new(result: BacktestResult) -> Self {
        let benchmark = buy_and_hold(&result.price_history, result.summary.initial_equity);
        Self { result, benchmark }
    }

    pub fn symbol(&self) -> &str {
        &self.result.symbol
    }

    /// Strategy return minus buy-and-hold return, in percentage points.
    pub fn excess_return_pct(&self) -> f64 {
        super::metrics::round_cents(
            self.result.summary.total_return_pct - self.benchmark.total_return_pct,
        )
    }
}
