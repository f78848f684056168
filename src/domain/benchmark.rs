//! Buy-and-hold reference curve.
//!
//! Scales the close-price path by the strategy's initial equity so both
//! curves start from the same value.

use serde::Serialize;

use crate::domain::equity::EquityPoint;
use crate::domain::metrics::round_cents;
use crate::domain::price_bar::PriceBar;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub equity_curve: Vec<EquityPoint>,
    pub total_return_pct: f64,
}

/// equity[i] = initial_equity * close[i] / close[0]
pub fn buy_and_hold(bars: &[PriceBar], initial_equity: f64) -> Benchmark {
    let Some(base) = bars.first().map(|b| b.close).filter(|c| *c > 0.0) else {
        return Benchmark {
            equity_curve: Vec::new(),
            total_return_pct: 0.0,
        };
    };

    let equity_curve: Vec<EquityPoint> = bars
        .iter()
        .map(|bar| EquityPoint {
            date: bar.date,
            equity: round_cents(initial_equity * bar.close / base),
        })
        .collect();

    let last_close = bars.last().map_or(base, |b| b.close);
    Benchmark {
        equity_curve,
        total_return_pct: round_cents((last_close - base) / base * 100.0),
    }
}
