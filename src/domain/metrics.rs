//! Summary statistics and performance metrics.

use serde::Serialize;

use crate::domain::equity::EquityPoint;
use crate::domain::position::Trade;

/// Round to 2 decimal places, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from != 0.0 {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

/// Headline figures shown in the summary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestSummary {
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub trade_count: usize,
    pub win_rate_pct: f64,
}

impl BacktestSummary {
    /// Derive the summary from a finished equity curve and trade log.
    ///
    /// `initial_capital` stands in for both ends of an empty curve.
    pub fn compute(equity_curve: &[EquityPoint], trades: &[Trade], initial_capital: f64) -> Self {
        let initial_equity = equity_curve
            .first()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_equity);

        let wins = trades.iter().filter(|t| t.is_win()).count();
        let win_rate_pct = if trades.is_empty() {
            0.0
        } else {
            round_cents(wins as f64 / trades.len() as f64 * 100.0)
        };

        BacktestSummary {
            initial_equity: round_cents(initial_equity),
            final_equity: round_cents(final_equity),
            total_return_pct: round_cents(percent_change(initial_equity, final_equity)),
            trade_count: trades.len(),
            win_rate_pct,
        }
    }
}

/// Extended statistics for the console summary.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_holding_days: f64,
}

impl PerformanceStats {
    pub fn compute(equity_curve: &[EquityPoint], trades: &[Trade]) -> Self {
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_days = 0i64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_days += trade.holding_days();
        }

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };
        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };
        let avg_holding_days = if trades.is_empty() {
            0.0
        } else {
            total_days as f64 / trades.len() as f64
        };

        PerformanceStats {
            max_drawdown,
            max_drawdown_duration,
            trades_won,
            trades_lost,
            trades_breakeven,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_holding_days,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut current_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}
