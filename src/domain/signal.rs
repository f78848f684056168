//! Two-average crossover signals.

use crate::domain::indicator::calculate_sma;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    None,
    /// Fast average moved from at-or-below to above the slow average.
    Up,
    /// Fast average moved from at-or-above to below the slow average.
    Down,
}

/// Classify the move between two consecutive (fast, slow) observations.
pub fn classify(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Crossover {
    if fast > slow && prev_fast <= prev_slow {
        Crossover::Up
    } else if fast < slow && prev_fast >= prev_slow {
        Crossover::Down
    } else {
        Crossover::None
    }
}

/// Crossover state at every index. Index 0 compares against itself and so
/// never fires.
///
/// `fast` and `slow` must be the same length.
pub fn detect_crossovers(fast: &[f64], slow: &[f64]) -> Vec<Crossover> {
    debug_assert_eq!(fast.len(), slow.len());
    fast.iter()
        .zip(slow)
        .enumerate()
        .map(|(i, (&f, &s))| {
            let (pf, ps) = if i > 0 { (fast[i - 1], slow[i - 1]) } else { (f, s) };
            classify(pf, ps, f, s)
        })
        .collect()
}

/// Fast/slow SMA pair over one value series, with the crossovers between them.
#[derive(Debug, Clone)]
pub struct CrossoverSignals {
    pub fast: Vec<f64>,
    pub slow: Vec<f64>,
    pub crossovers: Vec<Crossover>,
}

impl CrossoverSignals {
    pub fn compute(values: &[f64], fast_period: usize, slow_period: usize) -> Self {
        let fast = calculate_sma(values, fast_period);
        let slow = calculate_sma(values, slow_period);
        let crossovers = detect_crossovers(&fast, &slow);
        Self {
            fast,
            slow,
            crossovers,
        }
    }

    pub fn at(&self, index: usize) -> Crossover {
        self.crossovers.get(index).copied().unwrap_or(Crossover::None)
    }
}
