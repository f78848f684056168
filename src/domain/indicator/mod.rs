//! Technical indicators over price series.
//!
//! Only the simple moving average is needed by the crossover rule; it is
//! defined for every bar, shrinking the window for the earliest bars instead
//! of reporting a warmup period.

pub mod sma;

pub use sma::calculate_sma;
