//! Core domain types and logic.

pub mod price_bar;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod equity;
pub mod execution;
pub mod backtest;
pub mod benchmark;
pub mod metrics;
pub mod report;
pub mod symbols;
pub mod config_validation;
pub mod error;
