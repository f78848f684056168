//! CSV report adapter implementing ReportPort.
//!
//! `report.csv` expands to two files next to it:
//! `report_trades.csv` (one row per closed trade) and `report_equity.csv`
//! (strategy and buy-and-hold equity per bar).

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::HindsightError;
use crate::domain::report::SymbolReport;
use crate::ports::report_port::ReportPort;

const TRADE_HEADERS: [&str; 7] = [
    "entry_date",
    "exit_date",
    "entry_price",
    "exit_price",
    "shares",
    "pnl",
    "return_pct",
];

const EQUITY_HEADERS: [&str; 3] = ["date", "equity", "benchmark"];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// `(trades_path, equity_path)` derived from `output_path`.
    pub fn table_paths(output_path: &Path) -> (PathBuf, PathBuf) {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        (
            output_path.with_file_name(format!("{}_trades.csv", stem)),
            output_path.with_file_name(format!("{}_equity.csv", stem)),
        )
    }

    fn write_trades(report: &SymbolReport, path: &Path) -> Result<(), HindsightError> {
        let mut wtr = csv::Writer::from_path(path).map_err(report_error)?;
        wtr.write_record(TRADE_HEADERS).map_err(report_error)?;
        for trade in &report.result.trades {
            wtr.write_record([
                trade.entry_date.to_string(),
                trade.exit_date.to_string(),
                format!("{:.2}", trade.entry_price),
                format!("{:.2}", trade.exit_price),
                trade.shares.to_string(),
                format!("{:.2}", trade.pnl),
                format!("{:.2}", trade.return_pct),
            ])
            .map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_equity(report: &SymbolReport, path: &Path) -> Result<(), HindsightError> {
        let mut wtr = csv::Writer::from_path(path).map_err(report_error)?;
        wtr.write_record(EQUITY_HEADERS).map_err(report_error)?;
        let benchmark = &report.benchmark.equity_curve;
        for (i, point) in report.result.equity_curve.iter().enumerate() {
            let bench = benchmark
                .get(i)
                .map(|b| format!("{:.2}", b.equity))
                .unwrap_or_default();
            wtr.write_record([point.date.to_string(), format!("{:.2}", point.equity), bench])
                .map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn report_error(e: csv::Error) -> HindsightError {
    HindsightError::Report {
        reason: format!("CSV write error: {}", e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &SymbolReport, output_path: &Path) -> Result<(), HindsightError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let (trades_path, equity_path) = Self::table_paths(output_path);
        Self::write_trades(report, &trades_path)?;
        Self::write_equity(report, &equity_path)?;
        Ok(())
    }
}
