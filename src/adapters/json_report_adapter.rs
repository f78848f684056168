//! JSON report adapter implementing ReportPort.
//!
//! Writes one pretty-printed document per symbol: the backtest result
//! (summary, equity curve, trades, price history, skipped signals) with the
//! buy-and-hold benchmark alongside.

use std::fs;
use std::path::Path;

use crate::domain::error::HindsightError;
use crate::domain::report::SymbolReport;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(report: &SymbolReport) -> Result<String, HindsightError> {
        serde_json::to_string_pretty(report).map_err(|e| HindsightError::Report {
            reason: format!("failed to serialize report for {}: {}", report.symbol(), e),
        })
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &SymbolReport, output_path: &Path) -> Result<(), HindsightError> {
        let json = Self::render(report)?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json)?;
        Ok(())
    }
}
