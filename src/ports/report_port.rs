//! Report generation port trait.

use std::path::{Path, PathBuf};

use crate::domain::error::HindsightError;
use crate::domain::report::SymbolReport;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &SymbolReport, output_path: &Path) -> Result<(), HindsightError>;

    /// Default implementation: one file per symbol, named `<stem>_<SYMBOL>.<ext>`
    /// next to `output_path`. A single report is written to `output_path` as is.
    fn write_multi(
        &self,
        reports: &[SymbolReport],
        output_path: &Path,
    ) -> Result<Vec<PathBuf>, HindsightError> {
        if let [report] = reports {
            self.write(report, output_path)?;
            return Ok(vec![output_path.to_path_buf()]);
        }
        let mut written = Vec::with_capacity(reports.len());
        for report in reports {
            let path = per_symbol_path(output_path, report.symbol());
            self.write(report, &path)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// `out/report.json` + `NHY` -> `out/report_NHY.json`
pub fn per_symbol_path(output_path: &Path, symbol: &str) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let file_name = match output_path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, symbol, ext.to_string_lossy()),
        None => format!("{}_{}", stem, symbol),
    };
    output_path.with_file_name(file_name)
}
