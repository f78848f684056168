//! CSV file price history adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row.
//! Column order is free; headers are resolved by [`normalize_record`].

use crate::domain::error::HindsightError;
use crate::domain::price_bar::{PriceBar, normalize_record};
use crate::ports::data_port::PriceHistoryPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", symbol.trim().to_uppercase()))
    }

    /// Every bar in the symbol's file, ascending by date.
    fn read_all(&self, symbol: &str) -> Result<Vec<PriceBar>, HindsightError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => HindsightError::NoData {
                symbol: symbol.to_uppercase(),
            },
            _ => HindsightError::DataSource {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| HindsightError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let mut bars = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| HindsightError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let bar = normalize_record(headers.iter().zip(record.iter())).map_err(|e| {
                HindsightError::DataSource {
                    // +2: one-based, after the header row
                    reason: format!("{} row {}: {}", path.display(), line + 2, e),
                }
            })?;
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl PriceHistoryPort for CsvAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, HindsightError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, HindsightError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| HindsightError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HindsightError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().to_uppercase());
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, HindsightError> {
        let bars = match self.read_all(symbol) {
            Ok(bars) => bars,
            Err(HindsightError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
