#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use hindsight::domain::backtest::BacktestConfig;
use hindsight::domain::error::HindsightError;
pub use hindsight::domain::price_bar::PriceBar;
use hindsight::ports::data_port::PriceHistoryPort;
use std::collections::HashMap;

pub struct MockPriceHistoryPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceHistoryPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceHistoryPort for MockPriceHistoryPort {
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, HindsightError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(HindsightError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, HindsightError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, HindsightError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(HindsightError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar with every price equal to `close`.
pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        adj_close: close,
        volume: 1000,
        next_open: None,
    }
}

/// Consecutive daily bars with flat OHLC at each close.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 1000,
            next_open: None,
        })
        .collect()
}

/// Deterministic zig-zag series, always positive.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let swing = ((i % 20) as f64 - 10.0).abs();
            start_price + swing * 0.5 + (i / 20) as f64
        })
        .collect();
    bars_from_closes(start_date, &closes)
}

/// 13 flat bars followed by a rally, the canonical breakout fixture.
pub fn breakout_closes() -> Vec<f64> {
    let mut closes = vec![10.0; 13];
    closes.extend([11.0, 12.0, 15.0, 20.0, 25.0, 30.0, 40.0]);
    closes
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig::default()
}
