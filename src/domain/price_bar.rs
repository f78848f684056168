//! Price bar representation and boundary normalization.
//!
//! Raw provider rows arrive as named fields whose spelling varies between
//! sources (`Adj Close`, `adj_close`, `AdjClose`, ...). [`normalize_record`]
//! maps one such row into a strict [`PriceBar`], and [`PriceHistory::new`]
//! validates a whole series before the engine ever sees it.

use crate::domain::error::HindsightError;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
    /// Open of the following bar; `None` only for the final bar of a history.
    pub next_open: Option<f64>,
}

impl PriceBar {
    fn prices(&self) -> [(&'static str, f64); 5] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adj_close", self.adj_close),
        ]
    }
}

/// Canonical input columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    Date,
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl FieldName {
    const COUNT: usize = 7;

    /// Resolve a header spelling, ignoring case, spaces, `_` and `-`.
    pub fn from_header(header: &str) -> Option<FieldName> {
        let key: String = header
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "date" | "datetime" | "timestamp" => Some(FieldName::Date),
            "open" => Some(FieldName::Open),
            "high" => Some(FieldName::High),
            "low" => Some(FieldName::Low),
            "close" => Some(FieldName::Close),
            "adjclose" | "adjustedclose" => Some(FieldName::AdjClose),
            "volume" | "vol" => Some(FieldName::Volume),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            FieldName::Date => "date",
            FieldName::Open => "open",
            FieldName::High => "high",
            FieldName::Low => "low",
            FieldName::Close => "close",
            FieldName::AdjClose => "adj_close",
            FieldName::Volume => "volume",
        }
    }
}

/// Map one named-field row into a [`PriceBar`].
///
/// Unknown fields are ignored. Every price field and the date are required;
/// volume defaults to 0 when absent or blank. `next_open` is left unset and
/// filled in by [`PriceHistory::new`].
pub fn normalize_record<'a, I>(fields: I) -> Result<PriceBar, HindsightError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut slots: [Option<&str>; FieldName::COUNT] = [None; FieldName::COUNT];
    for (header, value) in fields {
        if let Some(field) = FieldName::from_header(header) {
            let value = value.trim();
            if !value.is_empty() {
                slots[field.index()] = Some(value);
            }
        }
    }

    let require = |field: FieldName| {
        slots[field.index()].ok_or_else(|| {
            HindsightError::validation(format!("missing {} field", field.label()))
        })
    };
    let price = |field: FieldName| -> Result<f64, HindsightError> {
        let raw = require(field)?;
        raw.parse::<f64>().map_err(|_| {
            HindsightError::validation(format!("invalid {} value '{}'", field.label(), raw))
        })
    };

    let date = parse_date(require(FieldName::Date)?)?;
    let volume = match slots[FieldName::Volume.index()] {
        Some(raw) => parse_volume(raw)?,
        None => 0,
    };

    Ok(PriceBar {
        date,
        open: price(FieldName::Open)?,
        high: price(FieldName::High)?,
        low: price(FieldName::Low)?,
        close: price(FieldName::Close)?,
        adj_close: price(FieldName::AdjClose)?,
        volume,
        next_open: None,
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, HindsightError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    // Timestamps such as 2024-01-02T00:00:00 or 2024-01-02 00:00:00+00:00.
    raw.get(..10)
        .filter(|_| matches!(raw.as_bytes().get(10), Some(b'T' | b' ')))
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .ok_or_else(|| HindsightError::validation(format!("invalid date value '{}'", raw)))
}

fn parse_volume(raw: &str) -> Result<u64, HindsightError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| HindsightError::validation(format!("invalid volume value '{}'", raw)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(HindsightError::validation(format!(
            "invalid volume value '{}'",
            raw
        )));
    }
    Ok(value.round() as u64)
}

/// A validated, date-ascending price series for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    bars: Vec<PriceBar>,
}

impl PriceHistory {
    /// Validate `bars` and link each bar's `next_open` to its successor.
    ///
    /// Rejects an empty series, non-ascending or duplicate dates, and any
    /// price that is non-finite or not strictly positive. A supplied
    /// `next_open` is overwritten.
    pub fn new(mut bars: Vec<PriceBar>) -> Result<Self, HindsightError> {
        if bars.is_empty() {
            return Err(HindsightError::validation("price series is empty"));
        }

        for bar in &bars {
            for (field, value) in bar.prices() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(HindsightError::validation(format!(
                        "{} on {} must be a positive finite price, got {}",
                        field, bar.date, value
                    )));
                }
            }
        }

        for pair in bars.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.date == prev.date {
                return Err(HindsightError::validation(format!(
                    "duplicate bar date {}",
                    curr.date
                )));
            }
            if curr.date < prev.date {
                return Err(HindsightError::validation(format!(
                    "bar dates not ascending: {} follows {}",
                    curr.date, prev.date
                )));
            }
        }

        let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.next_open = opens.get(i + 1).copied();
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; a `PriceHistory` cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn adj_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.adj_close).collect()
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }
}
