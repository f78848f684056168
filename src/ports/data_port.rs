//! Price history access port trait.

use crate::domain::error::HindsightError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

pub trait PriceHistoryPort {
    /// Bars for `symbol` dated within `[start_date, end_date]`, ascending.
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, HindsightError>;

    fn list_symbols(&self) -> Result<Vec<String>, HindsightError>;

    /// First date, last date and bar count, or `None` when no data exists.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, HindsightError>;
}
