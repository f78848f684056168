//! Configuration validation.
//!
//! Validates all config fields before any price data is read.

use crate::domain::backtest::{
    DEFAULT_ALLOCATION, DEFAULT_FAST_PERIOD, DEFAULT_INITIAL_CAPITAL, DEFAULT_SLOW_PERIOD,
};
use crate::domain::error::HindsightError;
use crate::domain::execution::ExecutionPolicy;
use crate::domain::symbols::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const REPORT_FORMATS: [&str; 2] = ["json", "csv"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    validate_data_dir(config)?;
    validate_initial_capital(config)?;
    validate_allocation(config)?;
    validate_periods(config)?;
    validate_execution(config)?;
    validate_dates(config)?;
    validate_symbols(config)?;
    validate_report_format(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> HindsightError {
    HindsightError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// A present `[backtest]` value must parse as a number; absent keys take `default`.
pub fn backtest_number(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<f64, HindsightError> {
    match config.get_string("backtest", key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("backtest", key, format!("'{}' is not a number", raw))),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(HindsightError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    let value = backtest_number(config, "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_allocation(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    let value = backtest_number(config, "allocation", DEFAULT_ALLOCATION)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "backtest",
            "allocation",
            "allocation must be greater than 0 and at most 1",
        ));
    }
    Ok(())
}

/// A present `[backtest]` period must be a plain integer of at least 1;
/// `30.0` is rejected.
pub fn backtest_period(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, HindsightError> {
    match config.get_string("backtest", key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value >= 1 => Ok(value),
            _ => Err(invalid(
                "backtest",
                key,
                format!("{} must be a whole number of at least 1", key),
            )),
        },
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    let fast = backtest_period(config, "fast_period", DEFAULT_FAST_PERIOD)?;
    let slow = backtest_period(config, "slow_period", DEFAULT_SLOW_PERIOD)?;
    if fast >= slow {
        return Err(invalid(
            "backtest",
            "fast_period",
            "fast_period must be shorter than slow_period",
        ));
    }
    Ok(())
}

fn validate_execution(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    if let Some(raw) = config.get_string("backtest", "execution") {
        raw.parse::<ExecutionPolicy>()
            .map_err(|reason| invalid("backtest", "execution", reason))?;
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Optional `YYYY-MM-DD` date from the `[backtest]` section.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, HindsightError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "backtest",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    for key in ["symbols", "symbol"] {
        if let Some(raw) = config.get_string("backtest", key) {
            parse_symbols(&raw).map_err(|e| invalid("backtest", key, e.to_string()))?;
        }
    }
    Ok(())
}

fn validate_report_format(config: &dyn ConfigPort) -> Result<(), HindsightError> {
    if let Some(format) = config.get_string("report", "format") {
        let format = format.trim().to_lowercase();
        if !REPORT_FORMATS.contains(&format.as_str()) {
            return Err(invalid(
                "report",
                "format",
                format!("unknown report format '{}' (expected json or csv)", format),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATA: &str = "[data]\ndir = ./data\n";

    fn with_backtest(lines: &str) -> FileConfigAdapter {
        make_config(&format!("{DATA}[backtest]\n{lines}\n"))
    }

    #[test]
    fn valid_full_config_passes() {
        let config = make_config(
            r#"
[data]
dir = ./data

[backtest]
initial_capital = 100000.0
fast_period = 5
slow_period = 15
allocation = 0.95
execution = order_lag
start_date = 2020-01-01
end_date = 2024-12-31
symbols = NHY,EQNR

[symbols]
NHY = Norsk Hydro

[report]
format = csv
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn defaults_only_passes() {
        assert!(validate_backtest_config(&make_config(DATA)).is_ok());
    }

    #[test]
    fn missing_data_dir_fails() {
        let config = make_config("[backtest]\ninitial_capital = 100\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let err = validate_backtest_config(&with_backtest("initial_capital = -100")).unwrap_err();
        assert!(
            matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn initial_capital_non_numeric_fails() {
        let err = validate_backtest_config(&with_backtest("initial_capital = lots")).unwrap_err();
        assert!(
            matches!(err, HindsightError::ConfigInvalid { key, reason, .. } if key == "initial_capital" && reason.contains("not a number"))
        );
    }

    #[test]
    fn allocation_out_of_range_fails() {
        for value in ["0", "1.2", "-0.5"] {
            let err = validate_backtest_config(&with_backtest(&format!("allocation = {value}")))
                .unwrap_err();
            assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "allocation"));
        }
    }

    #[test]
    fn allocation_of_one_passes() {
        assert!(validate_backtest_config(&with_backtest("allocation = 1")).is_ok());
    }

    #[test]
    fn fractional_period_fails() {
        let err = validate_backtest_config(&with_backtest("fast_period = 2.5")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn float_spelled_period_fails() {
        let err = validate_backtest_config(&with_backtest("fast_period = 8.0\nslow_period = 30"))
            .unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn negative_period_fails() {
        let err = validate_backtest_config(&with_backtest("slow_period = -15")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "slow_period"));
    }

    #[test]
    fn zero_period_fails() {
        let err = validate_backtest_config(&with_backtest("slow_period = 0")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "slow_period"));
    }

    #[test]
    fn fast_not_shorter_than_slow_fails() {
        let err = validate_backtest_config(&with_backtest("fast_period = 20\nslow_period = 10"))
            .unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn unknown_execution_fails() {
        let err = validate_backtest_config(&with_backtest("execution = market")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "execution"));
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let err = validate_backtest_config(&with_backtest("start_date = 2020/01/01")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let err = validate_backtest_config(&with_backtest(
            "start_date = 2024-12-31\nend_date = 2020-01-01",
        ))
        .unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn single_day_range_passes() {
        assert!(
            validate_backtest_config(&with_backtest(
                "start_date = 2024-01-02\nend_date = 2024-01-02"
            ))
            .is_ok()
        );
    }

    #[test]
    fn duplicate_symbols_fail() {
        let err = validate_backtest_config(&with_backtest("symbols = NHY,nhy")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "symbols"));
    }

    #[test]
    fn unknown_report_format_fails() {
        let config = make_config(&format!("{DATA}[report]\nformat = pdf\n"));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "format"));
    }

    #[test]
    fn parse_date_optional() {
        assert_eq!(parse_date(None, "start_date").unwrap(), None);
        assert_eq!(parse_date(Some("  "), "start_date").unwrap(), None);
        assert_eq!(
            parse_date(Some("2024-02-29"), "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }
}
