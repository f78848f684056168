//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{
    self as backtest_engine, BacktestConfig, DEFAULT_ALLOCATION, DEFAULT_FAST_PERIOD,
    DEFAULT_INITIAL_CAPITAL, DEFAULT_SLOW_PERIOD,
};
use crate::domain::config_validation::{
    backtest_number, backtest_period, parse_date, validate_backtest_config,
};
use crate::domain::error::HindsightError;
use crate::domain::execution::ExecutionPolicy;
use crate::domain::metrics::PerformanceStats;
use crate::domain::report::SymbolReport;
use crate::domain::symbols::{parse_symbols, SymbolCatalog};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceHistoryPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "hindsight", about = "SMA crossover backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Symbol or comma-separated symbols, overriding the config
        #[arg(long)]
        symbol: Option<String>,
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// order_lag or immediate
        #[arg(long)]
        execution: Option<ExecutionPolicy>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List symbols with price data
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub symbols: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub output: Option<PathBuf>,
    pub execution: Option<ExecutionPolicy>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            start,
            end,
            output,
            execution,
            dry_run,
        } => {
            let overrides = Overrides {
                symbols: symbol,
                start,
                end,
                output,
                execution,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides)
            }
        }
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

fn fail(err: &HindsightError) -> ExitCode {
    error!("{err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(&HindsightError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// Load and validate, the common first stage of every subcommand.
fn load_validated(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!("loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_backtest_config(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

fn data_port_from_config(config: &dyn ConfigPort) -> Result<CsvAdapter, HindsightError> {
    let dir = config
        .get_string("data", "dir")
        .ok_or_else(|| HindsightError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir.trim())))
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, HindsightError> {
    let policy = match adapter.get_string("backtest", "execution") {
        Some(raw) => raw
            .parse::<ExecutionPolicy>()
            .map_err(|reason| HindsightError::ConfigInvalid {
                section: "backtest".into(),
                key: "execution".into(),
                reason,
            })?,
        None => ExecutionPolicy::default(),
    };

    Ok(BacktestConfig {
        initial_capital: backtest_number(adapter, "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
        fast_period: backtest_period(adapter, "fast_period", DEFAULT_FAST_PERIOD)?,
        slow_period: backtest_period(adapter, "slow_period", DEFAULT_SLOW_PERIOD)?,
        allocation: backtest_number(adapter, "allocation", DEFAULT_ALLOCATION)?,
        policy,
    })
}

/// Symbols from the override, then `symbols`/`symbol` in `[backtest]`, then
/// every symbol in the catalog.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
    catalog: &SymbolCatalog,
) -> Result<Vec<String>, HindsightError> {
    let (key, raw) = match symbol_override {
        Some(s) => ("symbol", Some(s.to_string())),
        None => match config.get_string("backtest", "symbols") {
            Some(s) => ("symbols", Some(s)),
            None => ("symbol", config.get_string("backtest", "symbol")),
        },
    };

    match raw {
        Some(raw) => parse_symbols(&raw).map_err(|e| HindsightError::ConfigInvalid {
            section: "backtest".into(),
            key: key.into(),
            reason: e.to_string(),
        }),
        None => Ok(catalog.entries().map(|(s, _)| s.to_string()).collect()),
    }
}

/// Inclusive date range; open ends cover all available data.
pub fn resolve_date_range(
    overrides: &Overrides,
    config: &dyn ConfigPort,
) -> Result<(NaiveDate, NaiveDate), HindsightError> {
    let start = match overrides.start {
        Some(d) => Some(d),
        None => parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?,
    };
    let end = match overrides.end {
        Some(d) => Some(d),
        None => parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?,
    };
    let start = start.unwrap_or(NaiveDate::MIN);
    let end = end.unwrap_or(NaiveDate::MAX);
    if start > end {
        return Err(HindsightError::validation(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok((start, end))
}

/// Report writer and default output path for `[report] format`.
pub fn report_port_for(config: &dyn ConfigPort) -> (Box<dyn ReportPort>, PathBuf) {
    let format = config
        .get_string("report", "format")
        .map(|f| f.trim().to_lowercase())
        .unwrap_or_else(|| "json".to_string());
    match format.as_str() {
        "csv" => (Box::new(CsvReportAdapter::new()), PathBuf::from("report.csv")),
        _ => (Box::new(JsonReportAdapter::new()), PathBuf::from("report.json")),
    }
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Some(policy) = overrides.execution {
        bt_config.policy = policy;
    }

    let catalog = SymbolCatalog::from_config(&adapter);
    let symbols = match resolve_symbols(overrides.symbols.as_deref(), &adapter, &catalog) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let range = match resolve_date_range(overrides, &adapter) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let data_port = match data_port_from_config(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let (report_port, default_output) = report_port_for(&adapter);
    let output = overrides.output.clone().unwrap_or(default_output);

    run_backtest_pipeline(
        &data_port,
        &catalog,
        &bt_config,
        &symbols,
        range,
        report_port.as_ref(),
        &output,
    )
}

/// Fetch one symbol's history and run it through the engine.
pub fn backtest_symbol(
    data_port: &dyn PriceHistoryPort,
    catalog: &SymbolCatalog,
    bt_config: &BacktestConfig,
    symbol: &str,
    (start, end): (NaiveDate, NaiveDate),
) -> Result<SymbolReport, HindsightError> {
    let bars = data_port.fetch_history(symbol, start, end)?;
    if bars.is_empty() {
        return Err(HindsightError::NoData {
            symbol: symbol.to_string(),
        });
    }
    let name = catalog.display_name(symbol);
    let result = backtest_engine::run_backtest(symbol, &name, &bars, bt_config)?;
    Ok(SymbolReport::new(result))
}

pub fn run_backtest_pipeline(
    data_port: &(dyn PriceHistoryPort + Sync),
    catalog: &SymbolCatalog,
    bt_config: &BacktestConfig,
    symbols: &[String],
    range: (NaiveDate, NaiveDate),
    report_port: &dyn ReportPort,
    output_path: &Path,
) -> ExitCode {
    if symbols.is_empty() {
        return fail(&HindsightError::validation("no symbols to backtest"));
    }

    info!(
        symbols = symbols.len(),
        policy = %bt_config.policy,
        fast = bt_config.fast_period,
        slow = bt_config.slow_period,
        "running backtest"
    );

    let outcomes: Vec<(&String, Result<SymbolReport, HindsightError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let outcome = backtest_symbol(data_port, catalog, bt_config, symbol, range);
            (symbol, outcome)
        })
        .collect();

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!("skipping {} ({})", symbol, e);
                first_error.get_or_insert(e);
            }
        }
    }

    if reports.is_empty() {
        return match first_error {
            Some(e) => fail(&e),
            None => fail(&HindsightError::validation("no symbols to backtest")),
        };
    }

    for report in &reports {
        print_summary(report);
    }

    match report_port.write_multi(&reports, output_path) {
        Ok(paths) => {
            for path in paths {
                eprintln!("\nReport written to: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_summary(report: &SymbolReport) {
    let result = &report.result;
    let summary = &result.summary;
    let stats = PerformanceStats::compute(&result.equity_curve, &result.trades);
    let (first, last) = match (result.equity_curve.first(), result.equity_curve.last()) {
        (Some(f), Some(l)) => (f.date, l.date),
        _ => return,
    };

    eprintln!("\n=== {} ({}) ===", result.symbol, result.name);
    eprintln!("Period:           {} to {} ({} bars)", first, last, result.equity_curve.len());
    eprintln!("Initial Equity:   {:.2}", summary.initial_equity);
    eprintln!("Final Equity:     {:.2}", summary.final_equity);
    eprintln!("Total Return:     {:.2}%", summary.total_return_pct);
    eprintln!("Buy & Hold:       {:.2}%", report.benchmark.total_return_pct);
    eprintln!("Excess Return:    {:.2}%", report.excess_return_pct());
    eprintln!("Max Drawdown:     -{:.1}%", stats.max_drawdown * 100.0);
    eprintln!("Drawdown Length:  {} bars", stats.max_drawdown_duration);
    eprintln!("Total Trades:     {}", summary.trade_count);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate_pct);
    eprintln!("Profit Factor:    {:.2}", stats.profit_factor);
    if summary.trade_count > 0 {
        eprintln!(
            "  won {} / lost {} / even {}, avg win {:.2}, avg loss {:.2}, avg hold {:.1} days",
            stats.trades_won,
            stats.trades_lost,
            stats.trades_breakeven,
            stats.avg_win,
            stats.avg_loss,
            stats.avg_holding_days,
        );
    }
    if !result.skipped_signals.is_empty() {
        eprintln!("Skipped Signals:  {}", result.skipped_signals.len());
        for skipped in &result.skipped_signals {
            eprintln!("  {}: {}", skipped.date, skipped.reason);
        }
    }
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Some(policy) = overrides.execution {
        bt_config.policy = policy;
    }
    let catalog = SymbolCatalog::from_config(&adapter);
    let symbols = match resolve_symbols(overrides.symbols.as_deref(), &adapter, &catalog) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let (start, end) = match resolve_date_range(overrides, &adapter) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    eprintln!("\nBacktest:");
    eprintln!("  initial capital: {:.2}", bt_config.initial_capital);
    eprintln!(
        "  SMA periods:     {} / {}",
        bt_config.fast_period, bt_config.slow_period
    );
    eprintln!("  allocation:      {}", bt_config.allocation);
    eprintln!("  execution:       {}", bt_config.policy);
    let bound = |d: NaiveDate, open: NaiveDate| {
        if d == open {
            "(all data)".to_string()
        } else {
            d.to_string()
        }
    };
    eprintln!(
        "  range:           {} to {}",
        bound(start, NaiveDate::MIN),
        bound(end, NaiveDate::MAX)
    );

    eprintln!("\nSymbols:");
    for symbol in &symbols {
        eprintln!("  {}  {}", symbol, catalog.display_name(symbol));
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = match data_port_from_config(&config) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let catalog = SymbolCatalog::from_config(&config);
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}\t{}", symbol, catalog.display_name(symbol));
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = build_backtest_config(&adapter).and_then(|c| c.validate()) {
        return fail(&e);
    }
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = match data_port_from_config(&config) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let catalog = SymbolCatalog::from_config(&config);
    let symbols = match resolve_symbols(symbol, &config, &catalog) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    for s in &symbols {
        match adapter.get_data_range(s) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", s, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", s);
            }
            Err(e) => {
                error!("error querying {}: {}", s, e);
            }
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn build_backtest_config_defaults() {
        let c = build_backtest_config(&config("[data]\ndir = .\n")).unwrap();
        assert_eq!(c, BacktestConfig::default());
    }

    #[test]
    fn build_backtest_config_reads_values() {
        let c = build_backtest_config(&config(
            "[backtest]\ninitial_capital = 5000\nfast_period = 3\nslow_period = 8\nallocation = 0.5\nexecution = immediate\n",
        ))
        .unwrap();
        assert_eq!(c.initial_capital, 5000.0);
        assert_eq!(c.fast_period, 3);
        assert_eq!(c.slow_period, 8);
        assert_eq!(c.allocation, 0.5);
        assert_eq!(c.policy, ExecutionPolicy::Immediate);
    }

    #[test]
    fn build_backtest_config_rejects_negative_period() {
        let err = build_backtest_config(&config("[backtest]\nfast_period = -2\n")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn build_backtest_config_rejects_float_spelled_period() {
        let cfg = config("[data]\ndir = /tmp\n[backtest]\nfast_period = 8.0\nslow_period = 30.0\n");
        assert!(validate_backtest_config(&cfg).is_err());
        let err = build_backtest_config(&cfg).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn build_backtest_config_agrees_with_validation() {
        let cfg = config("[data]\ndir = /tmp\n[backtest]\nfast_period = 8\nslow_period = 30\ninitial_capital = 2500.5\n");
        validate_backtest_config(&cfg).unwrap();
        let c = build_backtest_config(&cfg).unwrap();
        assert_eq!((c.fast_period, c.slow_period), (8, 30));
        assert_eq!(c.initial_capital, 2500.5);
    }

    #[test]
    fn build_backtest_config_rejects_non_numeric_capital() {
        let err = build_backtest_config(&config("[backtest]\ninitial_capital = lots\n")).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn resolve_symbols_prefers_override() {
        let cfg = config("[backtest]\nsymbols = NHY,EQNR\n");
        let symbols = resolve_symbols(Some("aker"), &cfg, &SymbolCatalog::default()).unwrap();
        assert_eq!(symbols, vec!["AKER"]);
    }

    #[test]
    fn resolve_symbols_from_config_list() {
        let cfg = config("[backtest]\nsymbols = nhy, eqnr\n");
        let symbols = resolve_symbols(None, &cfg, &SymbolCatalog::default()).unwrap();
        assert_eq!(symbols, vec!["NHY", "EQNR"]);
    }

    #[test]
    fn resolve_symbols_single_key() {
        let cfg = config("[backtest]\nsymbol = eqnr\n");
        let symbols = resolve_symbols(None, &cfg, &SymbolCatalog::default()).unwrap();
        assert_eq!(symbols, vec!["EQNR"]);
    }

    #[test]
    fn resolve_symbols_falls_back_to_catalog() {
        let cfg = config("[data]\ndir = .\n");
        let symbols = resolve_symbols(None, &cfg, &SymbolCatalog::default()).unwrap();
        assert_eq!(symbols, vec!["AKER", "EQNR", "NHY"]);
    }

    #[test]
    fn resolve_symbols_rejects_duplicates() {
        let cfg = config("[data]\ndir = .\n");
        let err = resolve_symbols(Some("NHY,nhy"), &cfg, &SymbolCatalog::default()).unwrap_err();
        assert!(matches!(err, HindsightError::ConfigInvalid { .. }));
    }

    #[test]
    fn resolve_date_range_open_ended() {
        let cfg = config("[data]\ndir = .\n");
        let (start, end) = resolve_date_range(&Overrides::default(), &cfg).unwrap();
        assert_eq!(start, NaiveDate::MIN);
        assert_eq!(end, NaiveDate::MAX);
    }

    #[test]
    fn resolve_date_range_override_wins() {
        let cfg = config("[backtest]\nstart_date = 2020-01-01\nend_date = 2020-12-31\n");
        let overrides = Overrides {
            end: NaiveDate::from_ymd_opt(2020, 6, 30),
            ..Overrides::default()
        };
        let (start, end) = resolve_date_range(&overrides, &cfg).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2020, 6, 30).unwrap());
    }

    #[test]
    fn resolve_date_range_rejects_inverted_override() {
        let cfg = config("[backtest]\nend_date = 2020-01-01\n");
        let overrides = Overrides {
            start: NaiveDate::from_ymd_opt(2021, 1, 1),
            ..Overrides::default()
        };
        assert!(resolve_date_range(&overrides, &cfg).is_err());
    }

    #[test]
    fn report_port_for_format() {
        let (_, path) = report_port_for(&config("[report]\nformat = CSV\n"));
        assert_eq!(path, PathBuf::from("report.csv"));
        let (_, path) = report_port_for(&config("[data]\ndir = .\n"));
        assert_eq!(path, PathBuf::from("report.json"));
    }

    #[test]
    fn cli_parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "hindsight",
            "backtest",
            "-c",
            "cfg.ini",
            "--symbol",
            "NHY",
            "--start",
            "2024-01-02",
            "--execution",
            "immediate",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                symbol,
                start,
                execution,
                dry_run,
                ..
            } => {
                assert_eq!(symbol.as_deref(), Some("NHY"));
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 2));
                assert_eq!(execution, Some(ExecutionPolicy::Immediate));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_bad_execution() {
        assert!(
            Cli::try_parse_from(["hindsight", "backtest", "-c", "x.ini", "--execution", "twap"])
                .is_err()
        );
    }
}
