//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{render_consensus_csv, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::domain::batch::{fetch_history, parse_symbols, run_batch, BatchOutcome, SymbolHistory};
use crate::domain::config_validation::{
    read_backtest_config, read_consensus_config, read_date_range, validate_backtest_config,
    validate_consensus_config,
};
use crate::domain::consensus::{ConsensusConfig, ConsensusVoter};
use crate::domain::error::TradesimError;
use crate::domain::indicator_adapter::IndicatorAdapter;
use crate::domain::report::run_consensus_report;
use crate::domain::strategy::registry::StrategyRegistry;
use crate::domain::strategy::{DslStrategy, StrategyEvaluator};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "tradesim",
    about = "Strategy backtester with a signal DSL and consensus voting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest strategies against one or more symbols
    Backtest {
        /// Built-in strategy names, comma separated
        #[arg(short, long, value_delimiter = ',')]
        strategy: Vec<String>,
        /// Strategy script to compile and run
        #[arg(long)]
        dsl: Option<PathBuf>,
        /// Comma-separated symbols (overrides [backtest] symbols)
        #[arg(long)]
        symbols: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory holding <SYMBOL>.csv files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        capital: Option<f64>,
        #[arg(long)]
        warmup: Option<usize>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Reject scripts that reference unsupported indicators
        #[arg(long)]
        strict: bool,
        /// JSON result file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// CSV report file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run the bulk consensus vote over one symbol and write the per-bar report
    Consensus {
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        capital: Option<f64>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// CSV report file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy script and/or a configuration file
    Validate {
        #[arg(long)]
        dsl: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        strict: bool,
    },
    /// List built-in strategies
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            strategy,
            dsl,
            symbols,
            config,
            data_dir,
            capital,
            warmup,
            start,
            end,
            strict,
            output,
            report,
        } => run_backtest(BacktestArgs {
            strategies: strategy,
            dsl,
            symbols,
            config,
            data_dir,
            capital,
            warmup,
            start,
            end,
            strict,
            output,
            report,
        }),
        Command::Consensus {
            symbol,
            config,
            data_dir,
            capital,
            start,
            end,
            output,
        } => run_consensus(ConsensusArgs {
            symbol,
            config,
            data_dir,
            capital,
            start,
            end,
            output,
        }),
        Command::Validate {
            dsl,
            config,
            strict,
        } => run_validate(dsl.as_ref(), config.as_ref(), strict),
        Command::Strategies => run_strategies(),
    }
}

/// Print an error the way every subcommand does and map it to an exit code.
/// Script errors get a gutter pointing at the offending line.
pub fn fail(err: &TradesimError) -> ExitCode {
    match err {
        TradesimError::InvalidStrategyDefinition(def) => {
            eprintln!("error: invalid strategy definition\n{}", def.display_with_context());
        }
        _ => eprintln!("error: {err}"),
    }
    err.into()
}

/// Load an INI file, or an empty configuration when no path is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// `[backtest]` settings with command-line overrides applied.
pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    capital: Option<f64>,
    warmup: Option<usize>,
) -> Result<BacktestConfig, TradesimError> {
    let mut config = read_backtest_config(adapter)?;
    if let Some(capital) = capital {
        if !(capital.is_finite() && capital > 0.0) {
            return Err(TradesimError::ConfigInvalid {
                section: "backtest".into(),
                key: "initial_capital".into(),
                reason: "initial_capital must be positive".into(),
            });
        }
        config.initial_capital = capital;
    }
    if let Some(warmup) = warmup {
        config.warmup = warmup;
    }
    Ok(config)
}

pub fn build_consensus_config(adapter: &dyn ConfigPort) -> Result<ConsensusConfig, TradesimError> {
    read_consensus_config(adapter)
}

/// `[backtest]` date bounds with command-line overrides applied.
pub fn build_date_range(
    adapter: &dyn ConfigPort,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), TradesimError> {
    let (config_start, config_end) = read_date_range(adapter)?;
    let start = start.or(config_start);
    let end = end.or(config_end);
    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            return Err(TradesimError::ConfigInvalid {
                section: "backtest".into(),
                key: "start_date".into(),
                reason: "start_date must be before end_date".into(),
            });
        }
    }
    Ok((start, end))
}

/// Command line first, then `[backtest] data_dir`, then the working directory.
pub fn resolve_data_dir(cli: Option<&PathBuf>, adapter: &dyn ConfigPort) -> PathBuf {
    cli.cloned()
        .or_else(|| adapter.get_string("backtest", "data_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Command line first, then `[backtest] symbols`.
pub fn resolve_symbols(
    cli: Option<&str>,
    adapter: &dyn ConfigPort,
) -> Result<Vec<String>, TradesimError> {
    let raw = match cli {
        Some(s) => s.to_string(),
        None => adapter
            .get_string("backtest", "symbols")
            .ok_or_else(|| TradesimError::ConfigMissing {
                section: "backtest".into(),
                key: "symbols".into(),
            })?,
    };
    parse_symbols(&raw)
}

/// Built-in strategies by name plus an optional compiled script.
pub fn resolve_strategies(
    registry: &StrategyRegistry,
    names: &[String],
    dsl: Option<&PathBuf>,
    strict: bool,
) -> Result<Vec<Arc<dyn StrategyEvaluator>>, TradesimError> {
    let mut strategies = Vec::with_capacity(names.len() + 1);
    for name in names {
        strategies.push(registry.get(name.trim())?);
    }
    if let Some(path) = dsl {
        eprintln!("Compiling strategy from {}", path.display());
        let script = fs::read_to_string(path)?;
        let compiled = DslStrategy::compile(&script, IndicatorAdapter::default(), strict)?;
        strategies.push(Arc::new(compiled));
    }
    if strategies.is_empty() {
        return Err(TradesimError::ConfigMissing {
            section: "backtest".into(),
            key: "strategy".into(),
        });
    }
    Ok(strategies)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, TradesimError> {
    serde_json::to_string_pretty(value).map_err(|e| TradesimError::Io(std::io::Error::other(e)))
}

/// `out.csv` becomes `out_AAPL_ema-crossover.csv`.
fn suffixed_path(path: &Path, symbol: &str, strategy: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{symbol}_{strategy}.{ext}"),
        None => format!("{stem}_{symbol}_{strategy}"),
    };
    path.with_file_name(name)
}

pub struct BacktestArgs {
    pub strategies: Vec<String>,
    pub dsl: Option<PathBuf>,
    pub symbols: Option<String>,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub capital: Option<f64>,
    pub warmup: Option<usize>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub strict: bool,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

pub fn run_backtest(args: BacktestArgs) -> ExitCode {
    // Stage 1: Load config
    let adapter = match load_config(args.config.as_ref()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Resolve run settings
    let bt_config = match build_backtest_config(&adapter, args.capital, args.warmup) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let consensus_config = match build_consensus_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let (start, end) = match build_date_range(&adapter, args.start, args.end) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let strict = args.strict || adapter.get_bool("dsl", "strict_indicators", false);

    // Stage 3: Resolve strategies
    let registry = StrategyRegistry::with_builtins(IndicatorAdapter::default(), consensus_config);
    let strategies =
        match resolve_strategies(&registry, &args.strategies, args.dsl.as_ref(), strict) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        };

    // Stage 4: Load price history
    let symbols = match resolve_symbols(args.symbols.as_deref(), &adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let data_dir = resolve_data_dir(args.data_dir.as_ref(), &adapter);
    eprintln!(
        "Loading {} symbols from {}",
        symbols.len(),
        data_dir.display()
    );
    let data_port = CsvAdapter::new(data_dir);
    let mut histories: Vec<SymbolHistory> = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        match fetch_history(&data_port, symbol, start, end) {
            Ok(h) => histories.push(h),
            Err(e) => return fail(&e),
        }
    }

    // Stage 5: Run every strategy against every symbol
    eprintln!(
        "Running backtest: {} strategies x {} symbols (warmup {}, capital {:.2})",
        strategies.len(),
        histories.len(),
        bt_config.warmup,
        bt_config.initial_capital,
    );
    let engine = BacktestEngine::new(bt_config);
    let outcomes = run_batch(&engine, &histories, &strategies);

    let mut first_error: Option<ExitCode> = None;
    let mut results: Vec<BacktestResult> = Vec::with_capacity(outcomes.len());
    for BatchOutcome {
        symbol,
        strategy,
        result,
    } in outcomes
    {
        match result {
            Ok(r) => results.push(r),
            Err(e) => {
                eprint!("{symbol} / {strategy}: ");
                let code = fail(&e);
                first_error.get_or_insert(code);
            }
        }
    }

    // Stage 6: Print console summary to stderr
    for r in &results {
        print_summary(r);
    }

    // Stage 7: Write outputs
    if let Err(e) = write_backtest_outputs(&results, args.output.as_ref(), args.report.as_ref()) {
        return fail(&e);
    }

    first_error.unwrap_or(ExitCode::SUCCESS)
}

fn print_summary(r: &BacktestResult) {
    eprintln!("\n=== {} on {} ===", r.strategy_name, r.symbol);
    eprintln!("Initial Capital:  {:.2}", r.initial_capital);
    eprintln!("Final Capital:    {:.2}", r.final_capital);
    eprintln!("Total Return:     {:.2}%", r.total_return_percent);
    eprintln!("Sharpe Ratio:     {:.2}", r.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.2}%", r.max_drawdown_percent);
    eprintln!("Total Trades:     {}", r.total_trades);
    eprintln!("Win Rate:         {:.1}%", r.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", r.profit_factor);
    if let Some(p) = &r.open_position {
        eprintln!(
            "Open Position:    {} @ {:.2} since {}",
            p.quantity, p.entry_price, p.entry_date
        );
    }
}

fn write_backtest_outputs(
    results: &[BacktestResult],
    output: Option<&PathBuf>,
    report: Option<&PathBuf>,
) -> Result<(), TradesimError> {
    let json = match results {
        [single] => to_json(single)?,
        _ => to_json(results)?,
    };
    match output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("\nResults written to: {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = report {
        for r in results {
            let target = if results.len() == 1 {
                path.clone()
            } else {
                suffixed_path(path, &r.symbol, &r.strategy_name)
            };
            CsvReportAdapter.write_backtest(r, &target)?;
            eprintln!("Report written to: {}", target.display());
        }
    }
    Ok(())
}

pub struct ConsensusArgs {
    pub symbol: String,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub capital: Option<f64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub output: Option<PathBuf>,
}

pub fn run_consensus(args: ConsensusArgs) -> ExitCode {
    // Stage 1: Load config
    let adapter = match load_config(args.config.as_ref()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Resolve run settings
    let bt_config = match build_backtest_config(&adapter, args.capital, None) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let consensus_config = match build_consensus_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let (start, end) = match build_date_range(&adapter, args.start, args.end) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let symbol = args.symbol.trim().to_uppercase();

    // Stage 3: Load price history
    let data_dir = resolve_data_dir(args.data_dir.as_ref(), &adapter);
    eprintln!("Loading {} from {}", symbol, data_dir.display());
    let history = match fetch_history(&CsvAdapter::new(data_dir), &symbol, start, end) {
        Ok(h) => h,
        Err(e) => return fail(&e),
    };

    // Stage 4: Vote and simulate
    eprintln!(
        "Running consensus: {} bars, {}/{} MA, {} RSI",
        history.candles.len(),
        consensus_config.fast_label(),
        consensus_config.slow_label(),
        consensus_config.rsi_label(),
    );
    let voter = ConsensusVoter::new(consensus_config, IndicatorAdapter::default());
    let engine = BacktestEngine::new(bt_config);
    let report = match run_consensus_report(&voter, &engine, &history.candles, &symbol) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 5: Print console summary to stderr
    print_summary(&report.result);
    eprintln!("CAGR:             {:.2}%", report.cagr_percent);

    // Stage 6: Write report
    match args.output {
        Some(path) => {
            if let Err(e) = CsvReportAdapter.write_consensus(&report, &path) {
                return fail(&e);
            }
            eprintln!("\nReport written to: {}", path.display());
        }
        None => match render_consensus_csv(&report) {
            Ok(csv) => print!("{csv}"),
            Err(e) => return fail(&e),
        },
    }

    ExitCode::SUCCESS
}

fn run_validate(dsl: Option<&PathBuf>, config: Option<&PathBuf>, strict: bool) -> ExitCode {
    if dsl.is_none() && config.is_none() {
        eprintln!("error: nothing to validate (pass --dsl and/or --config)");
        return ExitCode::from(2);
    }

    let adapter = match load_config(config) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if config.is_some() {
        if let Err(e) = validate_backtest_config(&adapter) {
            return fail(&e);
        }
        if let Err(e) = validate_consensus_config(&adapter) {
            return fail(&e);
        }
        eprintln!("Configuration is valid.");
    }

    if let Some(path) = dsl {
        eprintln!("Validating strategy: {}", path.display());
        let script = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => return fail(&TradesimError::from(e)),
        };
        let strict = strict || adapter.get_bool("dsl", "strict_indicators", false);
        let strategy = match DslStrategy::compile(&script, IndicatorAdapter::default(), strict) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        };

        let definition = strategy.definition();
        eprintln!("\nStrategy: {}", definition.name);
        eprintln!("\nEntry Conditions:");
        for condition in &definition.entry_conditions {
            eprintln!("  {condition}");
        }
        eprintln!("\nExit Conditions:");
        for condition in &definition.exit_conditions {
            eprintln!("  {condition}");
        }
        eprintln!(
            "\nWarm-up: {} bars before every indicator has a value",
            definition.warmup_bars()
        );
        let unsupported = definition.unsupported_indicators();
        if !unsupported.is_empty() {
            eprintln!("\nwarning: unsupported indicators: {}", unsupported.join(", "));
        }
        eprintln!("\nStrategy script is valid.");
    }

    ExitCode::SUCCESS
}

fn run_strategies() -> ExitCode {
    let registry =
        StrategyRegistry::with_builtins(IndicatorAdapter::default(), ConsensusConfig::default());
    for name in registry.names() {
        println!("{name}");
    }
    ExitCode::SUCCESS
}
