//! CLI definition and dispatch.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::ast::Strategy;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::bar::PriceSeries;
use crate::domain::compiler::{self, CompiledStrategy};
use crate::domain::config_validation::{parse_date, validate_run_config};
use crate::domain::error::StratlangError;
use crate::domain::parser;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "stratlang", about = "Strategy DSL backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Strategy file (overrides the config value)
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        /// OHLCV CSV file (overrides the config value)
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        capital: Option<f64>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Write the trade list as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse and compile a strategy file without running it
    Check {
        strategy: PathBuf,
    },
    /// Print per-bar entry/exit signals as CSV
    Signals {
        #[arg(short, long)]
        strategy: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            strategy,
            data,
            capital,
            start,
            end,
            output,
        } => run_backtest_command(RunArgs {
            config,
            strategy,
            data,
            capital,
            start,
            end,
            output,
        }),
        Command::Check { strategy } => run_check(&strategy),
        Command::Signals {
            strategy,
            data,
            start,
            end,
        } => run_signals(&strategy, &data, start, end),
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    strategy: Option<PathBuf>,
    data: Option<PathBuf>,
    capital: Option<f64>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<PathBuf>,
}

/// Resolved run settings after merging flags over the config file.
#[derive(Debug)]
struct RunSettings {
    strategy_path: PathBuf,
    data_path: PathBuf,
    capital: f64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(err: &StratlangError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Flag value wins; otherwise fall back to the config file.
fn resolve_settings(
    args: &RunArgs,
    config: Option<&dyn ConfigPort>,
) -> Result<RunSettings, StratlangError> {
    let resolve_path = |flag: &Option<PathBuf>, key: &str| -> Result<PathBuf, StratlangError> {
        if let Some(path) = flag {
            return Ok(path.clone());
        }
        config
            .and_then(|c| c.get_string("backtest", key))
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| StratlangError::ConfigMissing {
                section: "backtest".to_string(),
                key: key.to_string(),
            })
    };

    let capital = match args.capital {
        Some(c) => c,
        None => config.map_or(1.0, |c| c.get_double("backtest", "initial_capital", 1.0)),
    };
    if capital <= 0.0 {
        return Err(StratlangError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }

    let resolve_date = |flag: Option<NaiveDate>, key: &str| -> Result<Option<NaiveDate>, StratlangError> {
        match flag {
            Some(d) => Ok(Some(d)),
            None => match config {
                Some(c) => parse_date(c.get_string("backtest", key).as_deref(), key),
                None => Ok(None),
            },
        }
    };
    let start = resolve_date(args.start, "start_date")?;
    let end = resolve_date(args.end, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(StratlangError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }

    Ok(RunSettings {
        strategy_path: resolve_path(&args.strategy, "strategy")?,
        data_path: resolve_path(&args.data, "data")?,
        capital,
        start,
        end,
    })
}

/// Read, parse and compile a strategy file, printing positioned errors.
fn load_strategy(path: &PathBuf) -> Result<(Strategy, CompiledStrategy), ExitCode> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", path.display());
            return Err(ExitCode::from(1));
        }
    };

    let strategy = match parser::parse(&text) {
        Ok(s) => s,
        Err(e) => {
            match &e {
                StratlangError::Syntax(syntax) => {
                    eprintln!("error: failed to parse strategy:\n{}", syntax.display_with_context(&text));
                }
                other => eprintln!("error: {other}"),
            }
            return Err(ExitCode::from(&e));
        }
    };

    let compiled = match compiler::compile(&strategy) {
        Ok(c) => c,
        Err(e) => return Err(fail(&e)),
    };

    Ok((strategy, compiled))
}

fn run_backtest_command(args: RunArgs) -> ExitCode {
    let adapter = match &args.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(a) => Some(a),
                Err(code) => return code,
            }
        }
        None => None,
    };

    // Flags may stand in for missing config keys, so only a pure-config run
    // is validated wholesale.
    if let Some(adapter) = &adapter {
        if args.strategy.is_none() && args.data.is_none() {
            if let Err(e) = validate_run_config(adapter) {
                return fail(&e);
            }
        }
    }

    let settings = match resolve_settings(&args, adapter.as_ref().map(|a| a as &dyn ConfigPort)) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("Loading strategy from {}", settings.strategy_path.display());
    let (_, compiled) = match load_strategy(&settings.strategy_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    eprintln!("Loading data from {}", settings.data_path.display());
    let data_port = CsvAdapter::new(settings.data_path.clone());
    let series = match data_port.load_series(settings.start, settings.end) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!("  {} bars loaded", series.len());

    let signals = compiled.evaluate(&series);
    let config = BacktestConfig {
        initial_capital: settings.capital,
    };
    let result = run_backtest(&series, &signals, &config);

    print_summary(&result);
    print_trades(&series, &result);

    if let Some(output) = &args.output {
        if let Err(e) = write_trades_csv(output, &series, &result) {
            return fail(&e);
        }
        eprintln!("\nTrades written to: {}", output.display());
    }

    ExitCode::SUCCESS
}

fn print_summary(result: &BacktestResult) {
    let summary = &result.summary;
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Total Return:     {:.2}%", summary.total_return_pct);
    eprintln!("Max Drawdown:     {:.2}%", summary.max_drawdown_pct);
    eprintln!("Trades:           {}", summary.num_trades);
    eprintln!("Ending Capital:   {:.4}", summary.ending_capital);
}

fn print_trades(series: &PriceSeries, result: &BacktestResult) {
    if result.trades.is_empty() {
        return;
    }
    let bars = series.bars();
    println!(
        "{:<12} {:<12} {:>10} {:>10} {:>10} {:>9}",
        "entry", "exit", "entry_px", "exit_px", "pnl", "return%"
    );
    for trade in &result.trades {
        println!(
            "{:<12} {:<12} {:>10.2} {:>10.2} {:>10.2} {:>8.2}%",
            bars[trade.entry_index].date,
            bars[trade.exit_index].date,
            trade.entry_price,
            trade.exit_price,
            trade.pnl,
            trade.return_pct,
        );
    }
}

fn write_trades_csv(
    path: &PathBuf,
    series: &PriceSeries,
    result: &BacktestResult,
) -> Result<(), StratlangError> {
    let bars = series.bars();
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| StratlangError::Data {
            reason: format!("failed to open {}: {e}", path.display()),
        })?;
    writer
        .write_record([
            "entry_date",
            "exit_date",
            "entry_price",
            "exit_price",
            "pnl",
            "return_pct",
        ])
        .and_then(|()| {
            result.trades.iter().try_for_each(|trade| {
                writer.write_record([
                    bars[trade.entry_index].date.to_string(),
                    bars[trade.exit_index].date.to_string(),
                    trade.entry_price.to_string(),
                    trade.exit_price.to_string(),
                    trade.pnl.to_string(),
                    trade.return_pct.to_string(),
                ])
            })
        })
        .and_then(|()| writer.flush().map_err(csv::Error::from))
        .map_err(|e| StratlangError::Data {
            reason: format!("failed to write trades: {e}"),
        })
}

fn run_check(strategy_path: &PathBuf) -> ExitCode {
    eprintln!("Checking strategy: {}", strategy_path.display());
    let (strategy, _) = match load_strategy(strategy_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    match &strategy.entry {
        Some(expr) => eprintln!("  entry: {expr}"),
        None => eprintln!("  entry: (none)"),
    }
    match &strategy.exit {
        Some(expr) => eprintln!("  exit:  {expr}"),
        None => eprintln!("  exit:  (none)"),
    }
    eprintln!("\nStrategy is valid.");
    ExitCode::SUCCESS
}

fn run_signals(
    strategy_path: &PathBuf,
    data_path: &PathBuf,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ExitCode {
    let (_, compiled) = match load_strategy(strategy_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    let data_port = CsvAdapter::new(data_path.clone());
    let series = match data_port.load_series(start, end) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let signals = compiled.evaluate(&series);
    println!("date,entry,exit");
    for (i, bar) in series.bars().iter().enumerate() {
        println!("{},{},{}", bar.date, signals.entry[i], signals.exit[i]);
    }
    ExitCode::SUCCESS
}
