//! Core domain: strategy language, signal evaluation and backtesting.

pub mod ast;
pub mod backtest;
pub mod bar;
pub mod compiler;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod parser;

use backtest::{run_backtest, BacktestConfig, BacktestResult};
use bar::PriceSeries;
use error::StratlangError;

/// Full pipeline: parse strategy text, compile it, evaluate signals over the
/// series and run the backtest.
pub fn run_strategy(
    text: &str,
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, StratlangError> {
    let strategy = parser::parse(text)?;
    let compiled = compiler::compile(&strategy)?;
    let signals = compiled.evaluate(series);
    Ok(run_backtest(series, &signals, config))
}
