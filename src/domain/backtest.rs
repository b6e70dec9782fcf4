//! Long-only, all-in backtest over signal vectors.
//!
//! A two-state machine walks the bars: FLAT until an entry signal fires,
//! then LONG until an exit signal fires. Fills happen at the close of the
//! signal bar. When both signals fire on the same bar, the position state
//! decides: a flat book takes the entry, an open position takes the exit.

use crate::domain::bar::PriceSeries;
use crate::domain::compiler::SignalSet;
use crate::domain::metrics::{equity_curve, BacktestSummary, EquityPoint};

/// Engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1.0,
        }
    }
}

/// One round trip: entry fill and exit fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub return_pct: f64,
}

/// Everything a run produces: the trade list, the bar-by-bar equity curve
/// and the aggregate summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: BacktestSummary,
}

/// Run the state machine over a series and its signals.
///
/// Infallible: the series is already validated and signal vectors come from
/// the compiler aligned to it. A still-open position at the end of data is
/// force-closed at the final close.
pub fn run_backtest(
    series: &PriceSeries,
    signals: &SignalSet,
    config: &BacktestConfig,
) -> BacktestResult {
    let bars = series.bars();
    debug_assert_eq!(signals.entry.len(), bars.len());
    debug_assert_eq!(signals.exit.len(), bars.len());

    let mut trades = Vec::new();
    let mut open_entry: Option<(usize, f64)> = None;

    for (i, bar) in bars.iter().enumerate() {
        match open_entry {
            None if signals.entry[i] => {
                open_entry = Some((i, bar.close));
            }
            Some((entry_index, entry_price)) if signals.exit[i] => {
                trades.push(close_trade(entry_index, entry_price, i, bar.close));
                open_entry = None;
            }
            _ => {}
        }
    }

    if let (Some((entry_index, entry_price)), Some(last)) = (open_entry, bars.last()) {
        trades.push(close_trade(
            entry_index,
            entry_price,
            bars.len() - 1,
            last.close,
        ));
    }

    let equity = equity_curve(series, &trades, config.initial_capital);
    let summary = BacktestSummary::compute(&trades, &equity, config.initial_capital);
    BacktestResult {
        trades,
        equity_curve: equity,
        summary,
    }
}

fn close_trade(entry_index: usize, entry_price: f64, exit_index: usize, exit_price: f64) -> Trade {
    Trade {
        entry_index,
        exit_index,
        entry_price,
        exit_price,
        pnl: exit_price - entry_price,
        return_pct: (exit_price / entry_price - 1.0) * 100.0,
    }
}
