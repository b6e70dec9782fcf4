//! Equity curve and summary statistics.

use chrono::NaiveDate;

use crate::domain::backtest::Trade;
use crate::domain::bar::PriceSeries;

/// Mark-to-close equity state on one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub capital: f64,
    pub running_max: f64,
    /// Fractional drop from the running peak; 0 at a new peak, negative below.
    pub drawdown: f64,
}

/// Aggregate run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub total_return_pct: f64,
    /// Largest peak-to-trough drop, in percent. Always <= 0.
    pub max_drawdown_pct: f64,
    pub num_trades: usize,
    pub ending_capital: f64,
}

/// Compute per-bar equity. Capital changes only on trade exits, applying the
/// same `exit / entry` ratio the engine compounds with, so the curve's final
/// point agrees exactly with the summary's ending capital.
pub fn equity_curve(series: &PriceSeries, trades: &[Trade], initial_capital: f64) -> Vec<EquityPoint> {
    let mut capital = initial_capital;
    let mut running_max = initial_capital;
    let mut next_trade = trades.iter().peekable();

    series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if let Some(trade) = next_trade.peek() {
                if trade.exit_index == i {
                    capital *= trade.exit_price / trade.entry_price;
                    next_trade.next();
                }
            }
            running_max = running_max.max(capital);
            EquityPoint {
                date: bar.date,
                capital,
                running_max,
                drawdown: capital / running_max - 1.0,
            }
        })
        .collect()
}

impl BacktestSummary {
    pub fn compute(trades: &[Trade], equity: &[EquityPoint], initial_capital: f64) -> Self {
        let ending_capital = equity.last().map_or(initial_capital, |p| p.capital);
        let max_drawdown_pct = equity
            .iter()
            .map(|p| p.drawdown)
            .fold(0.0_f64, f64::min)
            * 100.0;
        Self {
            total_return_pct: (ending_capital / initial_capital - 1.0) * 100.0,
            max_drawdown_pct,
            num_trades: trades.len(),
            ending_capital,
        }
    }
}
