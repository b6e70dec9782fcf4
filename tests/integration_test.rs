//! End-to-end pipeline tests: strategy text through parse, compile, signal
//! evaluation and backtest.

mod common;

use std::io::Write;

use approx::assert_relative_eq;
use stratlang::adapters::csv_adapter::CsvAdapter;
use stratlang::domain::backtest::BacktestConfig;
use stratlang::domain::error::StratlangError;
use stratlang::domain::run_strategy;
use stratlang::ports::data_port::DataPort;
use tempfile::NamedTempFile;

use common::{csv_from_closes, series_from_closes};

#[test]
fn two_round_trips_compound_capital() {
    // Entry fires on closes 102 and 106, exit on 105 and 107:
    // trades 102 -> 105 and 106 -> 107.
    let closes = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0, 106.0, 108.0, 107.0, 109.0];
    let series = series_from_closes(&closes);
    let text = "\
ENTRY:
close == 102 OR close == 106
EXIT:
close == 105 OR close == 107
";
    let result = run_strategy(text, &series, &BacktestConfig::default()).unwrap();

    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[0].entry_index, 1);
    assert_eq!(result.trades[0].exit_index, 4);
    assert_eq!(result.trades[1].entry_index, 6);
    assert_eq!(result.trades[1].exit_index, 8);

    let expected = (105.0 / 102.0) * (107.0 / 106.0);
    assert_relative_eq!(result.summary.ending_capital, expected, epsilon = 1e-12);
    assert_eq!(result.summary.num_trades, 2);
    assert_eq!(result.equity_curve.len(), closes.len());
    assert_relative_eq!(
        result.equity_curve.last().unwrap().capital,
        expected,
        epsilon = 1e-12
    );
}

#[test]
fn sma_crossover_strategy_trades_a_cycle() {
    // Ramp up, crash, ramp up again. Price opens above its 3-bar average on
    // the way up and falls below it on the way down.
    let closes = [
        10.0, 11.0, 12.0, 13.0, 14.0, 9.0, 8.0, 7.0, 10.0, 11.0, 12.0, 13.0,
    ];
    let series = series_from_closes(&closes);
    let text = "\
ENTRY:
close > SMA(close,3)
EXIT:
close < SMA(close,3)
";
    let result = run_strategy(text, &series, &BacktestConfig::default()).unwrap();
    assert!(!result.trades.is_empty());
    // Capital is exactly the product of per-trade ratios.
    let product: f64 = result
        .trades
        .iter()
        .map(|t| t.exit_price / t.entry_price)
        .product();
    assert_relative_eq!(result.summary.ending_capital, product, epsilon = 1e-12);
}

#[test]
fn entry_only_strategy_is_force_closed() {
    let series = series_from_closes(&[100.0, 110.0, 121.0]);
    let result = run_strategy("ENTRY:\nclose > 0", &series, &BacktestConfig::default()).unwrap();
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].entry_index, 0);
    assert_eq!(result.trades[0].exit_index, 2);
    assert_relative_eq!(result.summary.ending_capital, 1.21, epsilon = 1e-12);
}

#[test]
fn empty_strategy_never_trades() {
    let series = series_from_closes(&[100.0, 110.0]);
    let result = run_strategy("", &series, &BacktestConfig::default()).unwrap();
    assert!(result.trades.is_empty());
    assert_relative_eq!(result.summary.total_return_pct, 0.0);
}

#[test]
fn pipeline_is_deterministic() {
    let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0).collect();
    let series = series_from_closes(&closes);
    let text = "\
ENTRY:
CROSS(close, SMA(close,5)) AND volume > 1000
EXIT:
RSI(close,14) < 30 OR close < SMA(close,5)
";
    let a = run_strategy(text, &series, &BacktestConfig::default()).unwrap();
    let b = run_strategy(text, &series, &BacktestConfig::default()).unwrap();
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.equity_curve, b.equity_curve);
    assert_eq!(a.summary, b.summary);
}

#[test]
fn csv_file_feeds_the_pipeline() {
    let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", csv_from_closes(&closes)).unwrap();

    let adapter = CsvAdapter::new(file.path().to_path_buf());
    let series = adapter.load_series(None, None).unwrap();
    assert_eq!(series.len(), 40);

    let text = "\
ENTRY:
close > SMA(close,20) AND volume > 1000000
EXIT:
RSI(close,14) < 30
";
    let config = BacktestConfig {
        initial_capital: 10_000.0,
    };
    let result = run_strategy(text, &series, &config).unwrap();
    // Volume is exactly 1000000, never strictly above: no entries.
    assert!(result.trades.is_empty());
    assert_relative_eq!(result.summary.ending_capital, 10_000.0);
}

#[test]
fn syntax_error_surfaces_with_position() {
    let series = series_from_closes(&[100.0]);
    let err = run_strategy("ENTRY: close >", &series, &BacktestConfig::default()).unwrap_err();
    match err {
        StratlangError::Syntax(syntax) => {
            assert_eq!(syntax.position, 14);
            assert!(syntax.to_string().contains("expected value"));
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn semantic_error_stops_before_backtest() {
    let series = series_from_closes(&[100.0, 101.0]);
    let err = run_strategy(
        "ENTRY:\nclose > EMA(close, 10)",
        &series,
        &BacktestConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StratlangError::Semantic(_)));
    assert!(err.to_string().contains("unknown indicator 'EMA'"));
}

#[test]
fn warmup_bars_never_trigger_signals() {
    // With a 5-bar SMA the first four bars are undefined; comparisons there
    // must be false, so the first possible entry is bar index 4.
    let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let series = series_from_closes(&closes);
    let result = run_strategy(
        "ENTRY:\nclose > SMA(close,5)",
        &series,
        &BacktestConfig::default(),
    )
    .unwrap();
    assert_eq!(result.trades.len(), 1);
    assert!(result.trades[0].entry_index >= 4);
}
