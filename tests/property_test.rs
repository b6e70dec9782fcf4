//! Property tests over the parser, indicators and backtest arithmetic.

mod common;

use proptest::prelude::*;
use stratlang::domain::backtest::BacktestConfig;
use stratlang::domain::indicator::{rsi, sma};
use stratlang::domain::parser::parse;
use stratlang::domain::run_strategy;

use common::series_from_closes;

proptest! {
    #[test]
    fn parser_never_panics(input in ".{0,200}") {
        let _ = parse(&input);
    }

    #[test]
    fn parser_handles_arbitrary_expression_shaped_input(
        input in "(ENTRY|EXIT|close|SMA|[0-9(),.:<>= ]){0,40}"
    ) {
        let _ = parse(&input);
    }

    #[test]
    fn sma_of_period_one_is_identity(values in prop::collection::vec(1.0f64..1000.0, 0..50)) {
        let out = sma(&values, 1);
        prop_assert_eq!(out, values);
    }

    #[test]
    fn sma_stays_within_input_range(
        values in prop::collection::vec(1.0f64..1000.0, 5..50),
        period in 1usize..10,
    ) {
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for v in sma(&values, period) {
            if !v.is_nan() {
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
            }
        }
    }

    #[test]
    fn rsi_stays_within_bounds(
        values in prop::collection::vec(1.0f64..1000.0, 2..60),
        period in 1usize..20,
    ) {
        let out = rsi(&values, period);
        prop_assert!(out[0].is_nan());
        for v in &out[1..] {
            prop_assert!(!v.is_nan());
            prop_assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn cross_never_fires_on_the_first_bar(
        closes in prop::collection::vec(1.0f64..1000.0, 1..40)
    ) {
        let series = series_from_closes(&closes);
        let result = run_strategy(
            "ENTRY:\nCROSS(close, 500)",
            &series,
            &BacktestConfig::default(),
        ).unwrap();
        for trade in &result.trades {
            prop_assert!(trade.entry_index >= 1);
        }
    }

    #[test]
    fn capital_is_the_product_of_trade_ratios(
        closes in prop::collection::vec(1.0f64..1000.0, 2..60)
    ) {
        let series = series_from_closes(&closes);
        let result = run_strategy(
            "ENTRY:\nclose > SMA(close,3)\nEXIT:\nclose < SMA(close,3)",
            &series,
            &BacktestConfig::default(),
        ).unwrap();

        let product: f64 = result
            .trades
            .iter()
            .map(|t| t.exit_price / t.entry_price)
            .product();
        prop_assert!((result.summary.ending_capital - product).abs() < 1e-9);
    }

    #[test]
    fn drawdown_is_never_positive(
        closes in prop::collection::vec(1.0f64..1000.0, 2..60)
    ) {
        let series = series_from_closes(&closes);
        let result = run_strategy(
            "ENTRY:\nclose > close.shift(1)\nEXIT:\nclose < close.shift(1)",
            &series,
            &BacktestConfig::default(),
        ).unwrap();

        for point in &result.equity_curve {
            prop_assert!(point.drawdown <= 1e-12);
            prop_assert!(point.capital <= point.running_max + 1e-12);
        }
        prop_assert!(result.summary.max_drawdown_pct <= 1e-9);
    }

    #[test]
    fn backtest_is_deterministic(
        closes in prop::collection::vec(1.0f64..1000.0, 2..40)
    ) {
        let series = series_from_closes(&closes);
        let text = "ENTRY:\nCROSS(close, SMA(close,4))\nEXIT:\nRSI(close,5) < 40";
        let a = run_strategy(text, &series, &BacktestConfig::default()).unwrap();
        let b = run_strategy(text, &series, &BacktestConfig::default()).unwrap();
        prop_assert_eq!(a.trades, b.trades);
        prop_assert_eq!(a.summary, b.summary);
    }
}
