//! Shared test fixtures.
#![allow(dead_code)]

use chrono::NaiveDate;
use stratlang::domain::bar::{PriceBar, PriceSeries};

pub fn bar(index: usize, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(index as u64),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000_000.0,
    }
}

pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| bar(i, close))
        .collect();
    PriceSeries::new(bars).unwrap()
}

/// Render a series-shaped CSV the data adapter can load.
pub fn csv_from_closes(closes: &[f64]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for (i, &close) in closes.iter().enumerate() {
        let b = bar(i, close);
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
