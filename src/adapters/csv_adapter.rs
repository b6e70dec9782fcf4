//! CSV file data adapter.
//!
//! Expects a header row naming the columns `date,open,high,low,close,volume`
//! (any order). Dates are `YYYY-MM-DD`. Ordering is not repaired here; a file
//! with shuffled or duplicate dates is rejected by [`PriceSeries::new`].

use std::path::PathBuf;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::bar::{PriceBar, PriceSeries};
use crate::domain::error::StratlangError;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

fn data_error(reason: String) -> StratlangError {
    StratlangError::Data { reason }
}

/// Map required column names to their indices in the header row.
fn column_indices(headers: &StringRecord) -> Result<[usize; 6], StratlangError> {
    let mut indices = [0usize; 6];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| data_error(format!("missing column '{name}' in CSV header")))?;
    }
    Ok(indices)
}

fn field<'r>(record: &'r StringRecord, index: usize, name: &str, row: usize) -> Result<&'r str, StratlangError> {
    record
        .get(index)
        .ok_or_else(|| data_error(format!("row {row}: missing {name} field")))
}

fn parse_price(record: &StringRecord, index: usize, name: &str, row: usize) -> Result<f64, StratlangError> {
    field(record, index, name, row)?
        .trim()
        .parse()
        .map_err(|e| data_error(format!("row {row}: invalid {name} value: {e}")))
}

impl DataPort for CsvAdapter {
    fn load_series(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, StratlangError> {
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| data_error(format!("failed to open {}: {e}", self.path.display())))?;

        let headers = reader
            .headers()
            .map_err(|e| data_error(format!("failed to read CSV header: {e}")))?;
        let [date_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] =
            column_indices(headers)?;

        let mut bars = Vec::new();
        for (i, result) in reader.records().enumerate() {
            // header is row 1
            let row = i + 2;
            let record = result.map_err(|e| data_error(format!("row {row}: {e}")))?;

            let date_str = field(&record, date_idx, "date", row)?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| data_error(format!("row {row}: invalid date '{date_str}': {e}")))?;

            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(PriceBar {
                date,
                open: parse_price(&record, open_idx, "open", row)?,
                high: parse_price(&record, high_idx, "high", row)?,
                low: parse_price(&record, low_idx, "low", row)?,
                close: parse_price(&record, close_idx, "close", row)?,
                volume: parse_price(&record, volume_idx, "volume", row)?,
            });
        }

        PriceSeries::new(bars)
    }
}
