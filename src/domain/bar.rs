//! Price bar and validated price series.

use chrono::NaiveDate;

use crate::domain::error::StratlangError;

/// A single OHLCV bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// The bar columns a strategy may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "open" => Some(Column::Open),
            "high" => Some(Column::High),
            "low" => Some(Column::Low),
            "close" => Some(Column::Close),
            "volume" => Some(Column::Volume),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }
}

/// An ordered series of bars with strictly increasing, unique dates.
///
/// Only constructible through [`PriceSeries::new`], so every downstream
/// consumer (signal evaluation, backtest) can rely on the ordering invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, StratlangError> {
        for pair in bars.windows(2) {
            if pair[1].date == pair[0].date {
                return Err(StratlangError::InvalidSeries {
                    reason: format!("duplicate timestamp {}", pair[1].date),
                });
            }
            if pair[1].date < pair[0].date {
                return Err(StratlangError::InvalidSeries {
                    reason: format!(
                        "timestamps not ascending: {} follows {}",
                        pair[1].date, pair[0].date
                    ),
                });
            }
        }
        if let Some(bar) = bars.iter().find(|b| b.volume < 0.0) {
            return Err(StratlangError::InvalidSeries {
                reason: format!("negative volume on {}", bar.date),
            });
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Extract one column as a dense vector.
    pub fn column(&self, column: Column) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| match column {
                Column::Open => b.open,
                Column::High => b.high,
                Column::Low => b.low,
                Column::Close => b.close,
                Column::Volume => b.volume,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn column_from_name() {
        assert_eq!(Column::from_name("close"), Some(Column::Close));
        assert_eq!(Column::from_name("volume"), Some(Column::Volume));
        assert_eq!(Column::from_name("CLOSE"), None);
        assert_eq!(Column::from_name("price"), None);
    }

    #[test]
    fn column_round_trip() {
        for col in [
            Column::Open,
            Column::High,
            Column::Low,
            Column::Close,
            Column::Volume,
        ] {
            assert_eq!(Column::from_name(col.name()), Some(col));
        }
    }

    #[test]
    fn series_accepts_ascending_dates() {
        let series = PriceSeries::new(vec![bar(1, 100.0), bar(2, 101.0), bar(3, 102.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
    }

    #[test]
    fn series_accepts_empty() {
        let series = PriceSeries::new(vec![]).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let err = PriceSeries::new(vec![bar(1, 100.0), bar(1, 101.0)]).unwrap_err();
        assert!(err.to_string().contains("duplicate timestamp"));
    }

    #[test]
    fn series_rejects_descending_dates() {
        let err = PriceSeries::new(vec![bar(2, 100.0), bar(1, 101.0)]).unwrap_err();
        assert!(err.to_string().contains("not ascending"));
    }

    #[test]
    fn series_rejects_negative_volume() {
        let mut b = bar(1, 100.0);
        b.volume = -5.0;
        let err = PriceSeries::new(vec![b]).unwrap_err();
        assert!(err.to_string().contains("negative volume"));
    }

    #[test]
    fn column_extraction() {
        let series = PriceSeries::new(vec![bar(1, 100.0), bar(2, 102.0)]).unwrap();
        assert_eq!(series.column(Column::Close), vec![100.0, 102.0]);
        assert_eq!(series.column(Column::High), vec![101.0, 103.0]);
        assert_eq!(series.column(Column::Volume), vec![1000.0, 1000.0]);
    }
}
