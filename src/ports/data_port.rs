//! Market data access port trait.

use chrono::NaiveDate;

use crate::domain::bar::PriceSeries;
use crate::domain::error::StratlangError;

pub trait DataPort {
    /// Load a validated price series, optionally restricted to an inclusive
    /// date window.
    fn load_series(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, StratlangError>;
}
