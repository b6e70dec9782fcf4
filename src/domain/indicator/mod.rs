//! Technical indicators over dense f64 vectors.
//!
//! Inputs and outputs are aligned with the bar series; positions where an
//! indicator is undefined (warm-up, missing inputs) hold NaN.

mod rsi;
mod sma;

pub use rsi::rsi;
pub use sma::sma;
