//! Configuration validation.
//!
//! Checks the `[backtest]` section of a run config before any work starts.

use chrono::NaiveDate;

use crate::domain::error::StratlangError;
use crate::ports::config_port::ConfigPort;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), StratlangError> {
    validate_path_key(config, "strategy")?;
    validate_path_key(config, "data")?;
    validate_initial_capital(config)?;
    validate_dates(config)?;
    Ok(())
}

fn validate_path_key(config: &dyn ConfigPort, key: &str) -> Result<(), StratlangError> {
    match config.get_string("backtest", key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StratlangError::ConfigMissing {
            section: "backtest".to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), StratlangError> {
    let value = config.get_double("backtest", "initial_capital", 1.0);
    if value <= 0.0 {
        return Err(StratlangError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StratlangError> {
    let start = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(StratlangError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

/// Parse an optional `YYYY-MM-DD` config value. Dates are optional; a present
/// but malformed value is an error.
pub fn parse_date(value: Option<&str>, key: &str) -> Result<Option<NaiveDate>, StratlangError> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
            StratlangError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("invalid {key} format, expected YYYY-MM-DD"),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const VALID: &str = "\
[backtest]
strategy = momentum.strat
data = prices.csv
initial_capital = 10000
start_date = 2024-01-01
end_date = 2024-06-30
";

    #[test]
    fn accepts_complete_config() {
        assert!(validate_run_config(&config(VALID)).is_ok());
    }

    #[test]
    fn dates_and_capital_are_optional() {
        let cfg = config("[backtest]\nstrategy = s.strat\ndata = d.csv\n");
        assert!(validate_run_config(&cfg).is_ok());
    }

    #[test]
    fn missing_strategy_rejected() {
        let cfg = config("[backtest]\ndata = d.csv\n");
        let err = validate_run_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("strategy"));
    }

    #[test]
    fn missing_data_rejected() {
        let cfg = config("[backtest]\nstrategy = s.strat\n");
        let err = validate_run_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn non_positive_capital_rejected() {
        let cfg = config("[backtest]\nstrategy = s\ndata = d\ninitial_capital = 0\n");
        let err = validate_run_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn malformed_date_rejected() {
        let cfg = config("[backtest]\nstrategy = s\ndata = d\nstart_date = Jan 1\n");
        let err = validate_run_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn inverted_date_range_rejected() {
        let cfg = config(
            "[backtest]\nstrategy = s\ndata = d\nstart_date = 2024-06-01\nend_date = 2024-01-01\n",
        );
        let err = validate_run_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("must not be after"));
    }
}
