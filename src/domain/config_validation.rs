//! Configuration validation.
//!
//! Runs before any data is read and reports the first offending key.

use crate::domain::error::StocksimError;
use crate::domain::strategy::StrategyKind;
use crate::domain::universe::parse_instruments;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    validate_simulation_config(config)?;
    validate_data_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    validate_initial_capital(config)?;
    validate_fee(config)?;
    validate_tax_rate(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    match config.get_string("data", "directory") {
        Some(s) if !s.trim().is_empty() => {}
        _ => return Err(missing("data", "directory")),
    }

    match config.get_string("data", "instruments") {
        Some(s) if !s.trim().is_empty() => {
            parse_instruments(&s).map_err(|e| invalid("data", "instruments", e.to_string()))?;
            Ok(())
        }
        _ => Err(missing("data", "instruments")),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    if let Some(name) = config.get_string("strategy", "name") {
        name.parse::<StrategyKind>()
            .map_err(|e| invalid("strategy", "name", e.to_string()))?;
    }

    if let Some(lookback) = integer(config, "strategy", "lookback")? {
        if lookback < 1 {
            return Err(invalid(
                "strategy",
                "lookback",
                "lookback must be a positive integer",
            ));
        }
    }

    if let Some(seed) = integer(config, "strategy", "seed")? {
        if seed < 0 {
            return Err(invalid(
                "strategy",
                "seed",
                "seed must be a non-negative integer",
            ));
        }
    }
    Ok(())
}

/// Numeric value of a key, `None` when absent, an error when present but not
/// a number.
pub(crate) fn number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, StocksimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("{:?} is not a number", raw))),
    }
}

/// Whole-number value of a key. Integral spellings such as `5.0` or `1e3`
/// are accepted; fractions are not.
pub(crate) fn integer(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, StocksimError> {
    match number(config, section, key)? {
        None => Ok(None),
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64 => {
            Ok(Some(v as i64))
        }
        Some(_) => Err(invalid(section, key, format!("{} must be an integer", key))),
    }
}

pub(crate) fn date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, StocksimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key))),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    match number(config, "simulation", "initial_capital")? {
        Some(value) if value <= 0.0 || !value.is_finite() => Err(invalid(
            "simulation",
            "initial_capital",
            "initial_capital must be positive",
        )),
        _ => Ok(()),
    }
}

fn validate_fee(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    match number(config, "simulation", "fee_per_trade")? {
        Some(value) if value < 0.0 || !value.is_finite() => Err(invalid(
            "simulation",
            "fee_per_trade",
            "fee_per_trade must be non-negative",
        )),
        _ => Ok(()),
    }
}

fn validate_tax_rate(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    match number(config, "simulation", "capital_gains_tax_rate")? {
        Some(value) if !(0.0..1.0).contains(&value) => Err(invalid(
            "simulation",
            "capital_gains_tax_rate",
            "capital_gains_tax_rate must be at least 0 and below 1",
        )),
        _ => Ok(()),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    let start = date(config, "simulation", "start_date")?;
    let end = date(config, "simulation", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "simulation",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn missing(section: &str, key: &str) -> StocksimError {
    StocksimError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StocksimError {
    StocksimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}
