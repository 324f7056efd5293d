//! Output schema checks for power results
//!
//! A result is only handed to persistence if it parses strictly (no unknown
//! fields) and every numeric field is finite.

use crate::power::types::{MetricVariationPowerResult, MidExperimentPowerCalculationResult};
use thiserror::Error;

/// Errors for power result validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{path} must be a finite number, got {value}")]
    NonFinite { path: String, value: f64 },

    #[error("Malformed power result: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

fn check_finite(path: impl FnOnce() -> String, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SchemaError::NonFinite {
            path: path(),
            value,
        })
    }
}

fn check_optional(index: usize, field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(value) => check_finite(
            || format!("metricVariationPowerResults[{}].{}", index, field),
            value,
        ),
        None => Ok(()),
    }
}

fn validate_metric_results(results: &[MetricVariationPowerResult]) -> Result<()> {
    for (index, result) in results.iter().enumerate() {
        check_optional(index, "power", result.power)?;
        check_optional(index, "effectSize", result.effect_size)?;
        check_optional(index, "additionalDaysNeeded", result.additional_days_needed)?;
    }
    Ok(())
}

/// Reject results carrying NaN or Infinity anywhere
pub fn validate_result(result: &MidExperimentPowerCalculationResult) -> Result<()> {
    match result {
        MidExperimentPowerCalculationResult::Success(success) => {
            check_finite(|| "power".to_string(), success.power)?;
            check_finite(
                || "additionalDaysNeeded".to_string(),
                success.additional_days_needed,
            )?;
            validate_metric_results(&success.metric_variation_power_results)
        }
        MidExperimentPowerCalculationResult::Error(error) => {
            validate_metric_results(&error.metric_variation_power_results)
        }
    }
}

/// Strictly parse a persisted result and validate it
pub fn parse_result(json: &str) -> Result<MidExperimentPowerCalculationResult> {
    let result: MidExperimentPowerCalculationResult =
        serde_json::from_str(json).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    validate_result(&result)?;
    Ok(result)
}
