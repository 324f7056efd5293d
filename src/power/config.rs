// Configuration for mid-experiment power estimation
//
// Only the defaults used when an analysis leaves a setting unset are
// configurable. The low-power and failure-ratio thresholds are fixed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Power below this value marks a metric (or the experiment) as low powered.
pub const LOW_POWER_THRESHOLD: f64 = 0.1;

/// An aggregate is reported as `success` only while the share of failed
/// metric x variation pairs stays strictly below this ratio.
pub const MAX_FAILURE_RATIO: f64 = 0.2;

/// `true` when `power` is strictly below [`LOW_POWER_THRESHOLD`].
///
/// NaN compares false, so a NaN power is never flagged as low powered.
pub fn is_low_powered(power: f64) -> bool {
    power < LOW_POWER_THRESHOLD
}

/// Defaults applied by the experiment-level facade
///
/// # Example
/// ```
/// use interim_power::power::PowerConfig;
///
/// let config = PowerConfig::default();
/// assert_eq!(config.default_alpha, 0.05);
/// assert_eq!(config.exposure_window_days, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Significance level used when the analysis has no p-value threshold
    ///
    /// Default: 0.05
    pub default_alpha: f64,

    /// Mixture tuning parameter for sequential testing when the analysis
    /// does not set one
    ///
    /// Larger values concentrate the mixture on smaller effects.
    ///
    /// Default: 5000
    pub default_sequential_tuning_parameter: f64,

    /// Number of complete days (today excluded) averaged to estimate new
    /// daily users
    ///
    /// Default: 7
    pub exposure_window_days: u32,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            default_alpha: 0.05,
            default_sequential_tuning_parameter: 5000.0,
            exposure_window_days: 7,
        }
    }
}

impl PowerConfig {
    /// Parse a TOML document; keys that are absent keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("Failed to parse power config")?;
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read power config {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_alpha.is_nan() || self.default_alpha <= 0.0 || self.default_alpha >= 1.0 {
            return Err(format!(
                "default_alpha must be in (0, 1), got {}",
                self.default_alpha
            ));
        }

        if self.default_sequential_tuning_parameter.is_nan()
            || self.default_sequential_tuning_parameter <= 0.0
        {
            return Err(format!(
                "default_sequential_tuning_parameter must be positive, got {}",
                self.default_sequential_tuning_parameter
            ));
        }

        if self.exposure_window_days == 0 {
            return Err("exposure_window_days must be at least 1".to_string());
        }

        Ok(())
    }
}
