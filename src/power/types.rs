//! Value records passed through the power pipeline
//!
//! Field names serialize in camelCase to match the JSON the stats engine
//! produces and the persistence layer stores.

use serde::{Deserialize, Serialize, Serializer};

/// Day count that goes on the wire as an integer when it is whole
///
/// Non-finite values stay floats so the schema check still rejects them.
struct WholeDays(f64);

impl Serialize for WholeDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let days = self.0;
        if days.is_finite() && days.fract() == 0.0 && days.abs() <= i64::MAX as f64 / 2.0 {
            serializer.serialize_i64(days as i64)
        } else {
            serializer.serialize_f64(days)
        }
    }
}

fn serialize_days<S: Serializer>(days: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    WholeDays(*days).serialize(serializer)
}

fn serialize_optional_days<S: Serializer>(
    days: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match days {
        Some(days) => serializer.serialize_some(&WholeDays(*days)),
        None => serializer.serialize_none(),
    }
}

/// Outcome reported by the stats engine for one metric x variation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerStatus {
    #[default]
    Successful,
    Unsuccessful,
}

/// Interim posterior statistics for one metric in one non-baseline variation
///
/// When `status` is [`PowerStatus::Unsuccessful`] only `error_message` and
/// `target_lift` are meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPowerResponse {
    #[serde(default)]
    pub status: PowerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Variance of the treatment-control difference, scaled by the first
    /// period's sample size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigmahat2_delta: Option<f64>,
    /// Posterior variance of the difference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma2_posterior: Option<f64>,
    /// Posterior mean of the difference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_posterior: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_period_pairwise_sample_size: Option<f64>,
    /// Signed effect size the test aims to detect
    pub target_lift: f64,
}

/// One goal metric's slot in a variation; `power` is `None` when the stats
/// engine produced nothing for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPowerEntry {
    pub metric_id: String,
    #[serde(default)]
    pub power: Option<MetricPowerResponse>,
}

/// Goal metrics of one variation, in goal-metric order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationPowerInput {
    pub metrics: Vec<MetricPowerEntry>,
}

/// Settings for one aggregate power calculation
///
/// `variation_weights` and `variations` are index-aligned; index 0 is the
/// baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerInput {
    pub alpha: f64,
    pub sequential: bool,
    pub sequential_tuning_parameter: f64,
    /// Days left in the experiment; `<= 0` means power cannot be computed
    pub days_remaining: i64,
    /// Units observed so far, pooled across variations
    pub first_period_sample_size: f64,
    /// Expected new users per day across all variations
    pub new_daily_users: f64,
    pub num_goal_metrics: usize,
    pub variation_weights: Vec<f64>,
    pub variations: Vec<VariationPowerInput>,
}

/// Inputs for a single metric x variation calculation
#[derive(Debug, Clone, PartialEq)]
pub struct SinglePowerParams {
    pub alpha: f64,
    pub sequential: bool,
    pub sequential_tuning_parameter: f64,
    pub days_remaining: i64,
    pub first_period_sample_size: f64,
    /// New daily users for the baseline + this variation pair only
    pub new_daily_users: f64,
    pub num_goal_metrics: usize,
    pub num_variations: usize,
    pub variation: Option<MetricPowerResponse>,
}

/// Power estimate (or the reason there is none) for one metric x variation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetricVariationPowerResult {
    pub metric_id: String,
    pub variation: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,
    /// Whole days; serialized as a JSON integer
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_days"
    )]
    pub additional_days_needed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_low_powered: Option<bool>,
}

impl MetricVariationPowerResult {
    pub(crate) fn error(metric_id: &str, variation: usize, message: impl Into<String>) -> Self {
        Self {
            metric_id: metric_id.to_string(),
            variation,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// No error and both power and days present
    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
            && self.power.is_some()
            && self.additional_days_needed.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MidExperimentPowerSuccess {
    /// Best of the per-variation worst-case metric powers
    pub power: f64,
    /// Fewest days among the per-variation worst-case metrics, serialized
    /// as a JSON integer
    #[serde(serialize_with = "serialize_days")]
    pub additional_days_needed: f64,
    pub is_low_powered: bool,
    pub metric_variation_power_results: Vec<MetricVariationPowerResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MidExperimentPowerError {
    pub is_low_powered: bool,
    pub metric_variation_power_results: Vec<MetricVariationPowerResult>,
}

/// Aggregate verdict, tagged by `"type"` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MidExperimentPowerCalculationResult {
    Success(MidExperimentPowerSuccess),
    Error(MidExperimentPowerError),
}

impl MidExperimentPowerCalculationResult {
    pub fn is_low_powered(&self) -> bool {
        match self {
            Self::Success(success) => success.is_low_powered,
            Self::Error(error) => error.is_low_powered,
        }
    }

    pub fn metric_variation_power_results(&self) -> &[MetricVariationPowerResult] {
        match self {
            Self::Success(success) => &success.metric_variation_power_results,
            Self::Error(error) => &error.metric_variation_power_results,
        }
    }
}
