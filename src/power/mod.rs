// Mid-experiment statistical power estimation
//
// Given a running A/B test's interim statistics, estimates the probability that
// continuing for N more days detects the target effect, under either a
// fixed-horizon test (Bonferroni-corrected across goal metrics and variations)
// or a sequential test (always-valid confidence sequences).
//
// Pipeline, leaf to root:
// - normal:     standard normal quantile/CDF (statrs)
// - sequential: confidence-sequence halfwidth and posterior-variance update
// - single:     power for one (metric, variation) pair
// - aggregate:  power across every non-baseline variation x goal metric
// - analyze:    experiment-level facade over traffic health + analysis results
//
// Numeric failures (NaN, Infinity) propagate untouched through the pipeline and
// are caught exactly once, by the schema check at the facade.

mod aggregate;
mod analyze;
mod config;
mod normal;
mod report;
mod schema;
mod sequential;
mod single;
mod types;

pub use aggregate::calculate_mid_experiment_power;
pub use analyze::{
    analyze_experiment_power, analyze_experiment_power_at, average_exposure_over_last_n_days,
    AnalysisResult, AnalysisSettings, AnalysisVariation, ExperimentAnalysis,
    ExperimentPowerRequest, MetricAnalysis, TrafficHealth, TrafficSlice, VariationSetting,
};
pub use config::{is_low_powered, PowerConfig, LOW_POWER_THRESHOLD, MAX_FAILURE_RATIO};
pub use normal::{normal_cdf, normal_quantile};
pub use schema::{parse_result, validate_result, SchemaError};
pub use sequential::{
    final_posterior_variance, sequential_discriminant, sequential_interval_halfwidth,
    sequential_rho,
};
pub use single::calculate_mid_experiment_power_single;
pub use types::{
    MetricPowerEntry, MetricPowerResponse, MetricVariationPowerResult, MidExperimentPowerError,
    MidExperimentPowerCalculationResult, MidExperimentPowerSuccess, PowerInput, PowerStatus,
    SinglePowerParams, VariationPowerInput,
};
