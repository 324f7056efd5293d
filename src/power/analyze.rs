//! Experiment-level facade
//!
//! Pulls traffic and per-metric power statistics out of an experiment
//! snapshot, runs the aggregate calculation, and returns the result only if
//! it passes the output schema. `None` is the sole failure signal.

use crate::power::aggregate::calculate_mid_experiment_power;
use crate::power::config::PowerConfig;
use crate::power::schema::validate_result;
use crate::power::types::{
    MetricPowerEntry, MetricPowerResponse, MidExperimentPowerCalculationResult, PowerInput,
    VariationPowerInput,
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const EXPOSURE_DATE_DIMENSION: &str = "dim_exposure_date";

/// Units per variation for one slice of traffic (overall or one dimension value)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSlice {
    pub name: String,
    pub variation_units: Vec<f64>,
}

/// Traffic health summary of a snapshot
///
/// `dimension` maps a dimension name to its slices; exposure dates live under
/// `dim_exposure_date` with ISO `YYYY-MM-DD` slice names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficHealth {
    pub overall: TrafficSlice,
    #[serde(default)]
    pub dimension: HashMap<String, Vec<TrafficSlice>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    #[serde(default)]
    pub sequential_testing: Option<bool>,
    #[serde(default)]
    pub sequential_testing_tuning_parameter: Option<f64>,
    #[serde(default)]
    pub p_value_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    #[serde(default)]
    pub power: Option<MetricPowerResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisVariation {
    #[serde(default)]
    pub metrics: HashMap<String, MetricAnalysis>,
}

/// One dimension slice of analysis results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub variations: Vec<AnalysisVariation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentAnalysis {
    #[serde(default)]
    pub settings: AnalysisSettings,
    #[serde(default)]
    pub results: Vec<AnalysisResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariationSetting {
    /// Share of traffic assigned to this variation
    pub weight: f64,
}

/// Everything the facade needs, as one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentPowerRequest {
    pub traffic_health: TrafficHealth,
    pub target_days_remaining: i64,
    pub analysis: ExperimentAnalysis,
    pub goal_metrics: Vec<String>,
    pub variations_settings: Vec<VariationSetting>,
}

impl ExperimentPowerRequest {
    pub fn analyze(
        &self,
        today: NaiveDate,
        config: &PowerConfig,
    ) -> Option<MidExperimentPowerCalculationResult> {
        analyze_experiment_power_at(
            &self.traffic_health,
            self.target_days_remaining,
            &self.analysis,
            &self.goal_metrics,
            &self.variations_settings,
            today,
            config,
        )
    }
}

/// Average daily exposures over the `n_days` complete days before `today`
///
/// Units are summed across variations and matching dates, then divided by
/// `n_days`. If no date in the window is present (or the exposure-date
/// dimension is missing) the average is NaN.
pub fn average_exposure_over_last_n_days(
    traffic_health: &TrafficHealth,
    n_days: u32,
    today: NaiveDate,
) -> f64 {
    let window: Vec<String> = (1..=u64::from(n_days))
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect();

    let Some(dates) = traffic_health.dimension.get(EXPOSURE_DATE_DIMENSION) else {
        return f64::NAN;
    };

    let daily_totals: Vec<f64> = dates
        .iter()
        .filter(|slice| window.contains(&slice.name))
        .map(|slice| slice.variation_units.iter().sum::<f64>())
        .collect();

    if daily_totals.is_empty() {
        return f64::NAN;
    }

    daily_totals.iter().sum::<f64>() / f64::from(n_days)
}

/// Estimate mid-experiment power as of today's UTC date with default settings
pub fn analyze_experiment_power(
    traffic_health: &TrafficHealth,
    target_days_remaining: i64,
    analysis: &ExperimentAnalysis,
    goal_metrics: &[String],
    variations_settings: &[VariationSetting],
) -> Option<MidExperimentPowerCalculationResult> {
    analyze_experiment_power_at(
        traffic_health,
        target_days_remaining,
        analysis,
        goal_metrics,
        variations_settings,
        Utc::now().date_naive(),
        &PowerConfig::default(),
    )
}

/// Estimate mid-experiment power as of `today`
///
/// Only the first analysis result slice is read. Returns `None` when the
/// analysis has no results or the computed result fails schema validation.
pub fn analyze_experiment_power_at(
    traffic_health: &TrafficHealth,
    target_days_remaining: i64,
    analysis: &ExperimentAnalysis,
    goal_metrics: &[String],
    variations_settings: &[VariationSetting],
    today: NaiveDate,
    config: &PowerConfig,
) -> Option<MidExperimentPowerCalculationResult> {
    let Some(first_result) = analysis.results.first() else {
        tracing::warn!("Analysis has no result slices, skipping power estimate");
        return None;
    };

    let variations = first_result
        .variations
        .iter()
        .map(|variation| VariationPowerInput {
            metrics: goal_metrics
                .iter()
                .map(|metric_id| MetricPowerEntry {
                    metric_id: metric_id.clone(),
                    power: variation
                        .metrics
                        .get(metric_id)
                        .and_then(|metric| metric.power.clone()),
                })
                .collect(),
        })
        .collect();

    let new_daily_users =
        average_exposure_over_last_n_days(traffic_health, config.exposure_window_days, today)
            .floor();
    let first_period_sample_size = traffic_health.overall.variation_units.iter().sum::<f64>();

    let settings = &analysis.settings;
    let input = PowerInput {
        alpha: settings.p_value_threshold.unwrap_or(config.default_alpha),
        sequential: settings.sequential_testing.unwrap_or(false),
        sequential_tuning_parameter: settings
            .sequential_testing_tuning_parameter
            .unwrap_or(config.default_sequential_tuning_parameter),
        days_remaining: target_days_remaining,
        first_period_sample_size,
        new_daily_users,
        num_goal_metrics: goal_metrics.len(),
        variation_weights: variations_settings.iter().map(|v| v.weight).collect(),
        variations,
    };

    let result = calculate_mid_experiment_power(&input);
    match validate_result(&result) {
        Ok(()) => Some(result),
        Err(e) => {
            tracing::warn!("Discarding power estimate: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn traffic(dates: &[(&str, [f64; 2])]) -> TrafficHealth {
        let mut dimension = HashMap::new();
        dimension.insert(
            EXPOSURE_DATE_DIMENSION.to_string(),
            dates
                .iter()
                .map(|(name, units)| TrafficSlice {
                    name: name.to_string(),
                    variation_units: units.to_vec(),
                })
                .collect(),
        );
        TrafficHealth {
            overall: TrafficSlice {
                name: "All".to_string(),
                variation_units: vec![1000.0, 1000.0],
            },
            dimension,
        }
    }

    #[test]
    fn test_average_full_window() {
        let dates: Vec<(String, [f64; 2])> = (11..=17)
            .map(|d| (format!("2026-10-{}", d), [100.0, 110.0]))
            .collect();
        let borrowed: Vec<(&str, [f64; 2])> =
            dates.iter().map(|(n, u)| (n.as_str(), *u)).collect();

        let avg = average_exposure_over_last_n_days(&traffic(&borrowed), 7, day("2026-10-18"));
        assert_eq!(avg, 210.0);
    }

    #[test]
    fn test_average_excludes_today_and_older_days() {
        let health = traffic(&[
            ("2026-10-18", [1000.0, 1000.0]), // today, incomplete
            ("2026-10-17", [35.0, 35.0]),
            ("2026-10-10", [1000.0, 1000.0]), // eight days ago
        ]);
        let avg = average_exposure_over_last_n_days(&health, 7, day("2026-10-18"));
        assert_eq!(avg, 10.0);
    }

    #[test]
    fn test_average_window_crosses_month_boundary() {
        let health = traffic(&[("2026-09-30", [7.0, 0.0]), ("2026-10-01", [7.0, 0.0])]);
        let avg = average_exposure_over_last_n_days(&health, 7, day("2026-10-03"));
        assert_eq!(avg, 2.0);
    }

    #[test]
    fn test_average_without_matches_is_nan() {
        let health = traffic(&[("2025-01-01", [100.0, 100.0])]);
        assert!(average_exposure_over_last_n_days(&health, 7, day("2026-10-18")).is_nan());
    }

    #[test]
    fn test_average_without_dimension_is_nan() {
        let health = TrafficHealth::default();
        assert!(average_exposure_over_last_n_days(&health, 7, day("2026-10-18")).is_nan());
    }

    #[test]
    fn test_request_parses_snapshot_json() {
        let request: ExperimentPowerRequest = serde_json::from_str(
            r#"{
                "trafficHealth": {
                    "overall": {"name": "All", "variationUnits": [1000, 1000]},
                    "dimension": {
                        "dim_exposure_date": [
                            {"name": "2026-10-17", "variationUnits": [250, 250]}
                        ]
                    }
                },
                "targetDaysRemaining": 14,
                "analysis": {
                    "settings": {"pValueThreshold": 0.1},
                    "results": [{"variations": [{"metrics": {}}, {"metrics": {}}]}]
                },
                "goalMetrics": ["revenue"],
                "variationsSettings": [{"weight": 0.5}, {"weight": 0.5}]
            }"#,
        )
        .unwrap();

        assert_eq!(request.target_days_remaining, 14);
        assert_eq!(request.analysis.settings.p_value_threshold, Some(0.1));
        assert_eq!(request.analysis.settings.sequential_testing, None);
        assert_eq!(request.variations_settings.len(), 2);
    }

    #[test]
    fn test_no_result_slices_returns_none() {
        let result = analyze_experiment_power_at(
            &traffic(&[("2026-10-17", [100.0, 100.0])]),
            14,
            &ExperimentAnalysis::default(),
            &["m1".to_string()],
            &[VariationSetting { weight: 0.5 }, VariationSetting { weight: 0.5 }],
            day("2026-10-18"),
            &PowerConfig::default(),
        );
        assert!(result.is_none());
    }
}
