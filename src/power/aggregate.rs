// Aggregate power across every non-baseline variation x goal metric
//
// Each variation is judged by its weakest metric (minimum power, maximum days
// needed); the experiment is then judged by its strongest variation. The
// aggregate is only reported as a success while fewer than MAX_FAILURE_RATIO
// of the metric x variation pairs failed.

use crate::power::config::{is_low_powered, MAX_FAILURE_RATIO};
use crate::power::single::calculate_mid_experiment_power_single;
use crate::power::types::{
    MetricVariationPowerResult, MidExperimentPowerCalculationResult, MidExperimentPowerError,
    MidExperimentPowerSuccess, PowerInput, PowerStatus, SinglePowerParams,
};


// min/max that let NaN win, so a corrupt metric poisons the aggregate
// instead of being silently skipped
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Compute power for all non-baseline variations and aggregate the verdict
///
/// The baseline (index 0) is never evaluated, even if metrics are attached
/// to it. A metric slot without stats counts as a failure but produces no
/// result row; an `unsuccessful` response counts as a failure and produces
/// an error row.
pub fn calculate_mid_experiment_power(settings: &PowerInput) -> MidExperimentPowerCalculationResult {
    let num_variations = settings.variation_weights.len();
    // (worst power, most days) per variation; None until a metric succeeds
    let mut worst_case_by_variation: Vec<Option<(f64, f64)>> = vec![None; num_variations];
    let mut metric_variation_power_results = Vec::new();
    let mut metric_variation_counter = 0_usize;
    let mut metric_variation_failure = 0_usize;

    for variation in 1..num_variations {
        let this_proportion_of_users =
            settings.variation_weights[0] + settings.variation_weights[variation];
        let this_new_daily_users = settings.new_daily_users * this_proportion_of_users;

        let mut worst_case: Option<(f64, f64)> = None;

        let metrics = settings
            .variations
            .get(variation)
            .map(|v| v.metrics.as_slice())
            .unwrap_or_default();

        for entry in metrics {
            metric_variation_counter += 1;

            let Some(response) = &entry.power else {
                metric_variation_failure += 1;
                continue;
            };

            if response.status == PowerStatus::Unsuccessful {
                metric_variation_failure += 1;
                metric_variation_power_results.push(MetricVariationPowerResult {
                    metric_id: entry.metric_id.clone(),
                    variation,
                    error_message: response.error_message.clone(),
                    power: None,
                    effect_size: Some(response.target_lift),
                    additional_days_needed: None,
                    is_low_powered: None,
                });
                continue;
            }

            let params = SinglePowerParams {
                alpha: settings.alpha,
                sequential: settings.sequential,
                sequential_tuning_parameter: settings.sequential_tuning_parameter,
                days_remaining: settings.days_remaining,
                first_period_sample_size: settings.first_period_sample_size,
                new_daily_users: this_new_daily_users,
                num_goal_metrics: settings.num_goal_metrics,
                num_variations,
                variation: Some(response.clone()),
            };
            let result = calculate_mid_experiment_power_single(&params, &entry.metric_id, variation);

            match (result.is_success(), result.power, result.additional_days_needed) {
                (true, Some(power), Some(days)) => {
                    worst_case = Some(match worst_case {
                        Some((min_power, max_days)) => {
                            (nan_min(min_power, power), nan_max(max_days, days))
                        }
                        None => (power, days),
                    });
                }
                _ => metric_variation_failure += 1,
            }
            metric_variation_power_results.push(result);
        }

        worst_case_by_variation[variation] = worst_case;
    }

    // Variations without a single successful metric have no estimate to offer
    let (max_power, min_days_needed) = worst_case_by_variation
        .iter()
        .skip(1)
        .flatten()
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(power, days), &(p, d)| {
            (nan_max(power, p), nan_min(days, d))
        });
    let low_power_warning = is_low_powered(max_power);

    // 0/0 is NaN, which fails the comparison: no metrics means an error
    let failure_ratio = metric_variation_failure as f64 / metric_variation_counter as f64;
    tracing::debug!(
        metric_variation_counter,
        metric_variation_failure,
        failure_ratio,
        max_power,
        min_days_needed,
        "aggregated mid-experiment power"
    );

    if failure_ratio < MAX_FAILURE_RATIO {
        MidExperimentPowerCalculationResult::Success(MidExperimentPowerSuccess {
            power: max_power,
            additional_days_needed: min_days_needed,
            is_low_powered: low_power_warning,
            metric_variation_power_results,
        })
    } else {
        MidExperimentPowerCalculationResult::Error(MidExperimentPowerError {
            is_low_powered: low_power_warning,
            metric_variation_power_results,
        })
    }
}
