// Power for one metric x variation pair
//
// Projects the posterior forward by `days_remaining * new_daily_users` units
// and asks how likely the resulting interval is to exclude the target lift
// (two-tailed). Guard failures become error results; numeric trouble such as
// a zero variance is left to propagate as NaN/Infinity.

use crate::power::config::is_low_powered;
use crate::power::normal::{normal_cdf, normal_quantile};
use crate::power::sequential::{final_posterior_variance, sequential_interval_halfwidth};
use crate::power::types::{MetricVariationPowerResult, SinglePowerParams};

/// Estimate power for `metric_id` in `variation`
///
/// Guards are checked in a fixed order and the first failure wins:
/// missing response, non-positive days or users, upstream error message,
/// then each missing statistic.
///
/// # Example
/// ```
/// use interim_power::power::{
///     calculate_mid_experiment_power_single, MetricPowerResponse, SinglePowerParams,
/// };
///
/// let params = SinglePowerParams {
///     alpha: 0.05,
///     sequential: false,
///     sequential_tuning_parameter: 5000.0,
///     days_remaining: 14,
///     first_period_sample_size: 2000.0,
///     new_daily_users: 500.0,
///     num_goal_metrics: 1,
///     num_variations: 2,
///     variation: Some(MetricPowerResponse {
///         sigmahat2_delta: Some(100.0),
///         sigma2_posterior: Some(50.0),
///         delta_posterior: Some(5.0),
///         first_period_pairwise_sample_size: Some(1000.0),
///         target_lift: 10.0,
///         ..Default::default()
///     }),
/// };
///
/// let result = calculate_mid_experiment_power_single(&params, "revenue", 1);
/// let power = result.power.unwrap();
/// assert!(power > 0.0 && power < 1.0);
/// assert_eq!(result.additional_days_needed, Some(14.0));
/// ```
pub fn calculate_mid_experiment_power_single(
    params: &SinglePowerParams,
    metric_id: &str,
    variation: usize,
) -> MetricVariationPowerResult {
    let Some(response) = &params.variation else {
        return MetricVariationPowerResult::error(metric_id, variation, "Missing variation.");
    };

    if params.days_remaining <= 0 || params.new_daily_users <= 0.0 {
        return MetricVariationPowerResult::error(
            metric_id,
            variation,
            "Days remaining and new daily users must be greater than 0.",
        );
    }

    if let Some(message) = response.error_message.as_deref().filter(|m| !m.is_empty()) {
        return MetricVariationPowerResult::error(metric_id, variation, message);
    }

    let Some(sigmahat2_delta) = response.sigmahat2_delta else {
        return MetricVariationPowerResult::error(metric_id, variation, "Missing sigmahat2Delta.");
    };
    let Some(sigma2_posterior) = response.sigma2_posterior else {
        return MetricVariationPowerResult::error(metric_id, variation, "Missing sigma2Posterior.");
    };
    let Some(delta_posterior) = response.delta_posterior else {
        return MetricVariationPowerResult::error(metric_id, variation, "Missing deltaPosterior.");
    };
    let Some(first_period_pairwise_sample_size) = response.first_period_pairwise_sample_size
    else {
        return MetricVariationPowerResult::error(
            metric_id,
            variation,
            "Missing firstPeriodPairwiseSampleSize.",
        );
    };

    // Bonferroni over every non-baseline variation x goal metric
    let num_tests = (params.num_variations as f64 - 1.0) * params.num_goal_metrics as f64;
    let second_period_sample_size = params.days_remaining as f64 * params.new_daily_users;
    let scaling_factor = second_period_sample_size / params.first_period_sample_size;

    let halfwidth = if params.sequential {
        let s2 = sigmahat2_delta * first_period_pairwise_sample_size;
        let n_total = first_period_pairwise_sample_size * (scaling_factor + 1.0);
        sequential_interval_halfwidth(
            s2,
            n_total,
            params.sequential_tuning_parameter,
            params.alpha / num_tests,
        )
    } else {
        let z_star = normal_quantile(1.0 - 0.5 * params.alpha / num_tests, 0.0, 1.0);
        let v = final_posterior_variance(sigma2_posterior, sigmahat2_delta, scaling_factor);
        z_star * v.sqrt()
    };

    let projected_data_variance = sigmahat2_delta / scaling_factor;
    let marginal_variance = sigma2_posterior + projected_data_variance;
    let num1 = halfwidth * marginal_variance / sigma2_posterior;
    let num2 = projected_data_variance * delta_posterior / sigma2_posterior;
    let num3 = response.target_lift;
    let den = sigmahat2_delta.sqrt();

    let power_pos = 1.0 - normal_cdf((num1 - num2 - num3) / den, 0.0, 1.0);
    let power_neg = normal_cdf((-num1 - num2 - num3) / den, 0.0, 1.0);
    let total_power = power_pos + power_neg;

    let additional_users = (scaling_factor * params.first_period_sample_size).ceil();
    let additional_days_needed = (additional_users / params.new_daily_users).ceil();

    MetricVariationPowerResult {
        metric_id: metric_id.to_string(),
        variation,
        error_message: None,
        power: Some(total_power),
        effect_size: Some(response.target_lift),
        additional_days_needed: Some(additional_days_needed),
        is_low_powered: Some(is_low_powered(total_power)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::types::MetricPowerResponse;

    fn response() -> MetricPowerResponse {
        MetricPowerResponse {
            sigmahat2_delta: Some(100.0),
            sigma2_posterior: Some(50.0),
            delta_posterior: Some(5.0),
            first_period_pairwise_sample_size: Some(1000.0),
            target_lift: 10.0,
            ..Default::default()
        }
    }

    fn params() -> SinglePowerParams {
        SinglePowerParams {
            alpha: 0.05,
            sequential: false,
            sequential_tuning_parameter: 5000.0,
            days_remaining: 14,
            first_period_sample_size: 2000.0,
            new_daily_users: 500.0,
            num_goal_metrics: 1,
            num_variations: 2,
            variation: Some(response()),
        }
    }

    fn error_of(params: &SinglePowerParams) -> Option<String> {
        calculate_mid_experiment_power_single(params, "m", 1).error_message
    }

    #[test]
    fn test_fixed_horizon_reference_power() {
        let result = calculate_mid_experiment_power_single(&params(), "m", 1);
        let power = result.power.unwrap();
        assert!((power - 0.493_674).abs() < 1e-4, "power = {}", power);
        assert_eq!(result.effect_size, Some(10.0));
        assert_eq!(result.additional_days_needed, Some(14.0));
        assert_eq!(result.is_low_powered, Some(false));
        assert!(result.is_success());
    }

    #[test]
    fn test_sequential_reference_power() {
        let mut p = params();
        p.sequential = true;
        let power = calculate_mid_experiment_power_single(&p, "m", 1).power.unwrap();
        assert!((power - 0.167_791).abs() < 1e-4, "power = {}", power);
    }

    #[test]
    fn test_missing_variation() {
        let mut p = params();
        p.variation = None;
        assert_eq!(error_of(&p).as_deref(), Some("Missing variation."));
    }

    #[test]
    fn test_non_positive_days_or_users() {
        let expected = Some("Days remaining and new daily users must be greater than 0.");

        let mut p = params();
        p.days_remaining = 0;
        assert_eq!(error_of(&p).as_deref(), expected);

        let mut p = params();
        p.new_daily_users = -3.0;
        assert_eq!(error_of(&p).as_deref(), expected);
    }

    #[test]
    fn test_upstream_error_message_verbatim() {
        let mut p = params();
        p.variation.as_mut().unwrap().error_message = Some("prior too wide".to_string());
        assert_eq!(error_of(&p).as_deref(), Some("prior too wide"));
    }

    #[test]
    fn test_empty_upstream_error_message_is_ignored() {
        let mut p = params();
        p.variation.as_mut().unwrap().error_message = Some(String::new());
        assert!(error_of(&p).is_none());
    }

    #[test]
    fn test_missing_statistics_in_order() {
        let mut p = params();
        {
            let r = p.variation.as_mut().unwrap();
            r.sigmahat2_delta = None;
            r.sigma2_posterior = None;
            r.delta_posterior = None;
            r.first_period_pairwise_sample_size = None;
        }
        assert_eq!(error_of(&p).as_deref(), Some("Missing sigmahat2Delta."));

        p.variation.as_mut().unwrap().sigmahat2_delta = Some(100.0);
        assert_eq!(error_of(&p).as_deref(), Some("Missing sigma2Posterior."));

        p.variation.as_mut().unwrap().sigma2_posterior = Some(50.0);
        assert_eq!(error_of(&p).as_deref(), Some("Missing deltaPosterior."));

        p.variation.as_mut().unwrap().delta_posterior = Some(5.0);
        assert_eq!(
            error_of(&p).as_deref(),
            Some("Missing firstPeriodPairwiseSampleSize.")
        );
    }

    #[test]
    fn test_days_guard_beats_missing_statistics() {
        let mut p = params();
        p.days_remaining = -1;
        p.variation.as_mut().unwrap().sigmahat2_delta = None;
        assert_eq!(
            error_of(&p).as_deref(),
            Some("Days remaining and new daily users must be greater than 0.")
        );
    }

    #[test]
    fn test_upstream_error_beats_missing_statistics() {
        let mut p = params();
        let r = p.variation.as_mut().unwrap();
        r.error_message = Some("stats engine failed".to_string());
        r.sigma2_posterior = None;
        assert_eq!(error_of(&p).as_deref(), Some("stats engine failed"));
    }

    #[test]
    fn test_more_days_never_lowers_power() {
        let mut previous = 0.0;
        for days in [1, 3, 7, 14, 30, 60, 120] {
            let mut p = params();
            p.days_remaining = days;
            let power = calculate_mid_experiment_power_single(&p, "m", 1).power.unwrap();
            assert!(power >= previous, "days={} power={} < {}", days, power, previous);
            previous = power;
        }
    }

    #[test]
    fn test_more_comparisons_lower_power() {
        let mut p = params();
        p.num_goal_metrics = 10;
        let corrected = calculate_mid_experiment_power_single(&p, "m", 1).power.unwrap();
        let single = calculate_mid_experiment_power_single(&params(), "m", 1).power.unwrap();
        assert!(corrected < single);
    }

    #[test]
    fn test_additional_days_cover_projected_users() {
        let mut p = params();
        p.first_period_sample_size = 2048.0;
        p.days_remaining = 3;
        p.new_daily_users = 100.0;
        let result = calculate_mid_experiment_power_single(&p, "m", 1);
        // ceil(ceil(300 / 2048 * 2048) / 100)
        assert_eq!(result.additional_days_needed, Some(3.0));
    }

    #[test]
    fn test_zero_variance_propagates_instead_of_erroring() {
        let mut p = params();
        p.variation.as_mut().unwrap().sigma2_posterior = Some(0.0);
        let result = calculate_mid_experiment_power_single(&p, "m", 1);
        assert!(result.error_message.is_none());
        assert!(!result.power.unwrap().is_finite());
    }

    #[test]
    fn test_negative_lift_is_symmetric_without_drift() {
        let mut up = params();
        up.variation.as_mut().unwrap().delta_posterior = Some(0.0);
        let mut down = up.clone();
        down.variation.as_mut().unwrap().target_lift = -10.0;

        let power_up = calculate_mid_experiment_power_single(&up, "m", 1).power.unwrap();
        let power_down = calculate_mid_experiment_power_single(&down, "m", 1).power.unwrap();
        assert!((power_up - power_down).abs() < 1e-12);
    }
}
