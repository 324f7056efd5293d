// Human-readable rendering of an aggregate power result

use crate::power::types::{MetricVariationPowerResult, MidExperimentPowerCalculationResult};

fn format_metric_line(result: &MetricVariationPowerResult) -> String {
    if let Some(message) = &result.error_message {
        return format!(
            "  {} (variation {}): error: {}\n",
            result.metric_id, result.variation, message
        );
    }

    match (result.power, result.additional_days_needed) {
        (Some(power), Some(days)) => format!(
            "  {} (variation {}): power={:.1}%, effect_size={}, days={}{}\n",
            result.metric_id,
            result.variation,
            power * 100.0,
            result
                .effect_size
                .map_or_else(|| "n/a".to_string(), |e| e.to_string()),
            days,
            if result.is_low_powered == Some(true) {
                " (low power)"
            } else {
                ""
            }
        ),
        _ => format!(
            "  {} (variation {}): no estimate\n",
            result.metric_id, result.variation
        ),
    }
}

impl MidExperimentPowerCalculationResult {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match self {
            Self::Success(success) => {
                if success.is_low_powered {
                    report.push_str("⚠️  LOW POWER\n\n");
                } else {
                    report.push_str("✅ POWER ESTIMATE AVAILABLE\n\n");
                }
                report.push_str(&format!("Power: {:.1}%\n", success.power * 100.0));
                report.push_str(&format!(
                    "Additional days needed: {}\n",
                    success.additional_days_needed
                ));
            }
            Self::Error(error) => {
                report.push_str("❌ POWER ESTIMATE UNAVAILABLE\n\n");
                report.push_str("Too many metric/variation pairs failed to compute power\n");
                if error.is_low_powered {
                    report.push_str("Low power warning: yes\n");
                }
            }
        }

        let results = self.metric_variation_power_results();
        if !results.is_empty() {
            report.push_str(&format!(
                "\n📊 Metric/variation results ({}):\n",
                results.len()
            ));
            for result in results {
                report.push_str(&format_metric_line(result));
            }
        }

        report
    }
}
