#![no_main]

use interim_power::power::{parse_result, validate_result, ExperimentPowerRequest, PowerConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither parsing nor the calculation may panic on any input
        let _ = parse_result(input);

        if let Ok(request) = serde_json::from_str::<ExperimentPowerRequest>(input) {
            let today = chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
            if let Some(result) = request.analyze(today, &PowerConfig::default()) {
                assert!(validate_result(&result).is_ok());
            }
        }
    }
});
