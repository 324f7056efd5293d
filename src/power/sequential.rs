// Interval math shared by both testing regimes
//
// Sequential testing uses an always-valid confidence sequence from a normal
// mixture sequential probability ratio test (mSPRT):
//
//   rho  = sqrt((-2 ln a + ln(-2 ln a + 1)) / tau)
//   disc = 2 (n rho^2 + 1) ln(sqrt(n rho^2 + 1) / a) / (n rho)^2
//   halfwidth = sqrt(s2) * sqrt(disc)
//
// where tau is the mixture tuning parameter. Unlike a fixed-n interval the
// halfwidth stays valid under continuous monitoring.
//
// Fixed-horizon testing uses a conjugate-normal posterior variance instead.
// None of these functions guard against zero or negative inputs.

/// Mixture parameter of the confidence sequence
pub fn sequential_rho(alpha: f64, sequential_tuning_parameter: f64) -> f64 {
    let log_alpha = -2.0 * alpha.ln();
    ((log_alpha + (log_alpha + 1.0).ln()) / sequential_tuning_parameter).sqrt()
}

/// Discriminant of the confidence sequence at total sample size `n`
pub fn sequential_discriminant(n: f64, rho: f64, alpha: f64) -> f64 {
    let n_rho2 = n * rho.powi(2);
    (2.0 * (n_rho2 + 1.0) * ((n_rho2 + 1.0).sqrt() / alpha).ln()) / (n * rho).powi(2)
}

/// Halfwidth of the always-valid interval for variance `s2` after `n` units
pub fn sequential_interval_halfwidth(
    s2: f64,
    n: f64,
    sequential_tuning_parameter: f64,
    alpha: f64,
) -> f64 {
    let rho = sequential_rho(alpha, sequential_tuning_parameter);
    s2.sqrt() * sequential_discriminant(n, rho, alpha).sqrt()
}

/// Precision-weighted blend of the posterior variance with the data variance
/// projected onto `scaling_factor` times the first-period sample
///
/// `1 / (1 / sigma2_posterior + 1 / (sigmahat2_delta / scaling_factor))`.
/// Zero variances yield Infinity/NaN rather than an error.
pub fn final_posterior_variance(
    sigma2_posterior: f64,
    sigmahat2_delta: f64,
    scaling_factor: f64,
) -> f64 {
    1.0 / (1.0 / sigma2_posterior + 1.0 / (sigmahat2_delta / scaling_factor))
}
