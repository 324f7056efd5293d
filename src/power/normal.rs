// Standard normal primitives backed by statrs
//
// statrs panics on probabilities outside [0, 1]; these wrappers return NaN
// instead so that bad inputs surface at the schema check, not as a panic.

use statrs::distribution::{ContinuousCDF, Normal};

/// Inverse CDF: the `x` with `P(X <= x) = p` for `X ~ N(mean, sd^2)`
///
/// Returns `-inf` at `p = 0`, `+inf` at `p = 1` and NaN for `p` outside
/// `[0, 1]`, NaN `p`, or a non-positive `sd`.
pub fn normal_quantile(p: f64, mean: f64, sd: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    match Normal::new(mean, sd) {
        Ok(normal) => normal.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

/// CDF of `N(mean, sd^2)` at `x`
pub fn normal_cdf(x: f64, mean: f64, sd: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    match Normal::new(mean, sd) {
        Ok(normal) => normal.cdf(x),
        Err(_) => f64::NAN,
    }
}
