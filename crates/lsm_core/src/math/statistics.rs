//! Sample statistics for Monte Carlo estimators.
//!
//! Undefined statistics (mean of an empty sample, variance of fewer than two
//! observations) are returned as `NaN` rather than panicking.

/// Arithmetic mean; `NaN` for an empty sample.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (divisor `n - 1`); `NaN` for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / (n - 1) as f64
}

/// Standard error of the mean, `sqrt(s² / n)`.
///
/// # Examples
///
/// ```
/// use lsm_core::math::statistics::standard_error;
///
/// // s² = 5/3 over four observations
/// let se = standard_error(&[1.0, 2.0, 3.0, 4.0]);
/// assert!((se - (5.0_f64 / 12.0).sqrt()).abs() < 1e-12);
/// assert!(standard_error(&[1.0]).is_nan());
/// ```
#[inline]
pub fn standard_error(values: &[f64]) -> f64 {
    (sample_variance(values) / values.len() as f64).sqrt()
}

/// Mean and standard error in a single call.
#[inline]
pub fn mean_and_standard_error(values: &[f64]) -> (f64, f64) {
    (mean(values), standard_error(values))
}
