//! Small deterministic numeric helpers shared by the analyzers.

use crate::error::{AnalyticsError, AnalyticsResult};

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

/// Population variance (n).
pub(crate) fn variance(xs: &[f64], mean: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter()
        .map(|x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / (xs.len() as f64)
}

/// Squared coefficient of variation (`variance / mean²`).
///
/// A zero mean yields `0` for a constant series and `+inf` otherwise, so the
/// caller's thresholds classify them as most and least stable respectively.
pub(crate) fn dispersion(xs: &[f64]) -> f64 {
    let m = mean(xs);
    let var = variance(xs, m);
    if m.abs() <= f64::EPSILON {
        return if var <= f64::EPSILON { 0.0 } else { f64::INFINITY };
    }
    var / (m * m)
}

/// `numerator / denominator`, refusing zero denominators and non-finite results.
pub(crate) fn ratio(numerator: f64, denominator: f64, what: &str) -> AnalyticsResult<f64> {
    if denominator == 0.0 {
        return Err(AnalyticsError::DegenerateArithmetic(format!("{what}: zero denominator")));
    }
    let r = numerator / denominator;
    if !r.is_finite() {
        return Err(AnalyticsError::DegenerateArithmetic(format!("{what}: non-finite result")));
    }
    Ok(r)
}
