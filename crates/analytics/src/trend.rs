//! Window-over-window trend detection.
//!
//! Model:
//! - Take the most recent `2 × window` samples of a metric.
//! - Average the earlier and the recent half.
//! - Classify the percent change against a stability band.
//! - Derive confidence from the dispersion (`variance / mean²`) of the
//!   compared samples.
//!
//! Series shorter than two windows degrade to `stable` / `low` instead of
//! failing: a partial answer is still useful to callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use opsight_core::{MetricKind, MetricSeries, TrendSettings};

use crate::stats::{dispersion, mean, ratio};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Trend of one metric across two adjacent windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub metric: MetricKind,
    /// Average of the recent window.
    pub current: f64,
    /// Average of the earlier window.
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub direction: TrendDirection,
    pub confidence: Confidence,
    /// Samples the judgment was based on (`2 × window`, or the whole series
    /// when it was too short).
    pub samples: usize,
}

impl TrendResult {
    /// Whether the metric is moving in the direction that makes it worse.
    pub fn is_worsening(&self) -> bool {
        match self.direction {
            TrendDirection::Stable => false,
            TrendDirection::Increasing => !self.metric.higher_is_better(),
            TrendDirection::Decreasing => self.metric.higher_is_better(),
        }
    }
}

pub fn classify_direction(change_percent: f64, stable_threshold_pct: f64) -> TrendDirection {
    if change_percent.abs() <= stable_threshold_pct {
        TrendDirection::Stable
    } else if change_percent > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    }
}

pub fn classify_confidence(dispersion: f64, settings: &TrendSettings) -> Confidence {
    if dispersion < settings.high_confidence_cv {
        Confidence::High
    } else if dispersion < settings.medium_confidence_cv {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Analyze one metric of a chronologically ordered series.
pub fn analyze_trend(series: &MetricSeries, metric: MetricKind, settings: &TrendSettings) -> TrendResult {
    let values = series.values(metric);
    let window = settings.window.max(1);
    let needed = window * 2;

    if values.len() < needed {
        let latest = series.latest().value(metric);
        warn!(
            metric = %metric,
            available = values.len(),
            required = needed,
            "insufficient samples for trend; reporting stable/low"
        );
        return TrendResult {
            metric,
            current: latest,
            previous: latest,
            change: 0.0,
            change_percent: 0.0,
            direction: TrendDirection::Stable,
            confidence: Confidence::Low,
            samples: values.len(),
        };
    }

    let compared = &values[values.len() - needed..];
    let (earlier, recent) = compared.split_at(window);

    let previous = mean(earlier);
    let current = mean(recent);
    let change = current - previous;
    // Zero baseline: no meaningful percentage, report no change.
    let change_percent = ratio(change, previous, "trend change percent")
        .map(|r| r * 100.0)
        .unwrap_or(0.0);

    let direction = classify_direction(change_percent, settings.stable_threshold_pct);
    let confidence = classify_confidence(dispersion(compared), settings);

    debug!(
        metric = %metric,
        previous,
        current,
        change_percent,
        ?direction,
        ?confidence,
        "trend computed"
    );

    TrendResult {
        metric,
        current,
        previous,
        change,
        change_percent,
        direction,
        confidence,
        samples: needed,
    }
}

/// Analyze every tracked metric.
pub fn analyze_all(series: &MetricSeries, settings: &TrendSettings) -> BTreeMap<MetricKind, TrendResult> {
    MetricKind::ALL
        .iter()
        .map(|&m| (m, analyze_trend(series, m, settings)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use opsight_core::{BusinessMetrics, MetricSnapshot, RealtimeMetrics};
    use proptest::prelude::*;

    pub(crate) fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    pub(crate) fn snapshot(hour: i64, completed: f64, error_rate: f64) -> MetricSnapshot {
        MetricSnapshot::new(
            at(hour),
            RealtimeMetrics {
                completed_workflows: completed,
                failed_workflows: 1.0,
                average_response_time_ms: 1500.0,
                throughput_per_minute: completed / 60.0,
                error_rate_pct: error_rate,
                service_health_pct: 99.0,
            },
            BusinessMetrics {
                quality_score: 92.0,
                estimated_cost_savings: 1000.0,
                roi_pct: 150.0,
                client_satisfaction_pct: 88.0,
            },
        )
    }

    fn series_of(values: &[f64]) -> MetricSeries {
        MetricSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| snapshot(i as i64, *v, 3.0))
                .collect(),
        )
        .unwrap()
    }

    fn linear_series() -> MetricSeries {
        let values: Vec<f64> = (0..48).map(|i| 20.0 + 40.0 * (i as f64) / 47.0).collect();
        series_of(&values)
    }

    #[test]
    fn rising_workflows_are_increasing_and_flat_error_rate_is_stable() {
        let series = linear_series();
        let settings = TrendSettings::default();

        let completed = analyze_trend(&series, MetricKind::CompletedWorkflows, &settings);
        assert_eq!(completed.direction, TrendDirection::Increasing);
        assert!(completed.change > 0.0);
        assert_eq!(completed.samples, 48);

        let errors = analyze_trend(&series, MetricKind::ErrorRate, &settings);
        assert_eq!(errors.direction, TrendDirection::Stable);
        assert_eq!(errors.change_percent, 0.0);
        assert_eq!(errors.confidence, Confidence::High);
    }

    #[test]
    fn short_series_degrades_to_stable_low() {
        let series = series_of(&[1.0, 100.0, 1000.0]);
        let trend = analyze_trend(&series, MetricKind::CompletedWorkflows, &TrendSettings::default());
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.confidence, Confidence::Low);
        assert_eq!(trend.current, 1000.0);
        assert_eq!(trend.samples, 3);
    }

    #[test]
    fn zero_baseline_yields_zero_percent() {
        let mut values = vec![0.0; 24];
        values.extend(std::iter::repeat_n(10.0, 24));
        let trend = analyze_trend(&series_of(&values), MetricKind::CompletedWorkflows, &TrendSettings::default());
        assert_eq!(trend.change_percent, 0.0);
        assert_eq!(trend.change, 10.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn only_the_latest_two_windows_are_compared() {
        let mut values = vec![1000.0; 10];
        values.extend(std::iter::repeat_n(50.0, 48));
        let trend = analyze_trend(&series_of(&values), MetricKind::CompletedWorkflows, &TrendSettings::default());
        assert_eq!(trend.previous, 50.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn noisy_windows_have_low_confidence() {
        let values: Vec<f64> = (0..48).map(|i| if i % 2 == 0 { 1.0 } else { 100.0 }).collect();
        let trend = analyze_trend(&series_of(&values), MetricKind::CompletedWorkflows, &TrendSettings::default());
        assert_eq!(trend.confidence, Confidence::Low);
    }

    #[test]
    fn moderate_spread_has_medium_confidence() {
        // alternating 60/140: variance / mean² = (80 / 200)² = 0.16
        let values: Vec<f64> = (0..48).map(|i| if i % 2 == 0 { 60.0 } else { 140.0 }).collect();
        let trend = analyze_trend(&series_of(&values), MetricKind::CompletedWorkflows, &TrendSettings::default());
        assert_eq!(trend.confidence, Confidence::Medium);
    }

    #[test]
    fn confidence_bands_are_lower_inclusive() {
        let settings = TrendSettings::default();
        assert_eq!(classify_confidence(0.099, &settings), Confidence::High);
        assert_eq!(classify_confidence(0.1, &settings), Confidence::Medium);
        assert_eq!(classify_confidence(0.299, &settings), Confidence::Medium);
        assert_eq!(classify_confidence(0.3, &settings), Confidence::Low);
    }

    #[test]
    fn two_full_windows_are_required() {
        let settings = TrendSettings::default();
        let values: Vec<f64> = (0..48).map(|i| 20.0 + i as f64).collect();

        let short = analyze_trend(&series_of(&values[..47]), MetricKind::CompletedWorkflows, &settings);
        assert_eq!(short.samples, 47);
        assert_eq!(short.direction, TrendDirection::Stable);
        assert_eq!(short.confidence, Confidence::Low);
        assert_eq!(short.change, 0.0);

        let full = analyze_trend(&series_of(&values), MetricKind::CompletedWorkflows, &settings);
        assert_eq!(full.samples, 48);
        assert_eq!(full.direction, TrendDirection::Increasing);
        assert_eq!(full.change, 24.0);
    }

    #[test]
    fn worsening_depends_on_metric_polarity() {
        let mut t = analyze_trend(&linear_series(), MetricKind::CompletedWorkflows, &TrendSettings::default());
        assert!(!t.is_worsening());
        t.metric = MetricKind::AverageResponseTime;
        assert!(t.is_worsening());
    }

    #[test]
    fn analyze_all_covers_every_metric() {
        let trends = analyze_all(&linear_series(), &TrendSettings::default());
        assert_eq!(trends.len(), MetricKind::ALL.len());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: direction follows the stability band exactly.
        #[test]
        fn direction_matches_threshold(cp in -1000.0f64..1000.0) {
            let d = classify_direction(cp, 5.0);
            if cp.abs() <= 5.0 {
                prop_assert_eq!(d, TrendDirection::Stable);
            } else if cp > 5.0 {
                prop_assert_eq!(d, TrendDirection::Increasing);
            } else {
                prop_assert_eq!(d, TrendDirection::Decreasing);
            }
        }

        /// Property: window averages drive the reported percent change.
        #[test]
        fn two_level_series_reports_level_shift(earlier in 1.0f64..1000.0, recent in 0.0f64..1000.0) {
            let mut values = vec![earlier; 24];
            values.extend(std::iter::repeat_n(recent, 24));
            let trend = analyze_trend(&series_of(&values), MetricKind::CompletedWorkflows, &TrendSettings::default());
            let expected = (recent - earlier) / earlier * 100.0;
            prop_assert!((trend.change_percent - expected).abs() < 1e-6);
            prop_assert_eq!(trend.direction, classify_direction(trend.change_percent, 5.0));
            prop_assert!(trend.change_percent.is_finite());
        }
    }
}
