//! Horizon projection and scenario generation.
//!
//! A trend's `change` is the difference between two adjacent window
//! averages. It is converted to a per-day delta with the series cadence
//! (`samples_per_day / window`) and extrapolated linearly to the horizon.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use opsight_core::{EngineConfig, MetricKind, MetricSeries};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::trend::{Confidence, TrendResult, analyze_trend};

/// Horizon (days) past which low-confidence forecasts are flagged unreliable.
const RELIABLE_HORIZON_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub metric: MetricKind,
    pub horizon_days: u32,
    /// Projected value, never negative.
    pub value: f64,
    pub change_from_current: f64,
    /// Relative uncertainty; grows with horizon and is not capped.
    pub uncertainty: f64,
    pub confidence: Confidence,
    /// Low-confidence input projected past 90 days.
    pub unreliable: bool,
}

fn base_uncertainty(confidence: Confidence) -> f64 {
    match confidence {
        Confidence::High => 0.1,
        Confidence::Medium => 0.2,
        Confidence::Low => 0.4,
    }
}

/// Per-day delta implied by a window-over-window change.
pub fn daily_delta(trend: &TrendResult, config: &EngineConfig) -> f64 {
    let window = config.trend.window.max(1) as f64;
    trend.change * f64::from(config.forecast.samples_per_day) / window
}

/// Project one trend `horizon_days` into the future.
pub fn project(trend: &TrendResult, horizon_days: u32, config: &EngineConfig) -> AnalyticsResult<ForecastResult> {
    if horizon_days == 0 {
        return Err(AnalyticsError::invalid_config("horizon_days must be > 0"));
    }

    let projected = trend.current + daily_delta(trend, config) * f64::from(horizon_days);
    let value = projected.max(0.0);
    let uncertainty = base_uncertainty(trend.confidence) * (1.0 + f64::from(horizon_days) / 90.0);
    let unreliable = trend.confidence == Confidence::Low && horizon_days > RELIABLE_HORIZON_DAYS;

    if unreliable {
        warn!(
            metric = %trend.metric,
            horizon_days,
            uncertainty,
            "low-confidence trend projected past reliable horizon"
        );
    }

    Ok(ForecastResult {
        metric: trend.metric,
        horizon_days,
        value,
        change_from_current: value - trend.current,
        uncertainty,
        confidence: trend.confidence,
        unreliable,
    })
}

/// Project every trend at every horizon, ordered by metric then horizon.
pub fn forecast_horizons(
    trends: &BTreeMap<MetricKind, TrendResult>,
    horizons_days: &[u32],
    config: &EngineConfig,
) -> AnalyticsResult<Vec<ForecastResult>> {
    let mut out = Vec::with_capacity(trends.len() * horizons_days.len());
    for trend in trends.values() {
        for &h in horizons_days {
            out.push(project(trend, h, config)?);
        }
    }
    Ok(out)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Optimistic,
    Realistic,
    Pessimistic,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Optimistic,
        ScenarioKind::Realistic,
        ScenarioKind::Pessimistic,
    ];

    /// Multipliers applied to the realistic projection, as
    /// `(throughput, response_time, error_rate)`.
    ///
    /// Lower is better for latency and errors, so optimistic shrinks them.
    /// Historical reports depend on these exact factors.
    pub fn multipliers(&self) -> (f64, f64, f64) {
        match self {
            ScenarioKind::Optimistic => (1.2, 0.8, 0.5),
            ScenarioKind::Realistic => (1.0, 1.0, 1.0),
            ScenarioKind::Pessimistic => (0.8, 1.3, 1.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioForecast {
    pub kind: ScenarioKind,
    pub horizon_days: u32,
    pub throughput_per_minute: f64,
    pub average_response_time_ms: f64,
    pub error_rate_pct: f64,
}

struct RealisticBase {
    throughput: ForecastResult,
    response_time: ForecastResult,
    error_rate: ForecastResult,
}

fn realistic_base(series: &MetricSeries, horizon_days: u32, config: &EngineConfig) -> AnalyticsResult<RealisticBase> {
    let p = |m: MetricKind| project(&analyze_trend(series, m, &config.trend), horizon_days, config);
    Ok(RealisticBase {
        throughput: p(MetricKind::Throughput)?,
        response_time: p(MetricKind::AverageResponseTime)?,
        error_rate: p(MetricKind::ErrorRate)?,
    })
}

fn scale(base: &RealisticBase, kind: ScenarioKind, horizon_days: u32) -> ScenarioForecast {
    let (tp, rt, er) = kind.multipliers();
    ScenarioForecast {
        kind,
        horizon_days,
        throughput_per_minute: base.throughput.value * tp,
        average_response_time_ms: base.response_time.value * rt,
        error_rate_pct: base.error_rate.value * er,
    }
}

pub fn generate_scenario(
    series: &MetricSeries,
    horizon_days: u32,
    kind: ScenarioKind,
    config: &EngineConfig,
) -> AnalyticsResult<ScenarioForecast> {
    let base = realistic_base(series, horizon_days, config)?;
    Ok(scale(&base, kind, horizon_days))
}

/// All three scenarios from a single set of realistic projections.
pub fn generate_scenarios(
    series: &MetricSeries,
    horizon_days: u32,
    config: &EngineConfig,
) -> AnalyticsResult<Vec<ScenarioForecast>> {
    let base = realistic_base(series, horizon_days, config)?;
    Ok(ScenarioKind::ALL
        .iter()
        .map(|&k| scale(&base, k, horizon_days))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendDirection;
    use crate::trend::tests::snapshot;
    use proptest::prelude::*;

    fn trend(current: f64, change: f64, confidence: Confidence) -> TrendResult {
        TrendResult {
            metric: MetricKind::Throughput,
            current,
            previous: current - change,
            change,
            change_percent: 0.0,
            direction: TrendDirection::Stable,
            confidence,
            samples: 48,
        }
    }

    #[test]
    fn projects_daily_delta_linearly() {
        let f = project(&trend(100.0, 2.0, Confidence::High), 30, &EngineConfig::default()).unwrap();
        assert_eq!(f.value, 160.0);
        assert_eq!(f.change_from_current, 60.0);
        assert!((f.uncertainty - 0.1 * (1.0 + 30.0 / 90.0)).abs() < 1e-12);
        assert!(!f.unreliable);
    }

    #[test]
    fn cadence_rescales_window_delta() {
        let mut cfg = EngineConfig::default();
        // 12 samples per window at hourly cadence: a window is half a day.
        cfg.trend.window = 12;
        let f = project(&trend(100.0, 1.0, Confidence::High), 10, &cfg).unwrap();
        assert_eq!(f.value, 120.0);
    }

    #[test]
    fn falling_metric_floors_at_zero() {
        let f = project(&trend(10.0, -5.0, Confidence::Medium), 90, &EngineConfig::default()).unwrap();
        assert_eq!(f.value, 0.0);
        assert_eq!(f.change_from_current, -10.0);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = project(&trend(1.0, 1.0, Confidence::High), 0, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidConfiguration(_)));
    }

    #[test]
    fn long_low_confidence_forecast_is_flagged_and_uncapped() {
        let f = project(&trend(1.0, 0.0, Confidence::Low), 365, &EngineConfig::default()).unwrap();
        assert!(f.unreliable);
        assert!((f.uncertainty - 0.4 * (1.0 + 365.0 / 90.0)).abs() < 1e-12);
        assert!(f.uncertainty > 1.0);
    }

    #[test]
    fn scenarios_apply_exact_multipliers() {
        let snaps: Vec<_> = (0..48).map(|i| snapshot(i, 600.0, 2.0)).collect();
        let series = MetricSeries::new(snaps).unwrap();
        let cfg = EngineConfig::default();

        let scenarios = generate_scenarios(&series, 90, &cfg).unwrap();
        assert_eq!(scenarios.len(), 3);

        let realistic = generate_scenario(&series, 90, ScenarioKind::Realistic, &cfg).unwrap();
        assert_eq!(realistic.throughput_per_minute, 10.0);
        assert_eq!(realistic.average_response_time_ms, 1500.0);
        assert_eq!(realistic.error_rate_pct, 2.0);

        let optimistic = &scenarios[0];
        assert_eq!(optimistic.kind, ScenarioKind::Optimistic);
        assert!((optimistic.throughput_per_minute - 12.0).abs() < 1e-9);
        assert!((optimistic.average_response_time_ms - 1200.0).abs() < 1e-9);
        assert!((optimistic.error_rate_pct - 1.0).abs() < 1e-9);

        let pessimistic = &scenarios[2];
        assert!((pessimistic.throughput_per_minute - 8.0).abs() < 1e-9);
        assert!((pessimistic.average_response_time_ms - 1950.0).abs() < 1e-9);
        assert!((pessimistic.error_rate_pct - 3.0).abs() < 1e-9);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: projected values are never negative.
        #[test]
        fn forecast_is_never_negative(
            current in 0.0f64..1e6,
            change in -1e5f64..1e5,
            horizon in 1u32..3650,
        ) {
            for c in [Confidence::High, Confidence::Medium, Confidence::Low] {
                let f = project(&trend(current, change, c), horizon, &EngineConfig::default()).unwrap();
                prop_assert!(f.value >= 0.0);
                prop_assert!(f.uncertainty > 0.0);
            }
        }
    }
}
