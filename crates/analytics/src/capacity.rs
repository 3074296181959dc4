//! Capacity planning: utilization, compound load growth, bottlenecks and a
//! bucketed scaling plan.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use opsight_core::{CapacitySettings, MetricSnapshot, ServiceMetrics};

use crate::error::{AnalyticsError, AnalyticsResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    /// Response time relative to the maximum expected response time, capped at 100.
    pub response_time_pct: f64,
    /// Placeholder derived from `response_time_pct`.
    pub memory_pct: f64,
    /// Placeholder derived from `response_time_pct`.
    pub network_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadProjection {
    pub month: u32,
    pub load: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckKind {
    ResponseTime,
    Errors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub service: String,
    pub kind: BottleneckKind,
    pub severity: Severity,
    pub observed: f64,
    pub threshold: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingCategory {
    Infrastructure,
    Performance,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPlanEntry {
    pub action: String,
    pub category: ScalingCategory,
    pub timeline_weeks: WeekRange,
    pub cost: f64,
    /// Service the action targets; `None` for platform-wide entries.
    pub service: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalingPlan {
    pub immediate: Vec<ScalingPlanEntry>,
    pub short_term: Vec<ScalingPlanEntry>,
    pub long_term: Vec<ScalingPlanEntry>,
    pub total_cost: f64,
}

impl ScalingPlan {
    pub fn entries(&self) -> impl Iterator<Item = &ScalingPlanEntry> {
        self.immediate
            .iter()
            .chain(self.short_term.iter())
            .chain(self.long_term.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub utilization: Utilization,
    pub growth_rate_pct: f64,
    pub current_load: f64,
    pub load_projections: Vec<LoadProjection>,
    pub bottlenecks: Vec<Bottleneck>,
    pub scaling_plan: ScalingPlan,
    /// Months until utilization reaches 100%, never below 1.
    /// `None` when utilization is zero (capacity is never reached).
    pub time_to_capacity_months: Option<f64>,
}

impl CapacityReport {
    pub fn high_severity_count(&self) -> usize {
        self.bottlenecks
            .iter()
            .filter(|b| b.severity == Severity::High)
            .count()
    }
}

pub fn utilization(snapshot: &MetricSnapshot, settings: &CapacitySettings) -> Utilization {
    let response_time_pct = (snapshot.realtime.average_response_time_ms.max(0.0)
        / settings.max_expected_response_ms
        * 100.0)
        .min(100.0);
    Utilization {
        response_time_pct,
        memory_pct: (response_time_pct * settings.memory_factor).min(100.0),
        network_pct: (response_time_pct * settings.network_factor).min(100.0),
    }
}

/// Compound monthly growth: `load × (1 + rate)^n`.
pub fn project_load(current_load: f64, growth_rate_pct: f64, months: &[u32]) -> Vec<LoadProjection> {
    let rate = growth_rate_pct / 100.0;
    months
        .iter()
        .map(|&month| LoadProjection {
            month,
            load: current_load * (1.0 + rate).powi(month as i32),
        })
        .collect()
}

pub fn detect_bottlenecks(services: &[ServiceMetrics], settings: &CapacitySettings) -> Vec<Bottleneck> {
    let mut out = Vec::new();
    for s in services {
        if s.response_time_ms > settings.bottleneck_response_ms {
            out.push(Bottleneck {
                service: s.name.clone(),
                kind: BottleneckKind::ResponseTime,
                severity: Severity::High,
                observed: s.response_time_ms,
                threshold: settings.bottleneck_response_ms,
            });
        }
        if s.error_count > settings.bottleneck_error_count {
            out.push(Bottleneck {
                service: s.name.clone(),
                kind: BottleneckKind::Errors,
                severity: Severity::Medium,
                observed: s.error_count as f64,
                threshold: settings.bottleneck_error_count as f64,
            });
        }
    }
    out
}

/// `(100 − u) / (growth × u / 100)`, floored at one month.
/// `None` when capacity is never reached or the estimate overflows.
pub fn time_to_capacity(utilization_pct: f64, growth_rate_pct: f64) -> Option<f64> {
    let monthly_increase = growth_rate_pct * utilization_pct / 100.0;
    if monthly_increase <= 0.0 || !monthly_increase.is_finite() {
        return None;
    }
    let months = (100.0 - utilization_pct) / monthly_increase;
    if !months.is_finite() {
        return None;
    }
    Some(months.max(1.0))
}

fn scaling_entry(b: &Bottleneck, settings: &CapacitySettings) -> ScalingPlanEntry {
    let (action, category) = match b.kind {
        BottleneckKind::ResponseTime => (
            format!(
                "Scale out {} to bring response time ({:.0} ms) under {:.0} ms",
                b.service, b.observed, b.threshold
            ),
            ScalingCategory::Infrastructure,
        ),
        BottleneckKind::Errors => (
            format!(
                "Stabilize {}: {} errors exceed the {} error budget",
                b.service, b.observed, b.threshold
            ),
            ScalingCategory::Performance,
        ),
    };

    match b.severity {
        Severity::High => ScalingPlanEntry {
            action,
            category,
            timeline_weeks: WeekRange { min: 1, max: 2 },
            cost: settings.immediate_action_cost,
            service: Some(b.service.clone()),
        },
        Severity::Medium => ScalingPlanEntry {
            action,
            category,
            timeline_weeks: WeekRange { min: 4, max: 6 },
            cost: settings.short_term_action_cost,
            service: Some(b.service.clone()),
        },
    }
}

pub fn scaling_plan(
    bottlenecks: &[Bottleneck],
    time_to_capacity_months: Option<f64>,
    settings: &CapacitySettings,
) -> ScalingPlan {
    let mut plan = ScalingPlan::default();

    for b in bottlenecks {
        let entry = scaling_entry(b, settings);
        match b.severity {
            Severity::High => plan.immediate.push(entry),
            Severity::Medium => plan.short_term.push(entry),
        }
    }

    if let Some(months) = time_to_capacity_months.filter(|m| *m <= settings.long_term_horizon_months) {
        plan.long_term.push(ScalingPlanEntry {
            action: format!("Provision additional capacity ahead of projected saturation in {months:.1} month(s)"),
            category: ScalingCategory::Infrastructure,
            timeline_weeks: WeekRange { min: 8, max: 12 },
            cost: settings.long_term_action_cost,
            service: None,
        });
    }

    plan.total_cost = plan.entries().map(|e| e.cost).sum();
    plan
}

/// Analyze capacity for one snapshot and its reporting services.
pub fn analyze_capacity(
    snapshot: &MetricSnapshot,
    services: &[ServiceMetrics],
    growth_rate_pct: f64,
    settings: &CapacitySettings,
) -> AnalyticsResult<CapacityReport> {
    if !(growth_rate_pct.is_finite() && growth_rate_pct > 0.0) {
        return Err(AnalyticsError::invalid_config(format!(
            "growth_rate_pct must be a finite positive number (got {growth_rate_pct})"
        )));
    }

    let utilization = utilization(snapshot, settings);
    let current_load = snapshot.realtime.throughput_per_minute.max(0.0);
    let load_projections = project_load(current_load, growth_rate_pct, &settings.projection_months);
    let bottlenecks = detect_bottlenecks(services, settings);
    let time_to_capacity_months = time_to_capacity(utilization.response_time_pct, growth_rate_pct);
    let scaling_plan = scaling_plan(&bottlenecks, time_to_capacity_months, settings);

    if !bottlenecks.is_empty() {
        info!(
            bottlenecks = bottlenecks.len(),
            scaling_cost = scaling_plan.total_cost,
            "capacity bottlenecks detected"
        );
    }
    debug!(
        utilization = utilization.response_time_pct,
        ?time_to_capacity_months,
        "capacity analyzed"
    );

    Ok(CapacityReport {
        utilization,
        growth_rate_pct,
        current_load,
        load_projections,
        bottlenecks,
        scaling_plan,
        time_to_capacity_months,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::tests::snapshot;
    use proptest::prelude::*;

    fn settings() -> CapacitySettings {
        CapacitySettings::default()
    }

    #[test]
    fn slow_and_failing_service_yields_two_bottlenecks() {
        let services = vec![ServiceMetrics::new("billing", 3500.0, 15)];
        let report = analyze_capacity(&snapshot(0, 100.0, 1.0), &services, 20.0, &settings()).unwrap();

        assert_eq!(report.bottlenecks.len(), 2);
        assert_eq!(report.bottlenecks[0].kind, BottleneckKind::ResponseTime);
        assert_eq!(report.bottlenecks[0].severity, Severity::High);
        assert_eq!(report.bottlenecks[1].kind, BottleneckKind::Errors);
        assert_eq!(report.bottlenecks[1].severity, Severity::Medium);

        let plan = &report.scaling_plan;
        assert_eq!(plan.immediate.len(), 1);
        assert_eq!(plan.short_term.len(), 1);
        assert_eq!(plan.immediate[0].cost, 500.0);
        assert_eq!(plan.immediate[0].timeline_weeks, WeekRange { min: 1, max: 2 });
        assert_eq!(plan.short_term[0].cost, 1000.0);
        assert_eq!(plan.short_term[0].timeline_weeks, WeekRange { min: 4, max: 6 });
    }

    #[test]
    fn thresholds_are_exclusive() {
        let services = vec![ServiceMetrics::new("edge", 3000.0, 10)];
        assert!(detect_bottlenecks(&services, &settings()).is_empty());
    }

    #[test]
    fn utilization_is_capped() {
        let mut snap = snapshot(0, 1.0, 0.0);
        snap.realtime.average_response_time_ms = 9000.0;
        let u = utilization(&snap, &settings());
        assert_eq!(u.response_time_pct, 100.0);
        assert_eq!(u.memory_pct, 80.0);
        assert_eq!(u.network_pct, 60.0);
    }

    #[test]
    fn load_grows_by_compound_rate() {
        let p = project_load(100.0, 20.0, &[1, 3, 6, 12]);
        assert_eq!(p.len(), 4);
        assert!((p[0].load - 120.0).abs() < 1e-9);
        assert!((p[1].load - 172.8).abs() < 1e-9);
        assert!((p[3].load - 100.0 * 1.2f64.powi(12)).abs() < 1e-6);
    }

    #[test]
    fn time_to_capacity_formula_and_floor() {
        // 1500 ms / 5000 ms = 30% utilization; 70 / (20 * 0.3) ≈ 11.67 months.
        assert!((time_to_capacity(30.0, 20.0).unwrap() - 70.0 / 6.0).abs() < 1e-9);
        assert_eq!(time_to_capacity(100.0, 20.0), Some(1.0));
        assert_eq!(time_to_capacity(95.0, 50.0), Some(1.0));
        assert_eq!(time_to_capacity(0.0, 20.0), None);
    }

    #[test]
    fn subnormal_utilization_never_reports_infinite_months() {
        let estimate = time_to_capacity(1e-310, 20.0);
        assert_eq!(estimate, None);
    }

    #[test]
    fn near_saturation_adds_long_term_entry_and_sums_cost() {
        let services = vec![ServiceMetrics::new("api", 3500.0, 0)];
        let report = analyze_capacity(&snapshot(0, 100.0, 1.0), &services, 20.0, &settings()).unwrap();
        // 1500 ms → ~11.7 months to capacity, within the 12-month horizon.
        assert_eq!(report.scaling_plan.long_term.len(), 1);
        assert_eq!(report.scaling_plan.total_cost, 500.0 + 5000.0);
    }

    #[test]
    fn non_positive_growth_rate_is_rejected() {
        for rate in [0.0, -10.0, f64::NAN] {
            let err = analyze_capacity(&snapshot(0, 1.0, 0.0), &[], rate, &settings()).unwrap_err();
            assert!(matches!(err, AnalyticsError::InvalidConfiguration(_)));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: time to capacity is at least one month whenever defined.
        #[test]
        fn time_to_capacity_is_at_least_one_month(
            response_ms in 0.0f64..20_000.0,
            growth in 0.01f64..500.0,
        ) {
            let mut snap = snapshot(0, 1.0, 0.0);
            snap.realtime.average_response_time_ms = response_ms;
            let report = analyze_capacity(&snap, &[], growth, &settings()).unwrap();
            if let Some(m) = report.time_to_capacity_months {
                prop_assert!(m >= 1.0);
                prop_assert!(m.is_finite());
            } else {
                prop_assert_eq!(report.utilization.response_time_pct, 0.0);
            }
        }
    }
}
