//! Insight aggregation: benchmark classification, risks, overall health and
//! a prioritized, categorized action plan.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use opsight_core::{Benchmarks, MetricKind, MetricSnapshot};

use crate::capacity::{BottleneckKind, CapacityReport, Severity};
use crate::roi::RoiAnalysis;
use crate::trend::{Confidence, TrendResult};

const CAPACITY_RISK_MONTHS: f64 = 3.0;
const CAPACITY_PLANNING_MONTHS: f64 = 6.0;
const LOW_CONFIDENCE_SCORE: u32 = 70;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallHealth {
    Excellent,
    Good,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
}

impl OverallHealth {
    pub fn classify(concerns: usize, risks: usize) -> Self {
        if concerns == 0 && risks == 0 {
            OverallHealth::Excellent
        } else if concerns > 2 || risks > 1 {
            OverallHealth::NeedsAttention
        } else {
            OverallHealth::Good
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn weight(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Performance,
    Business,
    Strategic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub description: String,
    pub impact: String,
    pub timeframe_days: u32,
}

impl Recommendation {
    fn new(
        category: RecommendationCategory,
        priority: Priority,
        description: impl Into<String>,
        impact: impl Into<String>,
        timeframe_days: u32,
    ) -> Self {
        Self {
            category,
            priority,
            description: description.into(),
            impact: impact.into(),
            timeframe_days,
        }
    }
}

/// One classified observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub subject: String,
    pub detail: String,
}

impl Finding {
    fn new(subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    /// Due within 14 days.
    pub immediate: Vec<Recommendation>,
    /// Due within 60 days.
    pub short_term: Vec<Recommendation>,
    pub long_term: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub overall_health: OverallHealth,
    pub concerns: Vec<Finding>,
    pub strengths: Vec<Finding>,
    pub achievements: Vec<Finding>,
    pub risks: Vec<Finding>,
    /// Sorted by descending priority weight; ties keep insertion order.
    pub recommendations: Vec<Recommendation>,
    pub action_plan: ActionPlan,
}

/// Stable sort by descending priority weight.
pub fn sort_recommendations(recs: &mut [Recommendation]) {
    // `sort_by_key` is a stable sort: equal weights keep their relative order.
    recs.sort_by_key(|r| Reverse(r.priority.weight()));
}

pub fn build_action_plan(sorted: &[Recommendation]) -> ActionPlan {
    let mut plan = ActionPlan::default();
    for r in sorted {
        let bucket = match r.timeframe_days {
            0..=14 => &mut plan.immediate,
            15..=60 => &mut plan.short_term,
            _ => &mut plan.long_term,
        };
        bucket.push(r.clone());
    }
    plan
}

fn is_performance_metric(metric: MetricKind) -> bool {
    matches!(
        metric,
        MetricKind::CompletedWorkflows
            | MetricKind::FailedWorkflows
            | MetricKind::AverageResponseTime
            | MetricKind::Throughput
            | MetricKind::ErrorRate
            | MetricKind::ServiceHealth
    )
}

/// Trends moving the wrong way with at least medium confidence.
fn worsening_trends(trends: &BTreeMap<MetricKind, TrendResult>) -> impl Iterator<Item = &TrendResult> {
    trends
        .values()
        .filter(|t| t.is_worsening() && t.confidence != Confidence::Low)
}

struct Classification {
    concerns: Vec<Finding>,
    strengths: Vec<Finding>,
    achievements: Vec<Finding>,
}

fn classify(
    snapshot: &MetricSnapshot,
    trends: &BTreeMap<MetricKind, TrendResult>,
    roi: &RoiAnalysis,
    b: &Benchmarks,
) -> Classification {
    let mut c = Classification {
        concerns: Vec::new(),
        strengths: Vec::new(),
        achievements: Vec::new(),
    };
    let rt = snapshot.realtime.average_response_time_ms;
    let err = snapshot.realtime.error_rate_pct;
    let quality = snapshot.business.quality_score;

    if rt > b.target_response_time_ms {
        c.concerns.push(Finding::new(
            "response_time",
            format!("average response time {rt:.0} ms exceeds the {:.0} ms target", b.target_response_time_ms),
        ));
    } else {
        c.strengths.push(Finding::new(
            "response_time",
            format!("average response time {rt:.0} ms is within the {:.0} ms target", b.target_response_time_ms),
        ));
    }

    if err > b.target_error_rate_pct {
        c.concerns.push(Finding::new(
            "error_rate",
            format!("error rate {err:.2}% exceeds the {:.2}% target", b.target_error_rate_pct),
        ));
    } else {
        c.strengths.push(Finding::new(
            "error_rate",
            format!("error rate {err:.2}% is within the {:.2}% target", b.target_error_rate_pct),
        ));
    }

    if quality < b.target_quality_score {
        c.concerns.push(Finding::new(
            "quality",
            format!("quality score {quality:.1} is below the {:.1} target", b.target_quality_score),
        ));
    } else {
        c.achievements.push(Finding::new(
            "quality",
            format!("quality score {quality:.1} meets the {:.1} target", b.target_quality_score),
        ));
    }

    match roi.roi_pct {
        None => c.concerns.push(Finding::new("roi", "ROI is undefined: total investment is zero")),
        Some(v) if v < b.target_roi_pct => c.concerns.push(Finding::new(
            "roi",
            format!("ROI {v:.1}% is below the {:.1}% target", b.target_roi_pct),
        )),
        Some(v) => c.achievements.push(Finding::new(
            "roi",
            format!("ROI {v:.1}% ({}) meets the {:.1}% target", grade_label(roi), b.target_roi_pct),
        )),
    }

    for t in worsening_trends(trends) {
        c.concerns.push(Finding::new(
            t.metric.path(),
            format!("trending the wrong way ({:+.1}% window over window)", t.change_percent),
        ));
    }

    c
}

fn grade_label(roi: &RoiAnalysis) -> &'static str {
    roi.grade.map(|g| g.label()).unwrap_or("ungraded")
}

fn risks(roi: &RoiAnalysis, capacity: &CapacityReport) -> Vec<Finding> {
    let mut out = Vec::new();
    for b in capacity.bottlenecks.iter().filter(|b| b.severity == Severity::High) {
        out.push(Finding::new(
            b.service.clone(),
            format!("response time {:.0} ms over the {:.0} ms bottleneck threshold", b.observed, b.threshold),
        ));
    }
    if let Some(m) = capacity.time_to_capacity_months.filter(|m| *m < CAPACITY_RISK_MONTHS) {
        out.push(Finding::new(
            "capacity",
            format!("capacity projected to saturate in {m:.1} month(s)"),
        ));
    }
    if roi.payback.months.is_none() {
        out.push(Finding::new(
            "payback",
            "automation savings never recover the platform investment",
        ));
    }
    out
}

fn performance_recommendations(
    snapshot: &MetricSnapshot,
    trends: &BTreeMap<MetricKind, TrendResult>,
    capacity: &CapacityReport,
    b: &Benchmarks,
) -> Vec<Recommendation> {
    use RecommendationCategory::Performance;

    let mut out = Vec::new();
    let rt = snapshot.realtime.average_response_time_ms;
    let err = snapshot.realtime.error_rate_pct;

    if rt > b.target_response_time_ms {
        out.push(Recommendation::new(
            Performance,
            Priority::High,
            format!("Reduce average response time from {rt:.0} ms to under {:.0} ms", b.target_response_time_ms),
            "Faster workflow completion and lower infrastructure pressure",
            14,
        ));
    }
    if err > b.target_error_rate_pct {
        out.push(Recommendation::new(
            Performance,
            Priority::High,
            format!("Cut error rate from {err:.2}% to below {:.2}%", b.target_error_rate_pct),
            "Fewer failed workflows and less manual rework",
            7,
        ));
    }

    for bn in &capacity.bottlenecks {
        let rec = match bn.kind {
            BottleneckKind::ResponseTime => Recommendation::new(
                Performance,
                Priority::High,
                format!("Resolve the response-time bottleneck in {}", bn.service),
                "Removes the slowest hop from affected workflows",
                14,
            ),
            BottleneckKind::Errors => Recommendation::new(
                Performance,
                Priority::Medium,
                format!("Investigate the {:.0} errors reported by {}", bn.observed, bn.service),
                "Improves reliability of dependent workflows",
                30,
            ),
        };
        out.push(rec);
    }

    for t in worsening_trends(trends).filter(|t| is_performance_metric(t.metric)) {
        out.push(Recommendation::new(
            Performance,
            Priority::Medium,
            format!("Investigate the {} trend ({:+.1}%)", t.metric, t.change_percent),
            "Catches regressions before they breach targets",
            30,
        ));
    }

    out
}

fn business_recommendations(
    snapshot: &MetricSnapshot,
    trends: &BTreeMap<MetricKind, TrendResult>,
    roi: &RoiAnalysis,
    b: &Benchmarks,
) -> Vec<Recommendation> {
    use RecommendationCategory::Business;

    let mut out = Vec::new();
    let quality = snapshot.business.quality_score;

    if quality < b.target_quality_score {
        out.push(Recommendation::new(
            Business,
            Priority::Medium,
            format!("Raise quality score from {quality:.1} to {:.1}", b.target_quality_score),
            "Higher output quality and client satisfaction",
            30,
        ));
    }

    if roi.payback.months.is_none() {
        out.push(Recommendation::new(
            Business,
            Priority::High,
            "Rebalance platform costs: monthly savings do not cover running costs",
            "Makes the automation investment recoverable",
            30,
        ));
    }

    match roi.roi_pct {
        None => out.push(Recommendation::new(
            Business,
            Priority::Medium,
            "Review cost inputs: ROI is undefined without a recorded investment",
            "Restores a measurable return on the platform",
            30,
        )),
        Some(v) if v < b.target_roi_pct => out.push(Recommendation::new(
            Business,
            Priority::Medium,
            format!("Improve ROI from {v:.1}% toward {:.1}% by automating higher-value workflows", b.target_roi_pct),
            "Raises the return on existing platform spend",
            60,
        )),
        Some(_) => {}
    }

    for t in worsening_trends(trends).filter(|t| !is_performance_metric(t.metric)) {
        out.push(Recommendation::new(
            Business,
            Priority::Medium,
            format!("Review the {} trend ({:+.1}%)", t.metric, t.change_percent),
            "Protects business outcomes from a sustained decline",
            30,
        ));
    }

    out
}

fn strategic_recommendations(roi: &RoiAnalysis, capacity: &CapacityReport, b: &Benchmarks) -> Vec<Recommendation> {
    use RecommendationCategory::Strategic;

    let mut out = Vec::new();

    if let Some(m) = capacity
        .time_to_capacity_months
        .filter(|m| *m < CAPACITY_PLANNING_MONTHS)
    {
        out.push(Recommendation::new(
            Strategic,
            Priority::Medium,
            format!("Plan capacity expansion: saturation projected in {m:.1} month(s)"),
            format!(
                "Avoids degraded service; estimated scaling cost {:.0}",
                capacity.scaling_plan.total_cost
            ),
            60,
        ));
    }

    if let Some(v) = roi.roi_pct.filter(|v| *v >= b.target_roi_pct) {
        out.push(Recommendation::new(
            Strategic,
            Priority::Low,
            "Expand automation to additional workflows",
            format!("Compounds a {v:.1}% return across more of the business"),
            90,
        ));
    }

    if roi.confidence_score < LOW_CONFIDENCE_SCORE {
        out.push(Recommendation::new(
            Strategic,
            Priority::Low,
            format!(
                "Improve metrics coverage to raise analysis confidence (score {})",
                roi.confidence_score
            ),
            "More reliable forecasts and ROI estimates",
            60,
        ));
    }

    out
}

/// Merge trend, ROI and capacity results into a ranked insights report.
pub fn generate_insights(
    snapshot: &MetricSnapshot,
    trends: &BTreeMap<MetricKind, TrendResult>,
    roi: &RoiAnalysis,
    capacity: &CapacityReport,
    benchmarks: &Benchmarks,
) -> InsightsReport {
    let Classification {
        concerns,
        strengths,
        achievements,
    } = classify(snapshot, trends, roi, benchmarks);
    let risks = risks(roi, capacity);

    let mut recommendations = performance_recommendations(snapshot, trends, capacity, benchmarks);
    recommendations.extend(business_recommendations(snapshot, trends, roi, benchmarks));
    recommendations.extend(strategic_recommendations(roi, capacity, benchmarks));
    sort_recommendations(&mut recommendations);

    let action_plan = build_action_plan(&recommendations);

    InsightsReport {
        overall_health: OverallHealth::classify(concerns.len(), risks.len()),
        concerns,
        strengths,
        achievements,
        risks,
        recommendations,
        action_plan,
    }
}
