//! Cost-benefit model: platform costs, automation savings, ROI and payback.
//!
//! The latest snapshot's `completed_workflows` is treated as the monthly
//! workflow volume. Every rate and dollar figure comes from
//! [`CostAssumptions`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use opsight_core::{CostAssumptions, MetricSeries, MetricSnapshot};

use crate::error::AnalyticsResult;
use crate::stats::ratio;

const MS_PER_HOUR: f64 = 3_600_000.0;
const DAYS_PER_MONTH: f64 = 30.0;
const MIN_WORKFLOWS_FOR_CONFIDENCE: f64 = 100.0;
const MIN_SERVICES_FOR_CONFIDENCE: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoiGrade {
    Exceptional,
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl RoiGrade {
    /// Grade a ROI percentage. Thresholds are inclusive lower bounds.
    pub fn from_roi(roi_pct: f64) -> Self {
        if roi_pct >= 300.0 {
            RoiGrade::Exceptional
        } else if roi_pct >= 200.0 {
            RoiGrade::Excellent
        } else if roi_pct >= 150.0 {
            RoiGrade::VeryGood
        } else if roi_pct >= 100.0 {
            RoiGrade::Good
        } else if roi_pct >= 50.0 {
            RoiGrade::Fair
        } else {
            RoiGrade::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoiGrade::Exceptional => "Exceptional",
            RoiGrade::Excellent => "Excellent",
            RoiGrade::VeryGood => "Very Good",
            RoiGrade::Good => "Good",
            RoiGrade::Fair => "Fair",
            RoiGrade::Poor => "Poor",
        }
    }
}

impl core::fmt::Display for RoiGrade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Monthly platform costs plus the one-time implementation cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub base: f64,
    pub infrastructure: f64,
    pub api: f64,
    pub storage: f64,
    pub support: f64,
    pub development: f64,
    pub total_monthly: f64,
    pub implementation: f64,
    pub maintenance: f64,
}

/// Monthly savings attributed to automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsBreakdown {
    pub hours_saved: f64,
    pub time: f64,
    pub quality: f64,
    pub consistency: f64,
    pub error_reduction: f64,
    pub scalability: f64,
    pub total_monthly: f64,
}

/// Monthly strategic value. Reported alongside ROI, not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicValue {
    pub customer_satisfaction: f64,
    pub brand: f64,
    pub market_advantage: f64,
    pub total_monthly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payback {
    pub monthly_net_benefit: f64,
    /// `None` when the investment is never recovered.
    pub months: Option<f64>,
    pub break_even_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiAnalysis {
    pub roi_pct: Option<f64>,
    pub grade: Option<RoiGrade>,
    pub evaluation_months: u32,
    pub total_investment: f64,
    pub total_returns: f64,
    pub costs: CostBreakdown,
    pub savings: SavingsBreakdown,
    pub strategic: StrategicValue,
    pub payback: Payback,
    /// 0..=100; lowered by missing history, low volume and few services.
    pub confidence_score: u32,
}

/// `(returns - investment) / investment × 100`; degenerate when nothing was invested.
pub fn roi_percent(total_returns: f64, total_investment: f64) -> AnalyticsResult<f64> {
    ratio(total_returns - total_investment, total_investment, "roi").map(|r| r * 100.0)
}

pub fn calculate_costs(snapshot: &MetricSnapshot, a: &CostAssumptions) -> CostBreakdown {
    let workflows = snapshot.realtime.completed_workflows.max(0.0);
    let services = snapshot.distinct_services().max(1) as f64;

    let base = a.base_platform_monthly;
    let infrastructure = a.infrastructure_per_service_monthly * services;
    let api = workflows * a.api_cost_per_workflow;
    let storage = (workflows * a.storage_cost_per_workflow).min(a.storage_cap_monthly);
    let support = a.support_monthly;
    let development = a.development_monthly;
    let total_monthly = base + infrastructure + api + storage + support + development;

    CostBreakdown {
        base,
        infrastructure,
        api,
        storage,
        support,
        development,
        total_monthly,
        implementation: a.implementation_one_time,
        maintenance: a.maintenance_ratio * total_monthly,
    }
}

pub fn calculate_savings(snapshot: &MetricSnapshot, a: &CostAssumptions) -> SavingsBreakdown {
    let rt = &snapshot.realtime;
    let workflows = rt.completed_workflows.max(0.0);
    let automated_hours = rt.average_response_time_ms.max(0.0) / MS_PER_HOUR;

    let hours_saved = (workflows * (a.manual_hours_per_workflow - automated_hours)).max(0.0);
    let time = hours_saved * a.hourly_rate;
    let quality = workflows * (snapshot.business.quality_score / 100.0) * a.quality_value_per_workflow;
    let consistency = workflows * a.consistency_value_per_workflow;
    let success_share = (1.0 - rt.error_rate_pct / 100.0).clamp(0.0, 1.0);
    let error_reduction = workflows * success_share * a.error_cost_avoided_per_workflow;
    let scalability = a.scalability_value_monthly;

    SavingsBreakdown {
        hours_saved,
        time,
        quality,
        consistency,
        error_reduction,
        scalability,
        total_monthly: time + quality + consistency + error_reduction + scalability,
    }
}

pub fn strategic_value(snapshot: &MetricSnapshot, a: &CostAssumptions) -> StrategicValue {
    let customer_satisfaction =
        a.customer_satisfaction_value * (snapshot.business.client_satisfaction_pct / 100.0).clamp(0.0, 1.0);
    let brand = a.brand_value_monthly;
    let market_advantage = a.market_advantage_monthly;
    StrategicValue {
        customer_satisfaction,
        brand,
        market_advantage,
        total_monthly: customer_satisfaction + brand + market_advantage,
    }
}

pub fn payback(snapshot: &MetricSnapshot, total_investment: f64, monthly_net_benefit: f64) -> Payback {
    let months = if monthly_net_benefit > 0.0 && total_investment > 0.0 {
        ratio(total_investment, monthly_net_benefit, "payback").ok()
    } else {
        None
    };

    let break_even_at = months.and_then(|m| {
        let secs = (m * DAYS_PER_MONTH * 86_400.0).round();
        if secs >= i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_seconds(secs as i64).and_then(|d| snapshot.timestamp.checked_add_signed(d))
    });

    Payback {
        monthly_net_benefit,
        months,
        break_even_at,
    }
}

pub fn confidence_score(snapshot: &MetricSnapshot, series: Option<&MetricSeries>) -> u32 {
    let mut score: i32 = 100;
    if series.is_none_or(|s| s.history().is_empty()) {
        score -= 30;
    }
    if snapshot.realtime.completed_workflows < MIN_WORKFLOWS_FOR_CONFIDENCE {
        score -= 20;
    }
    if snapshot.distinct_services() < MIN_SERVICES_FOR_CONFIDENCE {
        score -= 15;
    }
    score.max(0) as u32
}

/// Full cost-benefit analysis of one snapshot.
pub fn calculate_roi(
    snapshot: &MetricSnapshot,
    series: Option<&MetricSeries>,
    assumptions: &CostAssumptions,
) -> RoiAnalysis {
    let costs = calculate_costs(snapshot, assumptions);
    let savings = calculate_savings(snapshot, assumptions);
    let strategic = strategic_value(snapshot, assumptions);

    let months = f64::from(assumptions.evaluation_months);
    let monthly_outlay = costs.total_monthly + costs.maintenance;
    let total_investment = costs.implementation + monthly_outlay * months;
    let total_returns = savings.total_monthly * months;

    let roi_pct = roi_percent(total_returns, total_investment).ok();
    let grade = roi_pct.map(RoiGrade::from_roi);
    let payback = payback(snapshot, total_investment, savings.total_monthly - monthly_outlay);

    debug!(
        ?roi_pct,
        total_investment,
        total_returns,
        payback_months = ?payback.months,
        "roi computed"
    );

    RoiAnalysis {
        roi_pct,
        grade,
        evaluation_months: assumptions.evaluation_months,
        total_investment,
        total_returns,
        costs,
        savings,
        strategic,
        payback,
        confidence_score: confidence_score(snapshot, series),
    }
}
