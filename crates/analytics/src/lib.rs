//! `opsight-analytics`
//!
//! **Responsibility:** the forecasting and business-intelligence engine.
//!
//! Every operation is a pure function of its immutable input:
//! - no clock, no randomness, no IO
//! - results are fresh values, never mutated after construction
//! - sparse data degrades to low confidence; bad configuration is rejected
//!
//! Components (leaf-first): [`trend`] → [`forecast`] → [`roi`] / [`capacity`]
//! → [`insights`], wired together by [`pipeline::BusinessIntelligenceJob`].

pub mod capacity;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod job;
pub mod pipeline;
pub mod roi;
pub mod scheduler;
mod stats;
pub mod trend;

pub use capacity::{
    Bottleneck, BottleneckKind, CapacityReport, ScalingCategory, ScalingPlan, ScalingPlanEntry, Severity,
    analyze_capacity,
};
pub use error::{AnalyticsError, AnalyticsResult};
pub use forecast::{ForecastResult, ScenarioForecast, ScenarioKind, generate_scenario, project};
pub use insights::{InsightsReport, OverallHealth, Priority, Recommendation, RecommendationCategory, generate_insights};
pub use job::AnalyticsJob;
pub use pipeline::{BusinessIntelligenceJob, EngineInput, EngineReport};
pub use roi::{RoiAnalysis, RoiGrade, calculate_roi};
pub use scheduler::{AnalyticsScheduler, LocalScheduler, TenantScope};
pub use trend::{Confidence, TrendDirection, TrendResult, analyze_trend};
