use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::info;

use opsight_core::{EngineConfig, MetricKind, MetricSeries, MetricsDocument, ServiceMetrics, TenantId};

use crate::capacity::{CapacityReport, analyze_capacity};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::forecast::{ForecastResult, ScenarioForecast, forecast_horizons, generate_scenarios};
use crate::insights::{InsightsReport, generate_insights};
use crate::job::AnalyticsJob;
use crate::roi::{RoiAnalysis, calculate_roi};
use crate::trend::{TrendResult, analyze_all};

/// Everything one engine invocation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInput {
    pub tenant_id: TenantId,
    pub series: MetricSeries,
    pub services: Vec<ServiceMetrics>,
    pub horizon_days: u32,
    pub growth_rate_pct: f64,
}

impl EngineInput {
    /// Input using the configured default horizon and growth rate.
    pub fn from_document(tenant_id: TenantId, doc: MetricsDocument, config: &EngineConfig) -> Self {
        Self {
            tenant_id,
            series: doc.series,
            services: doc.services,
            horizon_days: config.forecast.default_horizon_days,
            growth_rate_pct: config.capacity.default_growth_rate_pct,
        }
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_growth_rate_pct(mut self, growth_rate_pct: f64) -> Self {
        self.growth_rate_pct = growth_rate_pct;
        self
    }
}

/// Output of one engine invocation.
///
/// `generated_at` is the latest snapshot's timestamp, so identical input
/// always serializes to identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    pub tenant_id: TenantId,
    pub generated_at: DateTime<Utc>,
    pub samples: usize,
    pub trends: BTreeMap<MetricKind, TrendResult>,
    pub forecasts: Vec<ForecastResult>,
    pub scenarios: Vec<ScenarioForecast>,
    pub roi: RoiAnalysis,
    pub capacity: CapacityReport,
    pub insights: InsightsReport,
}

impl EngineReport {
    /// Compact headline view for logs and dashboards.
    pub fn summary(&self) -> JsonValue {
        json!({
            "kind": "opsight.engine_report",
            "tenant_id": self.tenant_id.to_string(),
            "generated_at": self.generated_at,
            "overall_health": self.insights.overall_health,
            "roi_pct": self.roi.roi_pct,
            "roi_grade": self.roi.grade,
            "payback_months": self.roi.payback.months,
            "bottlenecks": self.capacity.bottlenecks.len(),
            "scaling_cost": self.capacity.scaling_plan.total_cost,
            "time_to_capacity_months": self.capacity.time_to_capacity_months,
            "recommendations": self.insights.recommendations.len(),
            "unreliable_forecasts": self.forecasts.iter().filter(|f| f.unreliable).count(),
        })
    }
}

/// Full trend → forecast → ROI/capacity → insights pipeline for one tenant.
#[derive(Debug, Clone)]
pub struct BusinessIntelligenceJob {
    tenant_id: TenantId,
    input: EngineInput,
    config: EngineConfig,
}

impl BusinessIntelligenceJob {
    pub fn new(tenant_id: TenantId, input: EngineInput) -> Self {
        Self {
            tenant_id,
            input,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl AnalyticsJob for BusinessIntelligenceJob {
    type Input = EngineInput;
    type Output = EngineReport;

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> AnalyticsResult<EngineReport> {
        if self.input.tenant_id != self.tenant_id {
            return Err(AnalyticsError::InvalidInput(
                "tenant_id mismatch between job and input".to_string(),
            ));
        }

        self.config.validate()?;

        let input = &self.input;
        if input.horizon_days == 0 {
            return Err(AnalyticsError::invalid_config("horizon_days must be > 0"));
        }

        let cfg = &self.config;
        let series = &input.series;
        // `input.services` is the one service list every component sees.
        let latest_snapshot = series.latest().clone().with_services(input.services.clone());
        let latest = &latest_snapshot;

        let trends = analyze_all(series, &cfg.trend);

        let mut horizons = cfg.forecast.horizons_days.clone();
        if !horizons.contains(&input.horizon_days) {
            horizons.push(input.horizon_days);
            horizons.sort_unstable();
        }
        let forecasts = forecast_horizons(&trends, &horizons, cfg)?;
        let scenarios = generate_scenarios(series, input.horizon_days, cfg)?;

        let roi = calculate_roi(latest, Some(series), &cfg.cost);
        let capacity = analyze_capacity(latest, &input.services, input.growth_rate_pct, &cfg.capacity)?;
        let insights = generate_insights(latest, &trends, &roi, &capacity, &cfg.benchmarks);

        info!(
            tenant = %self.tenant_id,
            samples = series.len(),
            health = ?insights.overall_health,
            recommendations = insights.recommendations.len(),
            "engine report generated"
        );

        Ok(EngineReport {
            tenant_id: self.tenant_id,
            generated_at: latest.timestamp,
            samples: series.len(),
            trends,
            forecasts,
            scenarios,
            roi,
            capacity,
            insights,
        })
    }
}
