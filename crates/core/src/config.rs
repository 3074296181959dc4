//! Engine tunables.
//!
//! Every threshold the analytics components use lives here, grouped by the
//! component that reads it. All sections deserialize with `#[serde(default)]`
//! so a partial JSON document only overrides the fields it names.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Trend detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendSettings {
    /// Samples per compared window. Two full windows are required.
    pub window: usize,
    /// `|change_percent|` at or below this is `stable`.
    pub stable_threshold_pct: f64,
    /// Coefficient of variation below this is `high` confidence.
    pub high_confidence_cv: f64,
    /// Coefficient of variation below this is `medium` confidence.
    pub medium_confidence_cv: f64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            window: 24,
            stable_threshold_pct: 5.0,
            high_confidence_cv: 0.1,
            medium_confidence_cv: 0.3,
        }
    }
}

/// Forecast projection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSettings {
    pub default_horizon_days: u32,
    /// Horizons reported by the full pipeline.
    pub horizons_days: Vec<u32>,
    /// Sampling cadence of the series. With hourly samples and a 24-sample
    /// window, a window delta is a per-day delta.
    pub samples_per_day: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            default_horizon_days: 90,
            horizons_days: vec![30, 90, 180],
            samples_per_day: 24,
        }
    }
}

/// Capacity planning settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacitySettings {
    pub default_growth_rate_pct: f64,
    /// Response time treated as 100% utilization.
    pub max_expected_response_ms: f64,
    pub bottleneck_response_ms: f64,
    pub bottleneck_error_count: u64,
    /// Placeholder ratios deriving memory/network utilization from the
    /// response-time utilization.
    pub memory_factor: f64,
    pub network_factor: f64,
    pub projection_months: Vec<u32>,
    pub immediate_action_cost: f64,
    pub short_term_action_cost: f64,
    pub long_term_action_cost: f64,
    /// A long-term provisioning entry is planned when capacity is reached
    /// within this many months.
    pub long_term_horizon_months: f64,
}

impl Default for CapacitySettings {
    fn default() -> Self {
        Self {
            default_growth_rate_pct: 20.0,
            max_expected_response_ms: 5000.0,
            bottleneck_response_ms: 3000.0,
            bottleneck_error_count: 10,
            memory_factor: 0.8,
            network_factor: 0.6,
            projection_months: vec![1, 3, 6, 12],
            immediate_action_cost: 500.0,
            short_term_action_cost: 1000.0,
            long_term_action_cost: 5000.0,
            long_term_horizon_months: 12.0,
        }
    }
}

/// Cost and value assumptions for the ROI model.
///
/// The dollar figures are illustrative placeholders; override them with real
/// product numbers rather than editing the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostAssumptions {
    pub base_platform_monthly: f64,
    pub infrastructure_per_service_monthly: f64,
    pub api_cost_per_workflow: f64,
    pub storage_cost_per_workflow: f64,
    pub storage_cap_monthly: f64,
    pub support_monthly: f64,
    pub development_monthly: f64,
    pub implementation_one_time: f64,
    /// Maintenance as a share of the monthly platform cost.
    pub maintenance_ratio: f64,

    pub manual_hours_per_workflow: f64,
    pub hourly_rate: f64,
    pub quality_value_per_workflow: f64,
    pub consistency_value_per_workflow: f64,
    pub error_cost_avoided_per_workflow: f64,
    pub scalability_value_monthly: f64,

    pub customer_satisfaction_value: f64,
    pub brand_value_monthly: f64,
    pub market_advantage_monthly: f64,

    pub evaluation_months: u32,
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            base_platform_monthly: 500.0,
            infrastructure_per_service_monthly: 150.0,
            api_cost_per_workflow: 0.05,
            storage_cost_per_workflow: 0.01,
            storage_cap_monthly: 100.0,
            support_monthly: 200.0,
            development_monthly: 1000.0,
            implementation_one_time: 5000.0,
            maintenance_ratio: 0.2,

            manual_hours_per_workflow: 2.0,
            hourly_rate: 50.0,
            quality_value_per_workflow: 5.0,
            consistency_value_per_workflow: 2.0,
            error_cost_avoided_per_workflow: 10.0,
            scalability_value_monthly: 1000.0,

            customer_satisfaction_value: 2000.0,
            brand_value_monthly: 500.0,
            market_advantage_monthly: 750.0,

            evaluation_months: 12,
        }
    }
}

/// Targets each metric is judged against when building insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Benchmarks {
    pub target_response_time_ms: f64,
    pub target_error_rate_pct: f64,
    pub target_quality_score: f64,
    pub target_roi_pct: f64,
}

impl Default for Benchmarks {
    fn default() -> Self {
        Self {
            target_response_time_ms: 2000.0,
            target_error_rate_pct: 2.0,
            target_quality_score: 90.0,
            target_roi_pct: 200.0,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub trend: TrendSettings,
    pub forecast: ForecastSettings,
    pub capacity: CapacitySettings,
    pub cost: CostAssumptions,
    pub benchmarks: Benchmarks,
}

impl EngineConfig {
    /// Reject configurations the engine cannot produce meaningful output for.
    pub fn validate(&self) -> ModelResult<()> {
        if self.trend.window == 0 {
            return Err(ModelError::invalid_config("trend.window must be > 0"));
        }
        positive("trend.stable_threshold_pct", self.trend.stable_threshold_pct, true)?;
        if self.trend.high_confidence_cv > self.trend.medium_confidence_cv {
            return Err(ModelError::invalid_config(
                "trend.high_confidence_cv must not exceed trend.medium_confidence_cv",
            ));
        }

        if self.forecast.default_horizon_days == 0 {
            return Err(ModelError::invalid_config("forecast.default_horizon_days must be > 0"));
        }
        if self.forecast.horizons_days.contains(&0) {
            return Err(ModelError::invalid_config("forecast.horizons_days must all be > 0"));
        }
        if self.forecast.samples_per_day == 0 {
            return Err(ModelError::invalid_config("forecast.samples_per_day must be > 0"));
        }

        positive("capacity.default_growth_rate_pct", self.capacity.default_growth_rate_pct, false)?;
        positive("capacity.max_expected_response_ms", self.capacity.max_expected_response_ms, false)?;
        positive("capacity.bottleneck_response_ms", self.capacity.bottleneck_response_ms, false)?;

        if self.cost.evaluation_months == 0 {
            return Err(ModelError::invalid_config("cost.evaluation_months must be > 0"));
        }
        positive("cost.maintenance_ratio", self.cost.maintenance_ratio, true)?;

        Ok(())
    }
}

fn positive(name: &str, value: f64, allow_zero: bool) -> ModelResult<()> {
    let ok = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
    if ok {
        Ok(())
    } else if allow_zero {
        Err(ModelError::invalid_config(format!("{name} must be finite and >= 0 (got {value})")))
    } else {
        Err(ModelError::invalid_config(format!("{name} must be finite and > 0 (got {value})")))
    }
}
