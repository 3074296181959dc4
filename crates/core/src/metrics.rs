//! Metric snapshots and the chronological series the engine reads.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Real-time operational readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RealtimeMetrics {
    pub completed_workflows: f64,
    pub failed_workflows: f64,
    pub average_response_time_ms: f64,
    pub throughput_per_minute: f64,
    pub error_rate_pct: f64,
    pub service_health_pct: f64,
}

/// Business-level readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BusinessMetrics {
    pub quality_score: f64,
    pub estimated_cost_savings: f64,
    pub roi_pct: f64,
    pub client_satisfaction_pct: f64,
}

/// Per-service reading reported alongside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceMetrics {
    pub name: String,
    pub response_time_ms: f64,
    pub error_count: u64,
    #[serde(default)]
    pub requests_per_minute: f64,
}

impl ServiceMetrics {
    pub fn new(name: impl Into<String>, response_time_ms: f64, error_count: u64) -> Self {
        Self {
            name: name.into(),
            response_time_ms,
            error_count,
            requests_per_minute: 0.0,
        }
    }
}

/// One immutable reading of every tracked metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    pub realtime: RealtimeMetrics,
    pub business: BusinessMetrics,
    #[serde(default)]
    pub services: Vec<ServiceMetrics>,
}

impl MetricSnapshot {
    pub fn new(timestamp: DateTime<Utc>, realtime: RealtimeMetrics, business: BusinessMetrics) -> Self {
        Self {
            timestamp,
            realtime,
            business,
            services: Vec::new(),
        }
    }

    pub fn with_services(mut self, services: Vec<ServiceMetrics>) -> Self {
        self.services = services;
        self
    }

    /// Read a tracked metric by kind.
    pub fn value(&self, metric: MetricKind) -> f64 {
        let rt = &self.realtime;
        let biz = &self.business;
        match metric {
            MetricKind::CompletedWorkflows => rt.completed_workflows,
            MetricKind::FailedWorkflows => rt.failed_workflows,
            MetricKind::AverageResponseTime => rt.average_response_time_ms,
            MetricKind::Throughput => rt.throughput_per_minute,
            MetricKind::ErrorRate => rt.error_rate_pct,
            MetricKind::ServiceHealth => rt.service_health_pct,
            MetricKind::QualityScore => biz.quality_score,
            MetricKind::CostSavings => biz.estimated_cost_savings,
            MetricKind::Roi => biz.roi_pct,
            MetricKind::ClientSatisfaction => biz.client_satisfaction_pct,
        }
    }

    /// Number of distinct service names reporting in this snapshot.
    pub fn distinct_services(&self) -> usize {
        let mut names: Vec<&str> = self.services.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

/// A tracked metric, addressed by its dotted path (`realtime.errorRate`, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "realtime.completedWorkflows")]
    CompletedWorkflows,
    #[serde(rename = "realtime.failedWorkflows")]
    FailedWorkflows,
    #[serde(rename = "realtime.averageResponseTime")]
    AverageResponseTime,
    #[serde(rename = "realtime.throughput")]
    Throughput,
    #[serde(rename = "realtime.errorRate")]
    ErrorRate,
    #[serde(rename = "realtime.serviceHealth")]
    ServiceHealth,
    #[serde(rename = "business.qualityScore")]
    QualityScore,
    #[serde(rename = "business.estimatedCostSavings")]
    CostSavings,
    #[serde(rename = "business.roi")]
    Roi,
    #[serde(rename = "business.clientSatisfaction")]
    ClientSatisfaction,
}

impl MetricKind {
    pub const ALL: [MetricKind; 10] = [
        MetricKind::CompletedWorkflows,
        MetricKind::FailedWorkflows,
        MetricKind::AverageResponseTime,
        MetricKind::Throughput,
        MetricKind::ErrorRate,
        MetricKind::ServiceHealth,
        MetricKind::QualityScore,
        MetricKind::CostSavings,
        MetricKind::Roi,
        MetricKind::ClientSatisfaction,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            MetricKind::CompletedWorkflows => "realtime.completedWorkflows",
            MetricKind::FailedWorkflows => "realtime.failedWorkflows",
            MetricKind::AverageResponseTime => "realtime.averageResponseTime",
            MetricKind::Throughput => "realtime.throughput",
            MetricKind::ErrorRate => "realtime.errorRate",
            MetricKind::ServiceHealth => "realtime.serviceHealth",
            MetricKind::QualityScore => "business.qualityScore",
            MetricKind::CostSavings => "business.estimatedCostSavings",
            MetricKind::Roi => "business.roi",
            MetricKind::ClientSatisfaction => "business.clientSatisfaction",
        }
    }

    /// Whether an increase is an improvement.
    ///
    /// Latency, failures and error rate improve downwards; everything else upwards.
    pub fn higher_is_better(&self) -> bool {
        !matches!(
            self,
            MetricKind::FailedWorkflows | MetricKind::AverageResponseTime | MetricKind::ErrorRate
        )
    }
}

impl core::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for MetricKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .iter()
            .copied()
            .find(|m| m.path() == s)
            .ok_or_else(|| ModelError::unknown_metric(s))
    }
}

/// Chronologically ordered snapshots; the last one is the latest reading.
///
/// Invariants (enforced at construction):
/// - at least one snapshot
/// - timestamps never decrease
///
/// The series is never re-sorted: out-of-order input is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MetricSnapshot>", into = "Vec<MetricSnapshot>")]
pub struct MetricSeries {
    snapshots: Vec<MetricSnapshot>,
}

impl MetricSeries {
    pub fn new(snapshots: Vec<MetricSnapshot>) -> ModelResult<Self> {
        if snapshots.is_empty() {
            return Err(ModelError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        if let Some(pos) = snapshots
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(ModelError::Unordered(format!(
                "snapshot {} ({}) precedes snapshot {} ({})",
                pos + 1,
                snapshots[pos + 1].timestamp,
                pos,
                snapshots[pos].timestamp
            )));
        }

        Ok(Self { snapshots })
    }

    pub fn single(snapshot: MetricSnapshot) -> Self {
        Self {
            snapshots: vec![snapshot],
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a series holds at least one snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn latest(&self) -> &MetricSnapshot {
        // Non-empty by construction.
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Every snapshot before the latest one.
    pub fn history(&self) -> &[MetricSnapshot] {
        &self.snapshots[..self.snapshots.len() - 1]
    }

    pub fn snapshots(&self) -> &[MetricSnapshot] {
        &self.snapshots
    }

    /// The metric's value for every snapshot, oldest first.
    pub fn values(&self, metric: MetricKind) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.value(metric)).collect()
    }
}

impl TryFrom<Vec<MetricSnapshot>> for MetricSeries {
    type Error = ModelError;

    fn try_from(value: Vec<MetricSnapshot>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MetricSeries> for Vec<MetricSnapshot> {
    fn from(value: MetricSeries) -> Self {
        value.snapshots
    }
}

/// Wire shape handed over by a metrics collector: the series plus the
/// services reporting at the latest tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetricsDocument {
    pub series: MetricSeries,
    #[serde(default)]
    pub services: Vec<ServiceMetrics>,
}

impl MetricsDocument {
    pub fn new(series: MetricSeries) -> Self {
        let services = series.latest().services.clone();
        Self { series, services }
    }
}
