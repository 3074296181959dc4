//! `opsight-core` — data model shared by the forecasting engine and its callers.
//!
//! This crate contains **pure values** only (no IO, no clocks, no logging):
//! metric snapshots, the chronological series the engine consumes, and the
//! tunable configuration injected into each analytics component.

pub mod config;
pub mod error;
pub mod id;
pub mod metrics;

pub use config::{
    Benchmarks, CapacitySettings, CostAssumptions, EngineConfig, ForecastSettings, TrendSettings,
};
pub use error::{ModelError, ModelResult};
pub use id::TenantId;
pub use metrics::{
    BusinessMetrics, MetricKind, MetricSeries, MetricSnapshot, MetricsDocument, RealtimeMetrics,
    ServiceMetrics,
};
