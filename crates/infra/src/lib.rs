//! `opsight-infra`
//!
//! **Responsibility:** everything around the engine that touches the outside
//! world: configuration loading, metric sources and scheduled runners.
//!
//! The analytics crate stays pure; this crate owns IO and threads.

pub mod error;
pub mod runner;
pub mod settings;
pub mod source;

pub use error::InfraError;
pub use runner::{InMemoryReportSink, ReportRunner, ReportRunnerHandle, ReportSink, generate_report, run_once};
pub use settings::Settings;
pub use source::{InMemoryMetricSource, JsonDirectorySource, MetricSource, load_document};
