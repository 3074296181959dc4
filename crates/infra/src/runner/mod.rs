//! Scheduled report generation.
//!
//! Runners fetch a tenant's metrics on a fixed cadence (or on demand),
//! run the engine and hand the report to a sink. Failures are isolated:
//! they are logged and retried, never propagated to the caller.

pub mod report_runner;

pub use report_runner::{
    InMemoryReportSink, ReportRunner, ReportRunnerHandle, ReportSink, generate_report, run_once,
};
