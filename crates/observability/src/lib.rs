//! Tracing/logging setup shared by the runner and the CLI.

/// Initialize process-wide tracing with the format chosen by `OPSIGHT_LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filters, output format).
pub mod tracing;
