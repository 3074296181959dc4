//! Data model error type.

use thiserror::Error;

/// Result type used across the data model.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while constructing or validating model values.
///
/// These are caller errors (bad input shape or bad configuration), never
/// data sparsity: sparse-but-valid series degrade inside the engine instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Fewer samples than the value can be built from.
    #[error("insufficient data: required {required} sample(s), got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Snapshots were not in ascending timestamp order.
    #[error("series is not chronologically ordered: {0}")]
    Unordered(String),

    /// A metric path did not name a tracked metric.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    /// A tunable was zero, negative or non-finite.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ModelError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn unknown_metric(path: impl Into<String>) -> Self {
        Self::UnknownMetric(path.into())
    }
}
