use thiserror::Error;

use opsight_core::ModelError;

/// Result alias for engine operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The caller passed a tunable the engine refuses to work with
    /// (non-positive horizon or growth rate, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A ratio had a zero denominator. Public operations map this to a
    /// sentinel (`0` or `None`) before it reaches a report.
    #[error("degenerate arithmetic: {0}")]
    DegenerateArithmetic(String),

    #[error("invalid job input: {0}")]
    InvalidInput(String),
}

impl AnalyticsError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
