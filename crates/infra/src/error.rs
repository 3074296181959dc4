use std::path::PathBuf;

use thiserror::Error;

use opsight_analytics::AnalyticsError;
use opsight_core::{ModelError, TenantId};

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("metric source failed for tenant {tenant}: {reason}")]
    Source { tenant: TenantId, reason: String },

    #[error(transparent)]
    Config(#[from] ModelError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("invalid runner configuration: {0}")]
    InvalidRunner(String),

    #[error("failed to spawn runner thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl InfraError {
    pub fn source_failed(tenant: TenantId, reason: impl Into<String>) -> Self {
        Self::Source {
            tenant,
            reason: reason.into(),
        }
    }
}
