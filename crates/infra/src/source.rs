//! Metric sources: where a runner gets each tenant's series from.
//!
//! The engine never collects metrics itself; a source hands it a complete,
//! ordered `MetricsDocument` per tenant.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use opsight_core::{MetricsDocument, TenantId};

use crate::error::InfraError;

pub trait MetricSource: Send + Sync {
    fn fetch(&self, tenant_id: TenantId) -> Result<MetricsDocument, InfraError>;
}

impl<S> MetricSource for Arc<S>
where
    S: MetricSource + ?Sized,
{
    fn fetch(&self, tenant_id: TenantId) -> Result<MetricsDocument, InfraError> {
        (**self).fetch(tenant_id)
    }
}

/// In-memory per-tenant documents for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMetricSource {
    inner: RwLock<HashMap<TenantId, MetricsDocument>>,
}

impl InMemoryMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tenant's document (the collector's latest aggregation).
    pub fn put(&self, tenant_id: TenantId, doc: MetricsDocument) {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tenant_id, doc);
    }
}

impl MetricSource for InMemoryMetricSource {
    fn fetch(&self, tenant_id: TenantId) -> Result<MetricsDocument, InfraError> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(&tenant_id)
            .cloned()
            .ok_or_else(|| InfraError::source_failed(tenant_id, "no metrics recorded"))
    }
}

/// Reads `<dir>/<tenant_id>.json` on every fetch.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    dir: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, tenant_id: TenantId) -> PathBuf {
        self.dir.join(format!("{tenant_id}.json"))
    }
}

impl MetricSource for JsonDirectorySource {
    fn fetch(&self, tenant_id: TenantId) -> Result<MetricsDocument, InfraError> {
        load_document(&self.path_for(tenant_id))
    }
}

/// Parse a metrics document file. Unknown keys and unordered series are rejected.
pub fn load_document(path: &Path) -> Result<MetricsDocument, InfraError> {
    let raw = std::fs::read_to_string(path).map_err(|source| InfraError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| InfraError::Json {
        path: PathBuf::from(path),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use opsight_core::{BusinessMetrics, MetricSeries, MetricSnapshot, RealtimeMetrics};

    fn doc() -> MetricsDocument {
        let snap = MetricSnapshot::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            RealtimeMetrics::default(),
            BusinessMetrics::default(),
        );
        MetricsDocument::new(MetricSeries::single(snap))
    }

    #[test]
    fn in_memory_source_is_tenant_isolated() {
        let source = InMemoryMetricSource::new();
        let a = TenantId::new();
        let b = TenantId::new();
        source.put(a, doc());

        assert_eq!(source.fetch(a).unwrap(), doc());
        assert!(matches!(source.fetch(b), Err(InfraError::Source { .. })));
    }

    #[test]
    fn put_survives_a_poisoned_lock() {
        let source = std::sync::Arc::new(InMemoryMetricSource::new());
        let tenant = TenantId::new();

        let poisoner = source.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the store");
        })
        .join();
        assert!(source.inner.is_poisoned());

        source.put(tenant, doc());
        assert_eq!(source.fetch(tenant).unwrap(), doc());
    }

    #[test]
    fn directory_source_reads_tenant_file() {
        let dir = std::env::temp_dir().join(format!("opsight-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let tenant = TenantId::new();
        let source = JsonDirectorySource::new(&dir);
        std::fs::write(source.path_for(tenant), serde_json::to_string(&doc()).unwrap()).unwrap();

        let fetched = source.fetch(tenant).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(fetched, doc());
    }

    #[test]
    fn malformed_document_is_a_json_error() {
        let path = std::env::temp_dir().join(format!("opsight-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "series": [] }"#).unwrap();
        let err = load_document(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, InfraError::Json { .. }));
    }
}
