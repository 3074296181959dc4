use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use opsight_analytics::{
    AnalyticsScheduler, BusinessIntelligenceJob, EngineInput, EngineReport, LocalScheduler,
};
use opsight_core::{EngineConfig, MetricsDocument, TenantId};

use crate::error::InfraError;
use crate::settings::Settings;
use crate::source::MetricSource;

/// Destination for generated reports.
pub trait ReportSink: Send + Sync + 'static {
    fn emit(&self, tenant_id: TenantId, report: EngineReport);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryReportSink {
    inner: Mutex<Vec<(TenantId, EngineReport)>>,
}

impl InMemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(TenantId, EngineReport)> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for InMemoryReportSink {
    fn emit(&self, tenant_id: TenantId, report: EngineReport) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((tenant_id, report));
    }
}

/// Run the engine once over an already-fetched document.
pub fn generate_report(
    tenant_id: TenantId,
    doc: MetricsDocument,
    config: &EngineConfig,
) -> Result<EngineReport, InfraError> {
    let input = EngineInput::from_document(tenant_id, doc, config);
    let job = BusinessIntelligenceJob::new(tenant_id, input).with_config(config.clone());
    Ok(LocalScheduler::for_tenant(tenant_id).run(job)?)
}

/// Fetch from `source` and run the engine once.
pub fn run_once<S>(tenant_id: TenantId, source: &S, config: &EngineConfig) -> Result<EngineReport, InfraError>
where
    S: MetricSource + ?Sized,
{
    let doc = source.fetch(tenant_id)?;
    generate_report(tenant_id, doc, config)
}

/// Config for the report runner.
#[derive(Debug, Clone)]
pub struct ReportRunner {
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub engine: EngineConfig,
}

impl Default for ReportRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
            engine: EngineConfig::default(),
        }
    }
}

/// Handle for a running report runner (shutdown + trigger hook).
#[derive(Debug)]
pub struct ReportRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ReportRunnerHandle {
    /// Request a run as soon as possible, e.g. after new metrics land.
    ///
    /// Triggers are coalesced: while a run is already pending this is a no-op.
    pub fn trigger(&self) {
        // capacity 1; a full channel means a run is already queued
        let _ = self.trigger.try_send(());
    }

    /// Stop the runner thread and wait for it to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl ReportRunner {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interval: settings.run_interval,
            engine: settings.engine.clone(),
            ..Self::default()
        }
    }

    /// Spawn a tenant-scoped runner.
    ///
    /// - Schedule: runs on startup, then every `interval`
    /// - Trigger: `handle.trigger()` requests an extra run
    /// - Failures: logged and retried with bounded exponential backoff
    ///
    /// A zero `interval` is rejected.
    pub fn spawn_for_tenant<S, K>(
        &self,
        name: &'static str,
        tenant_id: TenantId,
        source: Arc<S>,
        sink: Arc<K>,
    ) -> Result<ReportRunnerHandle, InfraError>
    where
        S: MetricSource + 'static,
        K: ReportSink,
    {
        if self.interval.is_zero() {
            return Err(InfraError::InvalidRunner("interval must be > 0".to_string()));
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, tenant_id, cfg, shutdown_rx, trigger_rx, source, sink))
            .map_err(InfraError::Spawn)?;

        Ok(ReportRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        })
    }
}

fn runner_loop<S, K>(
    name: &'static str,
    tenant_id: TenantId,
    cfg: ReportRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    source: Arc<S>,
    sink: Arc<K>,
) where
    S: MetricSource + 'static,
    K: ReportSink,
{
    info!(runner = name, tenant = %tenant_id, interval_secs = cfg.interval.as_secs(), "report runner started");

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true; // run once on startup
    let mut failures: u32 = 0;
    let mut backoff_until: Option<Instant> = None;

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if let Some(until) = backoff_until {
            if Instant::now() < until {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            backoff_until = None;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        match run_once(tenant_id, source.as_ref(), &cfg.engine) {
            Ok(report) => {
                failures = 0;
                debug!(runner = name, summary = %report.summary(), "report ready");
                sink.emit(tenant_id, report);
            }
            Err(e) => {
                warn!(runner = name, tenant = %tenant_id, error = %e, attempt = failures + 1, "report run failed");
                failures += 1;
                if failures <= cfg.max_retries {
                    pending = true;
                    backoff_until = Some(Instant::now() + backoff(cfg.base_backoff, failures));
                } else {
                    // give up until the next tick or trigger
                    failures = 0;
                }
            }
        }
    }

    info!(runner = name, tenant = %tenant_id, "report runner stopped");
}

/// `base * 2^(attempt-1)`, capped at 10s.
fn backoff(base: Duration, attempt: u32) -> Duration {
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(pow as u128);
    Duration::from_millis(ms.min(10_000) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryMetricSource;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use opsight_core::{BusinessMetrics, MetricSeries, MetricSnapshot, RealtimeMetrics};

    fn doc() -> MetricsDocument {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let snaps = (0..30)
            .map(|i| {
                MetricSnapshot::new(
                    start + ChronoDuration::hours(i),
                    RealtimeMetrics {
                        completed_workflows: 400.0 + i as f64,
                        throughput_per_minute: 7.0,
                        average_response_time_ms: 900.0,
                        error_rate_pct: 1.0,
                        service_health_pct: 99.0,
                        ..RealtimeMetrics::default()
                    },
                    BusinessMetrics::default(),
                )
            })
            .collect();
        MetricsDocument::new(MetricSeries::new(snaps).unwrap())
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff(base, 1), Duration::from_millis(250));
        assert_eq!(backoff(base, 2), Duration::from_millis(500));
        assert_eq!(backoff(base, 3), Duration::from_millis(1000));
        assert_eq!(backoff(base, 20), Duration::from_secs(10));
    }

    #[test]
    fn run_once_produces_report_for_tenant() {
        let tenant = TenantId::new();
        let source = InMemoryMetricSource::new();
        source.put(tenant, doc());

        let report = run_once(tenant, &source, &EngineConfig::default()).unwrap();
        assert_eq!(report.tenant_id, tenant);
        assert_eq!(report.samples, 30);
    }

    #[test]
    fn run_once_surfaces_source_errors() {
        let source = InMemoryMetricSource::new();
        let err = run_once(TenantId::new(), &source, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, InfraError::Source { .. }));
    }

    #[test]
    fn generate_report_rejects_invalid_config() {
        let mut cfg = EngineConfig::default();
        cfg.forecast.default_horizon_days = 0;
        let err = generate_report(TenantId::new(), doc(), &cfg).unwrap_err();
        assert!(matches!(err, InfraError::Analytics(_)));
    }

    #[test]
    fn zero_interval_is_rejected_before_spawning() {
        let runner = ReportRunner {
            interval: Duration::ZERO,
            ..ReportRunner::default()
        };
        let err = runner
            .spawn_for_tenant(
                "zero-interval",
                TenantId::new(),
                Arc::new(InMemoryMetricSource::new()),
                Arc::new(InMemoryReportSink::new()),
            )
            .unwrap_err();
        assert!(matches!(err, InfraError::InvalidRunner(_)));
    }

    #[test]
    fn from_settings_carries_interval_and_engine() {
        let mut settings = Settings::default();
        settings.run_interval = Duration::from_secs(7);
        settings.engine.capacity.default_growth_rate_pct = 30.0;

        let runner = ReportRunner::from_settings(&settings);
        assert_eq!(runner.interval, Duration::from_secs(7));
        assert_eq!(runner.engine.capacity.default_growth_rate_pct, 30.0);
        assert_eq!(runner.max_retries, 5);
    }
}
