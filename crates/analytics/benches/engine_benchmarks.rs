use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, TimeZone, Utc};
use opsight_analytics::trend::analyze_all;
use opsight_analytics::{AnalyticsJob, BusinessIntelligenceJob, EngineInput};
use opsight_core::{
    BusinessMetrics, EngineConfig, MetricSeries, MetricSnapshot, MetricsDocument, RealtimeMetrics, ServiceMetrics,
    TenantId,
};

/// Hourly series with a gentle upward drift and a small periodic wobble.
fn series(len: usize) -> MetricSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let snapshots = (0..len)
        .map(|i| {
            let t = i as f64;
            let wobble = (t / 6.0).sin();
            MetricSnapshot::new(
                start + Duration::hours(i as i64),
                RealtimeMetrics {
                    completed_workflows: 400.0 + t * 0.5 + wobble * 20.0,
                    failed_workflows: 8.0 + wobble,
                    average_response_time_ms: 1400.0 + wobble * 150.0,
                    throughput_per_minute: 7.0 + t * 0.01,
                    error_rate_pct: 2.0 + wobble * 0.2,
                    service_health_pct: 99.0,
                },
                BusinessMetrics {
                    quality_score: 91.0 + wobble,
                    estimated_cost_savings: 20_000.0 + t * 10.0,
                    roi_pct: 210.0,
                    client_satisfaction_pct: 89.0,
                },
            )
            .with_services(vec![
                ServiceMetrics::new("gateway", 450.0, 2),
                ServiceMetrics::new("orchestrator", 3200.0, 4),
                ServiceMetrics::new("worker", 900.0, 14),
            ])
        })
        .collect();
    MetricSeries::new(snapshots).expect("benchmark series is ordered")
}

fn bench_trends(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend_analysis");
    let cfg = EngineConfig::default();
    for len in [48usize, 24 * 30, 24 * 365] {
        let s = series(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &s, |b, s| {
            b.iter(|| analyze_all(black_box(s), &cfg.trend));
        });
    }
    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_pipeline");
    let cfg = EngineConfig::default();
    for len in [48usize, 24 * 30] {
        let tenant = TenantId::new();
        let input = EngineInput::from_document(tenant, MetricsDocument::new(series(len)), &cfg);
        let job = BusinessIntelligenceJob::new(tenant, input);
        group.bench_with_input(BenchmarkId::from_parameter(len), &job, |b, job| {
            b.iter(|| job.run().expect("pipeline succeeds"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_trends, bench_full_pipeline);
criterion_main!(benches);
