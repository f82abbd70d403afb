use loadprobe_cli::config::{LoadConfig, RunMode};
use loadprobe_cli::core::{LoadError, OperationKind};
use loadprobe_cli::runner::{LoadRunner, RunStatus};
use loadprobe_cli::sink::MemorySink;
use loadprobe_cli::sla::SlaMetric;
use loadprobe_cli::targets::SimulatedTarget;
use loadprobe_cli::test_utils::{FixedProbe, init_test_logging, targets};
use loadprobe_cli::workload::KindMix;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn base_config(name: &str) -> LoadConfig {
    LoadConfig {
        name: name.to_string(),
        requests: 20,
        workers: 10,
        operation_timeout_ms: 2_000,
        seed: Some(42),
        monitor_resources: false,
        workload: vec![
            KindMix::new("io", 0.5).with_params(json!({"latency_ms": 2})),
            KindMix::new("search", 0.5).with_params(json!({"latency_ms": 2})),
        ],
        ..LoadConfig::default()
    }
}

/// A mixed simulated workload passes and is broken down per kind
#[tokio::test]
async fn test_mixed_workload_end_to_end() {
    init_test_logging(Some(tracing::Level::DEBUG));
    let sink = MemorySink::new();
    let mut runner = LoadRunner::new(base_config("mixed")).unwrap();

    let report = runner
        .run(Arc::new(SimulatedTarget::new()), &sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.total, 20);
    assert_eq!(report.summary.success, 20);
    assert_eq!(report.status(), RunStatus::Passed);
    assert_eq!(report.by_kind.len(), 2);
    assert_eq!(report.by_kind[&OperationKind::new("io")].total, 10);
    assert_eq!(report.by_kind[&OperationKind::new("search")].total, 10);
    assert!(report.summary.throughput_rps > 0.0);
    assert!(report.summary.response_times.min_ms >= 2.0);
    assert_eq!(sink.reports().len(), 1);
    assert_eq!(sink.reports()[0].id, report.id);
}

/// Failed invocations count against the error-rate threshold
#[tokio::test]
async fn test_error_rate_breach_fails_sla() {
    let mut config = base_config("errors");
    config.workload = vec![
        KindMix::new("io", 0.8).with_params(json!({"latency_ms": 1})),
        KindMix::new("fail", 0.2).with_params(json!({"message": "upstream unavailable"})),
    ];
    config.sla.max_error_rate = 0.1;
    let sink = MemorySink::new();

    let report = LoadRunner::new(config)
        .unwrap()
        .run(Arc::new(SimulatedTarget::new()), &sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.failure, 4);
    assert!((report.summary.error_rate - 0.2).abs() < 1e-9);
    assert_eq!(report.status(), RunStatus::SlaNotMet);
    let violation = report.sla.violation(SlaMetric::ErrorRate).unwrap();
    assert!((violation.measured - 0.2).abs() < 1e-9);
    assert!(report.summary.errors.keys().any(|k| k.starts_with("OPERATION_FAILURE: ")
        && k.contains("upstream unavailable")));
}

/// Slow responses breach the average response-time threshold
#[tokio::test]
async fn test_slow_target_fails_response_time_sla() {
    let mut config = base_config("slow");
    config.requests = 5;
    config.sla.max_avg_response_ms = 5.0;
    config.slow_request_ms = Some(20.0);

    let report = LoadRunner::new(config)
        .unwrap()
        .run(targets::sleeping(Duration::from_millis(30)), &MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.sla.meets_sla);
    assert!(report.sla.violation(SlaMetric::AvgResponseTime).is_some());
    assert!(report.sla.violation(SlaMetric::ErrorRate).is_none());
    assert_eq!(report.sla.slow_requests, Some(5));
}

/// Memory growth past the ceiling is flagged without failing the SLA
#[tokio::test]
async fn test_memory_growth_is_flagged() {
    let mut config = base_config("memory");
    config.monitor_resources = true;
    config.memory_ceiling_mb = 10.0;

    let report = LoadRunner::new(config)
        .unwrap()
        .with_probe(Box::new(FixedProbe::new(&[100.0, 150.0])))
        .run(Arc::new(SimulatedTarget::new()), &MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap();

    let resources = report.resources.unwrap();
    assert!(resources.anomaly);
    assert!((resources.delta.memory_mb - 50.0).abs() < 1e-9);
    assert!(report.sla.meets_sla);
}

/// Sustained mode aggregates every round into one report
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sustained_run_combines_rounds() {
    let mut config = base_config("soak");
    config.mode = RunMode::Sustained;
    config.requests = 4;
    config.duration_secs = 1;
    config.round_pause_ms = 100;

    let report = LoadRunner::new(config)
        .unwrap()
        .run(Arc::new(SimulatedTarget::new()), &MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.rounds > 1);
    assert_eq!(report.summary.total, report.rounds as usize * 4);
    assert_eq!(report.results.len(), report.summary.total);
    assert!(report.summary.window_secs >= 0.5);
}

/// An impossible workload is rejected before anything runs
#[test]
fn test_invalid_workload_rejected_up_front() {
    let mut config = base_config("bad");
    config.workload = vec![KindMix::new("io", 0.8), KindMix::new("cpu", 0.5)];

    let err = LoadRunner::new(config).err().unwrap();
    assert!(matches!(err.downcast_ref::<LoadError>(), Some(LoadError::InvalidWorkload { .. })));
}

/// The same seed composes the same batch
#[test]
fn test_seeded_runs_compose_identically() {
    let first = LoadRunner::new(base_config("seeded")).unwrap().compose();
    let second = LoadRunner::new(base_config("seeded")).unwrap().compose();

    let ids = |batch: &[loadprobe_cli::core::OperationDescriptor]| {
        batch.iter().map(|d| d.case_id().to_string()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}
