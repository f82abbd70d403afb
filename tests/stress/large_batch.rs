use loadprobe_cli::config::LoadConfig;
use loadprobe_cli::driver::ConcurrencyDriver;
use loadprobe_cli::runner::LoadRunner;
use loadprobe_cli::sink::MemorySink;
use loadprobe_cli::targets::SimulatedTarget;
use loadprobe_cli::test_utils::{descriptors, targets};
use loadprobe_cli::workload::KindMix;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// 5,000 descriptors through 100 workers
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_five_thousand_invocations() {
    let batch = descriptors("io", 5_000);
    let (target, peak) = targets::concurrency_tracking(Duration::from_millis(2));

    let start = Instant::now();
    let results = ConcurrencyDriver::new(100, Duration::from_secs(10))
        .fan_out(&batch, target, &CancellationToken::new())
        .await;
    let elapsed = start.elapsed();

    let unique: HashSet<&str> = results.iter().map(|r| r.case_id()).collect();
    assert_eq!(results.len(), 5_000);
    assert_eq!(unique.len(), 5_000);
    assert!(results.iter().all(|r| r.is_success()));
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= 100);

    println!(
        "5000 invocations, 100 workers: {:.2}s ({:.0} req/s), peak in flight {peak}",
        elapsed.as_secs_f64(),
        5_000.0 / elapsed.as_secs_f64()
    );
}

/// A large mixed simulated workload, including CPU-bound work
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_large_mixed_workload() {
    let config = LoadConfig {
        name: "stress-mixed".to_string(),
        requests: 2_000,
        workers: 64,
        seed: Some(1),
        workload: vec![
            KindMix::new("cpu", 0.25).with_params(json!({"iterations": 50_000})),
            KindMix::new("io", 0.25).with_params(json!({"latency_ms": 5})),
            KindMix::new("search", 0.25).with_params(json!({"latency_ms": 10})),
            KindMix::new("calculation", 0.25),
        ],
        ..LoadConfig::default()
    };

    let start = Instant::now();
    let report = LoadRunner::new(config)
        .unwrap()
        .run(Arc::new(SimulatedTarget::new()), &MemorySink::new(), &CancellationToken::new())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.summary.total, 2_000);
    assert_eq!(report.summary.failure, 0);
    assert_eq!(report.by_kind.len(), 4);
    assert!(report.by_kind.values().all(|k| k.total == 500));

    let rt = &report.summary.response_times;
    println!(
        "2000 mixed invocations in {:.2}s: {:.1} req/s, mean {:.2} ms, p95 {:.2} ms, p99 {:.2} ms",
        elapsed.as_secs_f64(),
        report.summary.throughput_rps,
        rt.mean_ms,
        rt.p95_ms,
        rt.p99_ms
    );
    if let Some(resources) = &report.resources {
        println!(
            "memory {:.1} MB -> {:.1} MB (anomaly: {})",
            resources.before.memory_mb, resources.after.memory_mb, resources.anomaly
        );
    }
}
