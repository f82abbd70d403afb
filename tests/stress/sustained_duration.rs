use loadprobe_cli::driver::ConcurrencyDriver;
use loadprobe_cli::invocation::FailureKind;
use loadprobe_cli::stats::BatchReport;
use loadprobe_cli::test_utils::{descriptors, targets};
use serial_test::serial;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// A 2 s sustained run ends shortly after its budget
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_two_second_budget_terminates() {
    let batch = descriptors("io", 20);
    let driver = ConcurrencyDriver::new(10, Duration::from_secs(1))
        .with_round_pause(Duration::from_millis(100));

    let start = Instant::now();
    let outcome = driver
        .sustained(
            &batch,
            targets::sleeping(Duration::from_millis(20)),
            Duration::from_secs(2),
            &CancellationToken::new(),
        )
        .await;
    let elapsed = start.elapsed();

    assert!(outcome.rounds > 1);
    assert!(elapsed >= Duration::from_secs(2));
    // At most one round (bounded by the operation timeout) past the budget
    assert!(elapsed < Duration::from_millis(3_500), "ran for {elapsed:?}");

    let report = BatchReport::from_results(&outcome.results);
    assert_eq!(report.total, outcome.rounds as usize * 20);
    assert_eq!(report.failure, 0);

    println!(
        "sustained 2s: {} rounds, {} invocations, {:.1} req/s, elapsed {:.2}s",
        outcome.rounds,
        report.total,
        report.throughput_rps,
        elapsed.as_secs_f64()
    );
}

/// Rounds full of timeouts still respect the budget
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_hanging_target_under_sustained_load() {
    let batch = descriptors("io", 8);
    let driver = ConcurrencyDriver::new(8, Duration::from_millis(200))
        .with_round_pause(Duration::from_millis(50));

    let start = Instant::now();
    let outcome = driver
        .sustained(&batch, targets::hanging(), Duration::from_secs(1), &CancellationToken::new())
        .await;
    let elapsed = start.elapsed();

    assert!(outcome.results.iter().all(|r| r.failure() == Some(FailureKind::Timeout)));
    assert!(elapsed < Duration::from_millis(1_600), "ran for {elapsed:?}");

    println!(
        "sustained with hanging target: {} rounds, {} timeouts in {:.2}s",
        outcome.rounds,
        outcome.results.len(),
        elapsed.as_secs_f64()
    );
}
