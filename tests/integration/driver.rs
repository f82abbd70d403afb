use loadprobe_cli::driver::{CANCELLED_BEFORE_START, ConcurrencyDriver};
use loadprobe_cli::invocation::FailureKind;
use loadprobe_cli::test_utils::{descriptors, init_test_logging, targets};
use serial_test::serial;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const GENEROUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Every descriptor yields exactly one result, whatever the worker count
#[tokio::test]
async fn test_one_result_per_descriptor_for_any_worker_count() {
    init_test_logging(None);
    let batch = descriptors("io", 25);
    let target = targets::sleeping(Duration::from_millis(1));

    for workers in [1, 3, 10, 25, 100] {
        let driver = ConcurrencyDriver::new(workers, GENEROUS_TIMEOUT);
        let results = driver.fan_out(&batch, target.clone(), &CancellationToken::new()).await;

        assert_eq!(results.len(), batch.len(), "workers = {workers}");
        let ids: HashSet<&str> = results.iter().map(|r| r.case_id()).collect();
        assert_eq!(ids.len(), batch.len(), "duplicate or missing case ids with {workers} workers");
        assert!(results.iter().all(|r| r.is_success()));
    }
}

/// Ten 10 ms calls with ten workers overlap instead of running back to back
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_parallel_batch_takes_about_one_call() {
    let batch = descriptors("io", 10);
    let target = targets::sleeping(Duration::from_millis(10));

    let start = Instant::now();
    let results = ConcurrencyDriver::new(10, GENEROUS_TIMEOUT)
        .fan_out(&batch, target, &CancellationToken::new())
        .await;
    let elapsed = start.elapsed();

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| r.is_success()));
    assert!(results.iter().all(|r| r.elapsed() >= Duration::from_millis(10)));
    // Sequential execution would need at least 100 ms
    assert!(elapsed < Duration::from_millis(90), "batch took {elapsed:?}");
}

/// One failing case does not disturb the others
#[tokio::test]
async fn test_single_failure_is_isolated() {
    let batch = descriptors("search", 5);
    let target = targets::failing_on("case_3", Duration::from_millis(2));

    let results = ConcurrencyDriver::new(4, GENEROUS_TIMEOUT)
        .fan_out(&batch, target, &CancellationToken::new())
        .await;

    let failures: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(results.len(), 5);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].case_id(), "case_3");
    assert_eq!(failures[0].failure(), Some(FailureKind::OperationFailure));
    assert!(failures[0].error().unwrap().contains("rejected"));
    assert!(results.iter().filter(|r| r.case_id() != "case_3").all(|r| r.is_success()));
}

/// Calls that never finish are cut off at the timeout
#[tokio::test]
async fn test_hanging_calls_time_out() {
    let batch = descriptors("io", 6);
    let timeout = Duration::from_millis(50);

    let start = Instant::now();
    let results = ConcurrencyDriver::new(6, timeout)
        .fan_out(&batch, targets::hanging(), &CancellationToken::new())
        .await;
    let elapsed = start.elapsed();

    assert_eq!(results.len(), 6);
    for result in &results {
        assert_eq!(result.failure(), Some(FailureKind::Timeout));
        assert!(result.elapsed() >= timeout);
    }
    assert!(elapsed < Duration::from_secs(2), "timeouts took {elapsed:?}");
}

/// Panicking targets become failures instead of tearing down the batch
#[tokio::test]
async fn test_panics_become_operation_failures() {
    let batch = descriptors("cpu", 5);

    let results = ConcurrencyDriver::new(2, GENEROUS_TIMEOUT)
        .fan_out(&batch, targets::panicking("boom"), &CancellationToken::new())
        .await;

    assert_eq!(results.len(), 5);
    for result in &results {
        assert_eq!(result.failure(), Some(FailureKind::OperationFailure));
        assert!(result.error().unwrap().contains("boom"));
    }
}

/// No more than `workers` calls are ever in flight
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_limit_is_respected() {
    let batch = descriptors("io", 40);
    let (target, peak) = targets::concurrency_tracking(Duration::from_millis(5));

    let results = ConcurrencyDriver::new(7, GENEROUS_TIMEOUT)
        .fan_out(&batch, target, &CancellationToken::new())
        .await;

    assert_eq!(results.len(), 40);
    let peak = peak.load(std::sync::atomic::Ordering::SeqCst);
    assert!(peak <= 7, "peak concurrency {peak}");
    assert!(peak > 1);
}

/// A cancelled token turns every pending descriptor into a scheduling error
#[tokio::test]
async fn test_cancelled_before_start() {
    let batch = descriptors("io", 8);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let results = ConcurrencyDriver::new(2, GENEROUS_TIMEOUT)
        .fan_out(&batch, targets::sleeping(Duration::from_millis(1)), &cancel)
        .await;

    assert_eq!(results.len(), 8);
    for result in &results {
        assert_eq!(result.failure(), Some(FailureKind::SchedulingError));
        assert_eq!(result.error(), Some(CANCELLED_BEFORE_START));
    }
}

/// Sustained mode repeats the batch and tags every result with its round
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_sustained_rounds_until_budget() {
    let batch = descriptors("io", 4);
    let driver = ConcurrencyDriver::new(4, GENEROUS_TIMEOUT)
        .with_round_pause(Duration::from_millis(50));

    let start = Instant::now();
    let outcome = driver
        .sustained(
            &batch,
            targets::sleeping(Duration::from_millis(10)),
            Duration::from_millis(400),
            &CancellationToken::new(),
        )
        .await;
    let elapsed = start.elapsed();

    assert!(outcome.rounds > 1, "only {} round(s)", outcome.rounds);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.results.len(), outcome.rounds as usize * batch.len());
    for round in 1..=outcome.rounds {
        let in_round = outcome.results.iter().filter(|r| r.round() == round).count();
        assert_eq!(in_round, batch.len(), "round {round}");
    }
    assert!(elapsed >= Duration::from_millis(400));
    assert!(elapsed < Duration::from_millis(1000), "sustained run took {elapsed:?}");
}

/// Cancelling during the pause ends a sustained run early
#[tokio::test]
async fn test_sustained_stops_on_cancel() {
    let batch = descriptors("io", 2);
    let driver = ConcurrencyDriver::new(2, GENEROUS_TIMEOUT)
        .with_round_pause(Duration::from_secs(10));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let outcome = driver
        .sustained(&batch, targets::sleeping(Duration::from_millis(1)), Duration::from_secs(60), &cancel)
        .await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.results.len(), 2);
    assert!(start.elapsed() < Duration::from_secs(5));
}
