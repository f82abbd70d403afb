//! Bounded-parallelism execution of invocation batches.
//!
//! The [`ConcurrencyDriver`] runs a batch of descriptors through timed
//! invocation with at most `workers` invocations in flight at any instant. It
//! has two modes:
//!
//! - [`ConcurrencyDriver::fan_out`] schedules a whole batch at once and returns
//!   when every descriptor has a result
//! - [`ConcurrencyDriver::sustained`] repeats fan-out rounds back to back, with a
//!   fixed pause between rounds, until a wall-clock budget is spent
//!
//! # Scheduling model
//!
//! Batches are driven as a `futures` stream with `buffer_unordered(workers)`.
//! The stream only polls the next invocation once a slot frees up, so the
//! worker count is a hard in-flight ceiling, and results are yielded in
//! completion order. Results are collected by the single stream consumer;
//! no worker touches shared mutable state.
//!
//! # Cancellation
//!
//! Every entry point takes a [`CancellationToken`]. Once it fires, no further
//! invocations are started: in-flight invocations run to completion or to
//! their timeout, and descriptors that never started are recorded as
//! `SCHEDULING_ERROR` results so the result count always equals the number of
//! descriptors submitted.

use crate::constants::DEFAULT_ROUND_PAUSE;
use crate::core::{OperationDescriptor, TargetOperation};
use crate::invocation::{FailureKind, InvocationResult, invoke};
use crate::utils::progress::ProgressBar;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Message recorded for descriptors skipped because the run was cancelled.
pub const CANCELLED_BEFORE_START: &str = "cancelled before start";

/// Combined outcome of a sustained-load run.
#[derive(Debug, Clone)]
pub struct SustainedOutcome {
    /// Results of every round, in completion order
    pub results: Vec<InvocationResult>,
    /// Number of rounds started
    pub rounds: u32,
    /// Wall-clock time from the first round to the end of the loop
    pub elapsed: Duration,
    /// Whether the loop ended because the token fired rather than the budget
    pub cancelled: bool,
}

/// Runs invocation batches with bounded parallelism.
///
/// # Examples
///
/// ```rust,no_run
/// use loadprobe_cli::core::{FnTarget, OperationDescriptor, TargetOperation};
/// use loadprobe_cli::driver::ConcurrencyDriver;
/// use serde_json::Value;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let target: Arc<dyn TargetOperation> =
///     Arc::new(FnTarget::new(|_| async { Ok::<_, anyhow::Error>(Value::Null) }));
/// let batch: Vec<_> = (0..20)
///     .map(|i| OperationDescriptor::new(format!("io_{i}"), "io", Value::Null))
///     .collect();
///
/// let driver = ConcurrencyDriver::new(5, Duration::from_secs(2));
/// let results = driver.fan_out(&batch, target, &CancellationToken::new()).await;
/// assert_eq!(results.len(), 20);
/// # }
/// ```
#[derive(Clone)]
pub struct ConcurrencyDriver {
    workers: usize,
    operation_timeout: Duration,
    round_pause: Duration,
    progress: Option<ProgressBar>,
}

impl ConcurrencyDriver {
    /// Create a driver with `workers` concurrent slots (at least 1) and a
    /// per-invocation timeout.
    pub fn new(workers: usize, operation_timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            operation_timeout,
            round_pause: DEFAULT_ROUND_PAUSE,
            progress: None,
        }
    }

    /// Set the fixed pause inserted between sustained-load rounds.
    #[must_use]
    pub const fn with_round_pause(mut self, pause: Duration) -> Self {
        self.round_pause = pause;
        self
    }

    /// Advance `progress` by one for every completed invocation.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Number of invocations allowed in flight at once.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Run every descriptor once with at most `workers` in flight.
    ///
    /// Returns exactly one result per descriptor, in completion order. Callers
    /// must not assume submission order is preserved.
    pub async fn fan_out(
        &self,
        descriptors: &[OperationDescriptor],
        target: Arc<dyn TargetOperation>,
        cancel: &CancellationToken,
    ) -> Vec<InvocationResult> {
        self.run_round(descriptors, target, cancel, 1).await
    }

    /// Repeat fan-out rounds over `descriptors` until `budget` has elapsed.
    ///
    /// The budget is checked before each round and the pause between rounds is
    /// cut short at the deadline, so the loop ends at most one round (bounded by
    /// the per-invocation timeout) past the budget. Cancelling the token ends
    /// the loop after the current round.
    pub async fn sustained(
        &self,
        descriptors: &[OperationDescriptor],
        target: Arc<dyn TargetOperation>,
        budget: Duration,
        cancel: &CancellationToken,
    ) -> SustainedOutcome {
        let start = Instant::now();
        let deadline = start + budget;
        let mut results = Vec::new();
        let mut rounds = 0u32;

        tracing::info!(
            budget_ms = budget.as_millis() as u64,
            batch = descriptors.len(),
            workers = self.workers,
            "Starting sustained load"
        );

        while Instant::now() < deadline && !cancel.is_cancelled() {
            rounds += 1;
            tracing::debug!(round = rounds, "Starting sustained-load round");

            let round_results = self.run_round(descriptors, Arc::clone(&target), cancel, rounds).await;
            results.extend(round_results);

            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let resume_at = std::cmp::min(now + self.round_pause, deadline);
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep_until(resume_at) => {}
            }
        }

        let elapsed = start.elapsed();
        tracing::info!(
            rounds,
            invocations = results.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Sustained load finished"
        );

        SustainedOutcome {
            results,
            rounds,
            elapsed,
            cancelled: cancel.is_cancelled(),
        }
    }

    async fn run_round(
        &self,
        descriptors: &[OperationDescriptor],
        target: Arc<dyn TargetOperation>,
        cancel: &CancellationToken,
        round: u32,
    ) -> Vec<InvocationResult> {
        let timeout = self.operation_timeout;

        stream::iter(descriptors)
            .map(|descriptor| {
                let target = Arc::clone(&target);
                let progress = self.progress.clone();
                async move {
                    // Checked when a slot frees up, not at submission time
                    let result = if cancel.is_cancelled() {
                        InvocationResult::failed(
                            descriptor,
                            FailureKind::SchedulingError,
                            CANCELLED_BEFORE_START,
                            Duration::ZERO,
                            Utc::now(),
                        )
                    } else {
                        invoke(descriptor, target, timeout).await
                    };

                    if let Some(progress) = progress {
                        progress.inc(1);
                    }
                    result.in_round(round)
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await
    }
}
