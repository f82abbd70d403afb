//! Timed invocation of a single Target Operation.
//!
//! [`invoke`] runs one [`OperationDescriptor`] against a [`TargetOperation`],
//! measures it with a monotonic clock, and always produces an
//! [`InvocationResult`]. Nothing the target does can escape to the caller:
//!
//! | Target behaviour | Recorded as |
//! |---|---|
//! | returns `Ok(payload)` | success with the payload |
//! | returns `Err(e)` | [`FailureKind::OperationFailure`] with the full error chain |
//! | panics | [`FailureKind::OperationFailure`] with the panic message |
//! | exceeds the per-call budget | [`FailureKind::Timeout`]; the task is aborted |
//! | task cancelled by the runtime | [`FailureKind::SchedulingError`] |
//!
//! The operation runs on its own tokio task. That is what lets a timeout
//! abandon the call instead of awaiting it indefinitely, and what turns a panic
//! into a `JoinError` rather than unwinding through the batch.

use crate::core::{OperationDescriptor, OperationKind, TargetOperation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Failure taxonomy for a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The Target Operation returned an error or panicked.
    OperationFailure,
    /// The Target Operation exceeded its per-call budget.
    Timeout,
    /// The invocation could not be scheduled or was cancelled before running.
    SchedulingError,
}

impl FailureKind {
    /// Stable tag used in reports and error breakdowns.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::OperationFailure => "OPERATION_FAILURE",
            Self::Timeout => "TIMEOUT",
            Self::SchedulingError => "SCHEDULING_ERROR",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Outcome of executing one [`OperationDescriptor`].
///
/// Produced once by timed invocation and immutable afterwards. `elapsed` comes
/// from a monotonic clock; `started_at` is wall-clock time and is what the
/// aggregator uses to find the batch window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    case_id: String,
    kind: OperationKind,
    round: u32,
    success: bool,
    #[serde(rename = "elapsed_secs", with = "duration_secs")]
    elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    started_at: DateTime<Utc>,
}

impl InvocationResult {
    /// Record a successful invocation.
    pub fn succeeded(
        descriptor: &OperationDescriptor,
        payload: Value,
        elapsed: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id: descriptor.case_id().to_string(),
            kind: descriptor.kind().clone(),
            round: 1,
            success: true,
            elapsed,
            failure: None,
            error: None,
            payload: Some(payload),
            started_at,
        }
    }

    /// Record a failed invocation.
    pub fn failed(
        descriptor: &OperationDescriptor,
        failure: FailureKind,
        error: impl Into<String>,
        elapsed: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id: descriptor.case_id().to_string(),
            kind: descriptor.kind().clone(),
            round: 1,
            success: false,
            elapsed,
            failure: Some(failure),
            error: Some(error.into()),
            payload: None,
            started_at,
        }
    }

    /// Tag the result with the sustained-load round it belongs to.
    #[must_use]
    pub const fn in_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    /// Case identifier of the originating descriptor.
    #[must_use]
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Kind of the originating descriptor.
    #[must_use]
    pub const fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// Sustained-load round (1 for fan-out batches).
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Whether the operation succeeded within its budget.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Monotonic time spent in the invocation.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Failure classification, `None` on success.
    #[must_use]
    pub const fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Error message, `None` on success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Result payload returned by the target, `None` on failure.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Wall-clock time the invocation started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock time the invocation finished (`started_at + elapsed`).
    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        let elapsed =
            chrono::Duration::from_std(self.elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        self.started_at + elapsed
    }
}

/// Execute `descriptor` against `target`, bounded by `timeout`.
///
/// Never fails: every outcome, including panics and timeouts, becomes an
/// [`InvocationResult`].
pub async fn invoke(
    descriptor: &OperationDescriptor,
    target: Arc<dyn TargetOperation>,
    timeout: Duration,
) -> InvocationResult {
    let started_at = Utc::now();
    let start = Instant::now();

    // A target may panic while building its future, before anything is spawned
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| target.call(descriptor))) {
        Ok(future) => future,
        Err(panic) => {
            return InvocationResult::failed(
                descriptor,
                FailureKind::OperationFailure,
                format!("operation panicked: {}", panic_message(panic.as_ref())),
                start.elapsed(),
                started_at,
            );
        }
    };

    let mut handle = tokio::spawn(future);
    let outcome = tokio::time::timeout(timeout, &mut handle).await;
    let elapsed = start.elapsed();

    match outcome {
        Ok(Ok(Ok(payload))) => InvocationResult::succeeded(descriptor, payload, elapsed, started_at),
        Ok(Ok(Err(error))) => InvocationResult::failed(
            descriptor,
            FailureKind::OperationFailure,
            format!("{error:#}"),
            elapsed,
            started_at,
        ),
        Ok(Err(join_error)) if join_error.is_panic() => {
            let panic = join_error.into_panic();
            InvocationResult::failed(
                descriptor,
                FailureKind::OperationFailure,
                format!("operation panicked: {}", panic_message(panic.as_ref())),
                elapsed,
                started_at,
            )
        }
        Ok(Err(join_error)) => InvocationResult::failed(
            descriptor,
            FailureKind::SchedulingError,
            format!("task could not run to completion: {join_error}"),
            elapsed,
            started_at,
        ),
        Err(_) => {
            handle.abort();
            tracing::debug!(
                case_id = descriptor.case_id(),
                timeout_ms = timeout.as_millis() as u64,
                "Invocation timed out; abandoning task"
            );
            InvocationResult::failed(
                descriptor,
                FailureKind::Timeout,
                format!("operation did not complete within {} ms", timeout.as_millis()),
                elapsed,
                started_at,
            )
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
