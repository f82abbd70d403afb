//! Global constants used throughout the loadprobe codebase.
//!
//! This module contains default worker counts, timeouts, SLA thresholds and
//! other numeric constants shared by the configuration layer and the core.
//! Defining them centrally keeps magic numbers discoverable.

use std::time::Duration;

/// Default number of invocations kept in flight at once.
pub const DEFAULT_WORKERS: usize = 10;

/// Default number of descriptors in a fan-out batch.
pub const DEFAULT_REQUESTS: usize = 10;

/// Default per-invocation timeout (30 seconds).
///
/// Any Target Operation still running after this budget is abandoned and
/// recorded as a `TIMEOUT` failure.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wall-clock budget of a sustained-load run (60 seconds).
pub const DEFAULT_SUSTAINED_DURATION: Duration = Duration::from_secs(60);

/// Fixed pause inserted between sustained-load rounds (1 second).
pub const DEFAULT_ROUND_PAUSE: Duration = Duration::from_secs(1);

/// Default SLA ceiling on mean response time, in milliseconds.
pub const DEFAULT_MAX_AVG_RESPONSE_MS: f64 = 5_000.0;

/// Default SLA floor on throughput, in successful requests per second.
pub const DEFAULT_MIN_THROUGHPUT_RPS: f64 = 0.0;

/// Default SLA ceiling on error rate (5%).
pub const DEFAULT_MAX_ERROR_RATE: f64 = 0.05;

/// Memory growth across a batch above which the monitor flags an anomaly (100 MB).
pub const DEFAULT_MEMORY_CEILING_MB: f64 = 100.0;

/// Tolerance applied when flooring `count * ratio` and when checking that
/// workload ratios sum to at most 1.0.
pub const RATIO_EPSILON: f64 = 1e-9;

/// Percentile used for the p95 response-time figure.
pub const P95: f64 = 0.95;

/// Percentile used for the p99 response-time figure.
pub const P99: f64 = 0.99;

/// File name written by `loadprobe init` and searched for by default.
pub const DEFAULT_CONFIG_FILE: &str = "loadprobe.toml";
