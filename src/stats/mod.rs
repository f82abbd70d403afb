//! Aggregation of invocation results into batch statistics.
//!
//! [`BatchReport::from_results`] is a pure function from a list of
//! [`InvocationResult`]s to counts, rates, throughput and a response-time
//! distribution. It makes no assumption about result order.
//!
//! # Definitions
//!
//! - **success rate** = successes ÷ total, `0.0` for an empty batch
//! - **error rate** = failures ÷ total, `0.0` for an empty batch
//! - **window** = earliest invocation start to latest invocation end. This is the
//!   wall-clock span of the whole batch, so parallel overlap is not double
//!   counted the way summing individual durations would
//! - **throughput** = successes ÷ window in seconds, `0.0` when the window is
//!   zero
//! - **percentiles** index the ascending successful durations at
//!   `floor(q * n)`; with no successful durations every response-time field is 0

use crate::constants::{P95, P99};
use crate::core::OperationKind;
use crate::invocation::InvocationResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Distribution of successful response times, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    /// Arithmetic mean
    pub mean_ms: f64,
    /// Median (mean of the two middle values for even counts)
    pub median_ms: f64,
    /// Fastest response
    pub min_ms: f64,
    /// Slowest response
    pub max_ms: f64,
    /// 95th percentile
    pub p95_ms: f64,
    /// 99th percentile
    pub p99_ms: f64,
    /// Sample standard deviation, 0 with fewer than two samples
    pub std_dev_ms: f64,
}

impl ResponseTimeStats {
    /// Compute the distribution of `durations`.
    pub fn from_durations(durations: &[Duration]) -> Self {
        let mut samples: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_by(f64::total_cmp);

        let n = samples.len();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (samples[n / 2 - 1] + samples[n / 2]) / 2.0
        } else {
            samples[n / 2]
        };
        let std_dev = if n > 1 {
            let variance =
                samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            mean_ms: mean,
            median_ms: median,
            min_ms: samples[0],
            max_ms: samples[n - 1],
            p95_ms: percentile(&samples, P95),
            p99_ms: percentile(&samples, P99),
            std_dev_ms: std_dev,
        }
    }
}

/// Value at `floor(q * n)` of an ascending, non-empty slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let index = ((q * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Aggregate of one run's invocation results.
///
/// Stateless and recomputed from the results every time; `total` always equals
/// `success + failure`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of results
    pub total: usize,
    /// Results that succeeded
    pub success: usize,
    /// Results that failed for any reason
    pub failure: usize,
    /// `success / total`
    pub success_rate: f64,
    /// `failure / total`
    pub error_rate: f64,
    /// Successful invocations per second of batch wall time
    pub throughput_rps: f64,
    /// Wall-clock span of the batch in seconds
    pub window_secs: f64,
    /// Distribution of successful response times
    pub response_times: ResponseTimeStats,
    /// Failure count per `"<TAG>: <message>"`
    pub errors: BTreeMap<String, usize>,
}

impl BatchReport {
    /// Aggregate `results` into a report.
    pub fn from_results(results: &[InvocationResult]) -> Self {
        let total = results.len();
        let success = results.iter().filter(|r| r.is_success()).count();
        let failure = total - success;

        let durations: Vec<Duration> =
            results.iter().filter(|r| r.is_success()).map(InvocationResult::elapsed).collect();

        let window_secs = batch_window(results).as_secs_f64();
        let throughput_rps = if window_secs > 0.0 && window_secs.is_finite() {
            success as f64 / window_secs
        } else {
            0.0
        };

        let mut errors = BTreeMap::new();
        for result in results.iter().filter(|r| !r.is_success()) {
            let tag = result.failure().map_or("UNKNOWN", |kind| kind.tag());
            let key = format!("{tag}: {}", result.error().unwrap_or("no error message"));
            *errors.entry(key).or_insert(0) += 1;
        }

        let (success_rate, error_rate) = if total == 0 {
            (0.0, 0.0)
        } else {
            (success as f64 / total as f64, failure as f64 / total as f64)
        };

        Self {
            total,
            success,
            failure,
            success_rate,
            error_rate,
            throughput_rps,
            window_secs,
            response_times: ResponseTimeStats::from_durations(&durations),
            errors,
        }
    }

    /// One report per operation kind, each computed over that kind's results.
    pub fn by_kind(results: &[InvocationResult]) -> BTreeMap<OperationKind, Self> {
        let mut grouped: BTreeMap<OperationKind, Vec<InvocationResult>> = BTreeMap::new();
        for result in results {
            grouped.entry(result.kind().clone()).or_default().push(result.clone());
        }
        grouped.into_iter().map(|(kind, group)| (kind, Self::from_results(&group))).collect()
    }
}

/// Number of successful invocations slower than `threshold_ms`.
pub fn count_slow_requests(results: &[InvocationResult], threshold_ms: f64) -> usize {
    results
        .iter()
        .filter(|r| r.is_success() && r.elapsed().as_secs_f64() * 1000.0 > threshold_ms)
        .count()
}

/// Span from the earliest start to the latest finish across `results`.
fn batch_window(results: &[InvocationResult]) -> Duration {
    let first_start = results.iter().map(InvocationResult::started_at).min();
    let last_finish = results.iter().map(InvocationResult::finished_at).max();
    match (first_start, last_finish) {
        (Some(start), Some(finish)) => (finish - start).to_std().unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    }
}
