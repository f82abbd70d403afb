//! Service-level assessment of a [`BatchReport`].
//!
//! [`assess`] compares a report against three independent thresholds and
//! returns a [`SlaVerdict`]. The comparison is pure and deterministic:
//!
//! | Metric | Holds when |
//! |---|---|
//! | average response time | `mean_ms <= max_avg_response_ms` |
//! | throughput | `throughput_rps >= min_throughput_rps` |
//! | error rate | `error_rate <= max_error_rate` |
//!
//! A batch whose invocations all completed can still fail its SLA; the two are
//! reported separately by [`crate::runner::RunStatus`].

use crate::constants::{
    DEFAULT_MAX_AVG_RESPONSE_MS, DEFAULT_MAX_ERROR_RATE, DEFAULT_MIN_THROUGHPUT_RPS,
};
use crate::core::LoadError;
use crate::stats::BatchReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Thresholds a batch must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaThresholds {
    /// Ceiling on mean successful response time, in milliseconds
    pub max_avg_response_ms: f64,
    /// Floor on successful requests per second
    pub min_throughput_rps: f64,
    /// Ceiling on the fraction of failed invocations
    pub max_error_rate: f64,
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            max_avg_response_ms: DEFAULT_MAX_AVG_RESPONSE_MS,
            min_throughput_rps: DEFAULT_MIN_THROUGHPUT_RPS,
            max_error_rate: DEFAULT_MAX_ERROR_RATE,
        }
    }
}

impl SlaThresholds {
    /// Reject negative or non-finite thresholds.
    pub fn validate(&self) -> Result<(), LoadError> {
        let checks = [
            ("sla.max_avg_response_ms", self.max_avg_response_ms),
            ("sla.min_throughput_rps", self.min_throughput_rps),
            ("sla.max_error_rate", self.max_error_rate),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(LoadError::InvalidConfig {
                    field: field.to_string(),
                    reason: format!("must be a finite, non-negative number (got {value})"),
                });
            }
        }
        if self.max_error_rate > 1.0 {
            return Err(LoadError::InvalidConfig {
                field: "sla.max_error_rate".to_string(),
                reason: format!("is a fraction and must not exceed 1.0 (got {})", self.max_error_rate),
            });
        }
        Ok(())
    }
}

/// Metric a threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaMetric {
    /// Mean successful response time
    AvgResponseTime,
    /// Successful requests per second
    Throughput,
    /// Fraction of failed invocations
    ErrorRate,
}

impl fmt::Display for SlaMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AvgResponseTime => "average response time",
            Self::Throughput => "throughput",
            Self::ErrorRate => "error rate",
        };
        f.write_str(name)
    }
}

/// One threshold that did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaViolation {
    /// Which threshold failed
    pub metric: SlaMetric,
    /// Configured limit
    pub threshold: f64,
    /// Value measured in the batch
    pub measured: f64,
    /// How far past the limit the measurement is, always positive
    pub margin: f64,
}

impl fmt::Display for SlaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.metric {
            SlaMetric::AvgResponseTime => write!(
                f,
                "{}: {:.2} ms exceeds {:.2} ms by {:.2} ms",
                self.metric, self.measured, self.threshold, self.margin
            ),
            SlaMetric::Throughput => write!(
                f,
                "{}: {:.2} req/s is below {:.2} req/s by {:.2} req/s",
                self.metric, self.measured, self.threshold, self.margin
            ),
            SlaMetric::ErrorRate => write!(
                f,
                "{}: {:.2}% exceeds {:.2}% by {:.2} points",
                self.metric,
                self.measured * 100.0,
                self.threshold * 100.0,
                self.margin * 100.0
            ),
        }
    }
}

/// Outcome of an SLA assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaVerdict {
    /// True only when every threshold holds
    pub meets_sla: bool,
    /// Thresholds that failed, in metric order
    pub violations: Vec<SlaViolation>,
    /// Successful invocations slower than the configured slow-request
    /// threshold; informational and never part of `meets_sla`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow_requests: Option<usize>,
}

impl SlaVerdict {
    /// Attach the slow-request count.
    #[must_use]
    pub const fn with_slow_requests(mut self, count: usize) -> Self {
        self.slow_requests = Some(count);
        self
    }

    /// Violation for `metric`, if that threshold failed.
    #[must_use]
    pub fn violation(&self, metric: SlaMetric) -> Option<&SlaViolation> {
        self.violations.iter().find(|v| v.metric == metric)
    }
}

/// Evaluate each threshold in `thresholds` against `report`.
pub fn assess(report: &BatchReport, thresholds: &SlaThresholds) -> SlaVerdict {
    let mut violations = Vec::new();

    let avg = report.response_times.mean_ms;
    if avg > thresholds.max_avg_response_ms {
        violations.push(SlaViolation {
            metric: SlaMetric::AvgResponseTime,
            threshold: thresholds.max_avg_response_ms,
            measured: avg,
            margin: avg - thresholds.max_avg_response_ms,
        });
    }

    if report.throughput_rps < thresholds.min_throughput_rps {
        violations.push(SlaViolation {
            metric: SlaMetric::Throughput,
            threshold: thresholds.min_throughput_rps,
            measured: report.throughput_rps,
            margin: thresholds.min_throughput_rps - report.throughput_rps,
        });
    }

    if report.error_rate > thresholds.max_error_rate {
        violations.push(SlaViolation {
            metric: SlaMetric::ErrorRate,
            threshold: thresholds.max_error_rate,
            measured: report.error_rate,
            margin: report.error_rate - thresholds.max_error_rate,
        });
    }

    SlaVerdict {
        meets_sla: violations.is_empty(),
        violations,
        slow_requests: None,
    }
}
