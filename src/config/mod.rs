//! Run configuration.
//!
//! A load run is described by a single [`LoadConfig`] value. The CLI builds it
//! from `loadprobe.toml` plus command-line overrides; library callers can
//! construct it directly. Nothing in the core reads files or environment
//! variables, so the same configuration always produces the same run.
//!
//! # Modules
//!
//! - `parser` - Generic TOML parsing with typed, path-carrying errors
//!
//! # File format
//!
//! Every key is optional; missing keys take the defaults from
//! [`crate::constants`].
//!
//! ```toml
//! name = "checkout-smoke"
//! mode = "fan-out"            # or "sustained"
//! requests = 100              # descriptors per batch
//! workers = 10                # invocations in flight at once
//! operation_timeout_ms = 5000
//! duration_secs = 60          # sustained mode only
//! round_pause_ms = 1000       # sustained mode only
//! seed = 42                   # deterministic shuffling
//! memory_ceiling_mb = 100.0
//! slow_request_ms = 500.0
//!
//! [sla]
//! max_avg_response_ms = 200.0
//! min_throughput_rps = 20.0
//! max_error_rate = 0.05
//!
//! [[workload]]
//! kind = "io"
//! ratio = 0.6
//! params = { latency_ms = 20 }
//!
//! [[workload]]
//! kind = "cpu"
//! ratio = 0.4
//!
//! [target]
//! kind = "simulated"          # or "http" with url = "..."
//!
//! [output]
//! dir = "reports"
//! raw_results = false
//! ```

mod parser;

pub use parser::parse_config;

use crate::constants::{
    DEFAULT_MEMORY_CEILING_MB, DEFAULT_OPERATION_TIMEOUT, DEFAULT_REQUESTS, DEFAULT_ROUND_PAUSE,
    DEFAULT_SUSTAINED_DURATION, DEFAULT_WORKERS,
};
use crate::core::LoadError;
use crate::sla::SlaThresholds;
use crate::targets::TargetConfig;
use crate::workload::{KindMix, WorkloadComposer};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the driver schedules a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// One batch, all descriptors at once.
    #[default]
    FanOut,
    /// Back-to-back batches until the duration budget is spent.
    Sustained,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FanOut => f.write_str("fan-out"),
            Self::Sustained => f.write_str("sustained"),
        }
    }
}

/// Where reports are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for JSON reports; no file is written when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Include every invocation result in the JSON report
    pub raw_results: bool,
}

/// Complete description of a load run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Report name, also used as the JSON report file prefix
    pub name: String,
    /// Fan-out or sustained scheduling
    pub mode: RunMode,
    /// Descriptors per batch
    pub requests: usize,
    /// Maximum invocations in flight
    pub workers: usize,
    /// Per-invocation budget in milliseconds
    pub operation_timeout_ms: u64,
    /// Sustained-load budget in seconds
    pub duration_secs: u64,
    /// Pause between sustained rounds in milliseconds
    pub round_pause_ms: u64,
    /// Shuffle seed; random when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Memory growth tolerated before the monitor flags an anomaly
    pub memory_ceiling_mb: f64,
    /// Successful invocations slower than this are counted as slow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_request_ms: Option<f64>,
    /// Sample process memory around the run
    pub monitor_resources: bool,
    /// SLA thresholds
    pub sla: SlaThresholds,
    /// Workload mix
    pub workload: Vec<KindMix>,
    /// Target to drive
    pub target: TargetConfig,
    /// Report output
    pub output: OutputConfig,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            name: "loadprobe".to_string(),
            mode: RunMode::FanOut,
            requests: DEFAULT_REQUESTS,
            workers: DEFAULT_WORKERS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT.as_millis() as u64,
            duration_secs: DEFAULT_SUSTAINED_DURATION.as_secs(),
            round_pause_ms: DEFAULT_ROUND_PAUSE.as_millis() as u64,
            seed: None,
            memory_ceiling_mb: DEFAULT_MEMORY_CEILING_MB,
            slow_request_ms: None,
            monitor_resources: true,
            sla: SlaThresholds::default(),
            workload: default_workload(),
            target: TargetConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// The classic mixed-traffic split: 40% cpu, 30% io, 30% search.
pub fn default_workload() -> Vec<KindMix> {
    vec![KindMix::new("cpu", 0.4), KindMix::new("io", 0.3), KindMix::new("search", 0.3)]
}

impl LoadConfig {
    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = parse_config(path)?;
        tracing::debug!(path = %path.display(), name = %config.name, "Loaded configuration");
        Ok(config)
    }

    /// Per-invocation timeout.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Sustained-load budget.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Pause between sustained rounds.
    #[must_use]
    pub const fn round_pause(&self) -> Duration {
        Duration::from_millis(self.round_pause_ms)
    }

    /// Check every value before a run starts.
    ///
    /// # Errors
    ///
    /// [`LoadError::InvalidConfig`] for out-of-range values and
    /// [`LoadError::InvalidWorkload`] for a mix the composer would reject.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: &str| LoadError::InvalidConfig {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty").into());
        }
        if self.name.contains(['/', '\\']) {
            return Err(invalid("name", "must not contain path separators").into());
        }
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1").into());
        }
        if self.requests == 0 {
            return Err(invalid("requests", "must be at least 1").into());
        }
        if self.operation_timeout_ms == 0 {
            return Err(invalid("operation_timeout_ms", "must be greater than 0").into());
        }
        if self.mode == RunMode::Sustained && self.duration_secs == 0 {
            return Err(invalid("duration_secs", "must be greater than 0 in sustained mode").into());
        }
        if !self.memory_ceiling_mb.is_finite() || self.memory_ceiling_mb < 0.0 {
            return Err(invalid("memory_ceiling_mb", "must be a finite, non-negative number").into());
        }
        if self.slow_request_ms.is_some_and(|slow| !slow.is_finite() || slow < 0.0) {
            return Err(invalid("slow_request_ms", "must be a finite, non-negative number").into());
        }

        self.sla.validate()?;
        WorkloadComposer::new(self.workload.clone())?;
        Ok(())
    }
}
