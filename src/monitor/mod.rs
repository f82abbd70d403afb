//! Process resource sampling around a batch.
//!
//! The monitor takes a [`ResourceSample`] before and after a batch, computes
//! the [`ResourceDelta`] between them and flags an anomaly when memory grew by
//! more than a configured ceiling. It only observes; scheduling is never
//! affected by what it measures.
//!
//! Sampling goes through the [`ResourceProbe`] trait so tests can substitute
//! fixed readings. [`SysinfoProbe`] reads the current process from the OS.

use crate::constants::DEFAULT_MEMORY_CEILING_MB;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Process memory and optional CPU usage at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Resident memory in megabytes
    pub memory_mb: f64,
    /// CPU usage in percent of one core, when the probe can measure it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f32>,
    /// When the sample was taken
    pub taken_at: DateTime<Utc>,
}

impl ResourceSample {
    /// Build a sample taken now.
    pub fn now(memory_mb: f64, cpu_percent: Option<f32>) -> Self {
        Self {
            memory_mb,
            cpu_percent,
            taken_at: Utc::now(),
        }
    }
}

/// Difference between an "after" and a "before" sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceDelta {
    /// Memory growth in megabytes (negative when memory was released)
    pub memory_mb: f64,
    /// Change in CPU usage, when both samples carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f32>,
}

impl ResourceDelta {
    /// `after - before`.
    pub fn between(before: &ResourceSample, after: &ResourceSample) -> Self {
        Self {
            memory_mb: after.memory_mb - before.memory_mb,
            cpu_percent: match (before.cpu_percent, after.cpu_percent) {
                (Some(b), Some(a)) => Some(a - b),
                _ => None,
            },
        }
    }
}

/// Source of resource samples.
pub trait ResourceProbe: Send + Sync {
    /// Take a sample of the current process.
    fn sample(&self) -> Result<ResourceSample>;
}

/// Samples the current process through `sysinfo`.
///
/// CPU usage is computed by `sysinfo` from the time between two refreshes, so
/// the very first sample taken by a probe reports 0%.
pub struct SysinfoProbe {
    pid: Pid,
    system: Mutex<System>,
}

impl SysinfoProbe {
    /// Create a probe for the running process.
    pub fn current_process() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("Failed to determine the current process id")?;
        Ok(Self {
            pid,
            system: Mutex::new(System::new()),
        })
    }
}

impl ResourceProbe for SysinfoProbe {
    fn sample(&self) -> Result<ResourceSample> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| anyhow::anyhow!("resource probe lock was poisoned"))?;
        system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        let process = system
            .process(self.pid)
            .with_context(|| format!("Process {} is not visible to the resource probe", self.pid))?;

        Ok(ResourceSample::now(
            process.memory() as f64 / BYTES_PER_MB,
            Some(process.cpu_usage()),
        ))
    }
}

/// Before/after comparison for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssessment {
    /// Sample taken before the first invocation
    pub before: ResourceSample,
    /// Sample taken after the last result was collected
    pub after: ResourceSample,
    /// `after - before`
    pub delta: ResourceDelta,
    /// Memory growth allowed before flagging an anomaly
    pub memory_ceiling_mb: f64,
    /// Whether memory grew by more than the ceiling
    pub anomaly: bool,
}

/// Brackets a batch with resource samples.
///
/// # Examples
///
/// ```rust,no_run
/// use loadprobe_cli::monitor::{ResourceMonitor, SysinfoProbe};
///
/// # fn example() -> anyhow::Result<()> {
/// let mut monitor = ResourceMonitor::new(Box::new(SysinfoProbe::current_process()?), 100.0);
/// monitor.start()?;
/// // ... run the batch ...
/// let assessment = monitor.finish()?;
/// if assessment.anomaly {
///     eprintln!("memory grew by {:.1} MB", assessment.delta.memory_mb);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ResourceMonitor {
    probe: Box<dyn ResourceProbe>,
    memory_ceiling_mb: f64,
    before: Option<ResourceSample>,
}

impl ResourceMonitor {
    /// Create a monitor flagging memory growth above `memory_ceiling_mb`.
    pub fn new(probe: Box<dyn ResourceProbe>, memory_ceiling_mb: f64) -> Self {
        Self {
            probe,
            memory_ceiling_mb,
            before: None,
        }
    }

    /// Monitor backed by [`SysinfoProbe`] with the default ceiling.
    pub fn for_current_process() -> Result<Self> {
        Ok(Self::new(Box::new(SysinfoProbe::current_process()?), DEFAULT_MEMORY_CEILING_MB))
    }

    /// Take the "before" sample.
    pub fn start(&mut self) -> Result<ResourceSample> {
        let sample = self.probe.sample().context("Failed to take the baseline resource sample")?;
        tracing::debug!(memory_mb = sample.memory_mb, "Baseline resource sample");
        self.before = Some(sample);
        Ok(sample)
    }

    /// Take the "after" sample and compare it with the baseline.
    ///
    /// Without a prior [`start`](Self::start), the baseline is taken now and
    /// the delta is therefore near zero.
    pub fn finish(&mut self) -> Result<ResourceAssessment> {
        let before = match self.before.take() {
            Some(sample) => sample,
            None => self.probe.sample().context("Failed to take the baseline resource sample")?,
        };
        let after = self.probe.sample().context("Failed to take the final resource sample")?;
        let delta = ResourceDelta::between(&before, &after);
        let anomaly = delta.memory_mb > self.memory_ceiling_mb;

        if anomaly {
            tracing::warn!(
                delta_mb = delta.memory_mb,
                ceiling_mb = self.memory_ceiling_mb,
                "Memory grew beyond the configured ceiling during the batch"
            );
        } else {
            tracing::debug!(delta_mb = delta.memory_mb, "Resource delta within ceiling");
        }

        Ok(ResourceAssessment {
            before,
            after,
            delta,
            memory_ceiling_mb: self.memory_ceiling_mb,
            anomaly,
        })
    }
}
