//! End-to-end orchestration of a load run.
//!
//! [`LoadRunner`] wires the components together in data-flow order:
//!
//! ```text
//! WorkloadComposer -> ConcurrencyDriver -> BatchReport -> SlaVerdict
//!                            |                                 |
//!                    ResourceMonitor (before/after)            v
//!                                                   RunReport -> ReportSink
//! ```
//!
//! The only fatal errors are the ones raised before the first invocation
//! (configuration and workload validation) and a sink that fails to record the
//! finished report. Everything that happens to individual invocations ends up
//! inside the report, and a resource sample that cannot be taken only drops
//! the `resources` section.

use crate::config::{LoadConfig, RunMode};
use crate::core::{OperationDescriptor, OperationKind, TargetOperation};
use crate::driver::ConcurrencyDriver;
use crate::invocation::InvocationResult;
use crate::monitor::{ResourceAssessment, ResourceMonitor, ResourceProbe, SysinfoProbe};
use crate::sink::ReportSink;
use crate::sla::{SlaVerdict, assess};
use crate::stats::{BatchReport, count_slow_requests};
use crate::utils::progress::ProgressBar;
use crate::workload::WorkloadComposer;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Overall outcome of a run.
///
/// "Invocations failed" and "SLA not met" are separate classes: a run can
/// complete every invocation and still miss its SLA, and a run with a few
/// failures can still be within its error budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every invocation succeeded and every threshold held.
    Passed,
    /// Some invocations failed, but the SLA (error rate included) held.
    PassedWithFailures,
    /// At least one SLA threshold was violated.
    SlaNotMet,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::PassedWithFailures => f.write_str("passed with failed invocations"),
            Self::SlaNotMet => f.write_str("SLA not met"),
        }
    }
}

/// Everything recorded about one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier
    pub id: Uuid,
    /// Configured report name
    pub name: String,
    /// Scheduling mode
    pub mode: RunMode,
    /// Worker ceiling used
    pub workers: usize,
    /// When the first invocation was scheduled
    pub started_at: DateTime<Utc>,
    /// When the last result was collected
    pub finished_at: DateTime<Utc>,
    /// Rounds executed (1 for fan-out)
    pub rounds: u32,
    /// Whether the run was cut short by cancellation
    pub cancelled: bool,
    /// Aggregate over every result
    pub summary: BatchReport,
    /// Aggregate per operation kind
    pub by_kind: BTreeMap<OperationKind, BatchReport>,
    /// SLA assessment of `summary`
    pub sla: SlaVerdict,
    /// Resource usage around the run, when monitoring is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceAssessment>,
    /// Raw invocation results, in completion order
    #[serde(skip)]
    pub results: Vec<InvocationResult>,
}

impl RunReport {
    /// Classify the run.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if !self.sla.meets_sla {
            RunStatus::SlaNotMet
        } else if self.summary.failure > 0 {
            RunStatus::PassedWithFailures
        } else {
            RunStatus::Passed
        }
    }
}

/// Runs a configured load test against a target.
///
/// # Examples
///
/// ```rust,no_run
/// use loadprobe_cli::config::LoadConfig;
/// use loadprobe_cli::runner::LoadRunner;
/// use loadprobe_cli::sink::MemorySink;
/// use loadprobe_cli::targets::SimulatedTarget;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let sink = MemorySink::new();
/// let mut runner = LoadRunner::new(LoadConfig::default())?;
/// let report = runner
///     .run(Arc::new(SimulatedTarget::new()), &sink, &CancellationToken::new())
///     .await?;
/// println!("{}: {}", report.name, report.status());
/// # Ok(())
/// # }
/// ```
pub struct LoadRunner {
    config: LoadConfig,
    composer: WorkloadComposer,
    probe: Option<Box<dyn ResourceProbe>>,
    progress: Option<ProgressBar>,
}

impl LoadRunner {
    /// Validate `config` and prepare a runner.
    ///
    /// Fails before anything runs if the configuration or the workload mix is
    /// invalid.
    pub fn new(config: LoadConfig) -> Result<Self> {
        config.validate()?;
        let composer = WorkloadComposer::new(config.workload.clone())?.with_seed(config.seed);
        Ok(Self {
            config,
            composer,
            probe: None,
            progress: None,
        })
    }

    /// Sample resources through `probe` instead of the current process.
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn ResourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Report per-invocation progress on `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Configuration the runner was built with.
    #[must_use]
    pub const fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// The batch one round would execute.
    pub fn compose(&self) -> Vec<OperationDescriptor> {
        self.composer.compose(self.config.requests)
    }

    /// Execute the run, record the report in `sink` and return it.
    pub async fn run(
        &mut self,
        target: Arc<dyn TargetOperation>,
        sink: &dyn ReportSink,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let descriptors = self.compose();
        let mut monitor = self.resource_monitor()?;

        let mut driver = ConcurrencyDriver::new(self.config.workers, self.config.operation_timeout())
            .with_round_pause(self.config.round_pause());
        if let Some(progress) = &self.progress {
            driver = driver.with_progress(progress.clone());
        }

        tracing::info!(
            name = %self.config.name,
            mode = %self.config.mode,
            requests = descriptors.len(),
            workers = driver.workers(),
            "Starting load run"
        );

        if let Some(active) = monitor.as_mut() {
            if let Err(e) = active.start() {
                tracing::warn!(error = %format!("{e:#}"), "Resource monitoring disabled for this run");
                monitor = None;
            }
        }

        let started_at = Utc::now();
        let (results, rounds, cancelled) = match self.config.mode {
            RunMode::FanOut => {
                let results = driver.fan_out(&descriptors, target, cancel).await;
                (results, 1, cancel.is_cancelled())
            }
            RunMode::Sustained => {
                let outcome =
                    driver.sustained(&descriptors, target, self.config.duration(), cancel).await;
                (outcome.results, outcome.rounds, outcome.cancelled)
            }
        };
        let finished_at = Utc::now();

        // A lost final sample drops the resource section, not the run
        let resources = monitor.as_mut().and_then(|monitor| match monitor.finish() {
            Ok(assessment) => Some(assessment),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "Resource assessment skipped");
                None
            }
        });

        let summary = BatchReport::from_results(&results);
        let by_kind = BatchReport::by_kind(&results);
        let mut sla = assess(&summary, &self.config.sla);
        if let Some(threshold) = self.config.slow_request_ms {
            sla = sla.with_slow_requests(count_slow_requests(&results, threshold));
        }

        let report = RunReport {
            id: Uuid::new_v4(),
            name: self.config.name.clone(),
            mode: self.config.mode,
            workers: driver.workers(),
            started_at,
            finished_at,
            rounds,
            cancelled,
            summary,
            by_kind,
            sla,
            resources,
            results,
        };

        tracing::info!(
            total = report.summary.total,
            success = report.summary.success,
            failure = report.summary.failure,
            throughput_rps = report.summary.throughput_rps,
            status = %report.status(),
            "Load run finished"
        );

        sink.record(&report)
            .with_context(|| format!("Failed to record report '{}'", report.name))?;
        Ok(report)
    }

    fn resource_monitor(&mut self) -> Result<Option<ResourceMonitor>> {
        if !self.config.monitor_resources {
            return Ok(None);
        }
        let probe = match self.probe.take() {
            Some(probe) => probe,
            None => Box::new(SysinfoProbe::current_process()?),
        };
        Ok(Some(ResourceMonitor::new(probe, self.config.memory_ceiling_mb)))
    }
}
