//! Report sinks.
//!
//! A [`ReportSink`] receives the finished [`RunReport`], including its per-kind
//! sub-reports. The runner calls [`ReportSink::record`] exactly once per run.
//!
//! | Sink | Effect |
//! |---|---|
//! | [`MemorySink`] | keeps reports in memory, for tests and embedding |
//! | [`JsonFileSink`] | writes `<dir>/<name>_<YYYYmmdd_HHMMSS>_<run>.json` atomically |
//! | [`ConsoleSink`] | prints a human-readable summary to stdout |
//! | [`SinkSet`] | forwards to several sinks in order |

mod console;
mod json;

pub use console::ConsoleSink;
pub use json::JsonFileSink;

use crate::runner::RunReport;
use anyhow::Result;
use std::sync::Mutex;

/// Destination for finished run reports.
pub trait ReportSink: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &str;

    /// Persist or display `report`.
    fn record(&self, report: &RunReport) -> Result<()>;
}

/// Collects reports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<RunReport>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every report recorded so far.
    #[must_use]
    pub fn reports(&self) -> Vec<RunReport> {
        self.reports.lock().map(|reports| reports.clone()).unwrap_or_default()
    }
}

impl ReportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn record(&self, report: &RunReport) -> Result<()> {
        self.reports
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock was poisoned"))?
            .push(report.clone());
        Ok(())
    }
}

/// Forwards each report to every contained sink.
///
/// All sinks are tried even if one fails; the first failure is returned.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl SinkSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[must_use]
    pub fn with(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of sinks in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether the set has no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for SinkSet {
    fn name(&self) -> &str {
        "set"
    }

    fn record(&self, report: &RunReport) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(error) = sink.record(report) {
                tracing::warn!(sink = sink.name(), "Report sink failed: {error:#}");
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
