//! JSON report files.

use super::ReportSink;
use crate::core::LoadError;
use crate::invocation::InvocationResult;
use crate::runner::RunReport;
use crate::utils::fs::{atomic_write, ensure_dir};
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const RUN_SUFFIX_LEN: usize = 8;

#[derive(Serialize)]
struct ReportFile<'a> {
    report: &'a RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_results: Option<&'a [InvocationResult]>,
}

/// Writes each report to `<dir>/<name>_<YYYYmmdd_HHMMSS>_<run>.json`.
///
/// The timestamp is the run's start time and `<run>` the first eight hex
/// digits of the run id, so runs started in the same second keep separate
/// files. Files are written through a
/// temporary file and renamed into place, so a reader never sees a partial
/// report.
#[derive(Debug)]
pub struct JsonFileSink {
    dir: PathBuf,
    raw_results: bool,
    written: Mutex<Vec<PathBuf>>,
}

impl JsonFileSink {
    /// Write reports into `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            raw_results: false,
            written: Mutex::new(Vec::new()),
        }
    }

    /// Include every invocation result under `raw_results`.
    #[must_use]
    pub const fn with_raw_results(mut self, raw_results: bool) -> Self {
        self.raw_results = raw_results;
        self
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the files written so far.
    #[must_use]
    pub fn written(&self) -> Vec<PathBuf> {
        self.written.lock().map(|paths| paths.clone()).unwrap_or_default()
    }

    /// File a report will be written to.
    #[must_use]
    pub fn path_for(&self, report: &RunReport) -> PathBuf {
        let stamp = report.started_at.format("%Y%m%d_%H%M%S");
        let run = report.id.simple().to_string();
        self.dir.join(format!("{}_{stamp}_{}.json", report.name, &run[..RUN_SUFFIX_LEN]))
    }

    fn sink_error(&self, reason: String) -> anyhow::Error {
        LoadError::SinkError {
            sink: self.name().to_string(),
            reason,
        }
        .into()
    }
}

impl ReportSink for JsonFileSink {
    fn name(&self) -> &str {
        "json"
    }

    fn record(&self, report: &RunReport) -> Result<()> {
        ensure_dir(&self.dir).map_err(|e| self.sink_error(format!("{e:#}")))?;

        let file = ReportFile {
            report,
            raw_results: self.raw_results.then_some(report.results.as_slice()),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| self.sink_error(format!("failed to serialize report: {e}")))?;

        let path = self.path_for(report);
        atomic_write(&path, content.as_bytes()).map_err(|e| self.sink_error(format!("{e:#}")))?;
        tracing::info!(path = %path.display(), "Wrote JSON report");

        if let Ok(mut written) = self.written.lock() {
            written.push(path);
        }
        Ok(())
    }
}
