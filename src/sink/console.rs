//! Human-readable report output.

use super::ReportSink;
use crate::runner::{RunReport, RunStatus};
use crate::stats::BatchReport;
use anyhow::Result;
use colored::Colorize;
use std::fmt::Write as _;

/// Prints a summary of each report to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    /// Also print one line per operation kind
    pub per_kind: bool,
}

impl ConsoleSink {
    /// Sink printing the summary and the per-kind table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            per_kind: true,
        }
    }

    /// Render `report` as it would be printed.
    #[must_use]
    pub fn render(&self, report: &RunReport) -> String {
        let mut out = String::new();
        let s = &report.summary;
        let rt = &s.response_times;

        let _ = writeln!(out, "{}", format!("Load run '{}' ({})", report.name, report.mode).bold());
        let _ = writeln!(
            out,
            "  {} invocations, {} workers, {} round(s){}",
            s.total,
            report.workers,
            report.rounds,
            if report.cancelled { ", cancelled" } else { "" }
        );
        let _ = writeln!(
            out,
            "  success {} / failure {} ({:.1}% success), {:.2} req/s over {:.2}s",
            s.success,
            s.failure,
            s.success_rate * 100.0,
            s.throughput_rps,
            s.window_secs
        );
        let _ = writeln!(
            out,
            "  response ms: mean {:.2}  median {:.2}  min {:.2}  max {:.2}  p95 {:.2}  p99 {:.2}  stddev {:.2}",
            rt.mean_ms, rt.median_ms, rt.min_ms, rt.max_ms, rt.p95_ms, rt.p99_ms, rt.std_dev_ms
        );

        if self.per_kind && report.by_kind.len() > 1 {
            for (kind, sub) in &report.by_kind {
                let _ = writeln!(out, "    {}", kind_line(kind.as_str(), sub));
            }
        }

        if !s.errors.is_empty() {
            let _ = writeln!(out, "  {}", "Errors:".yellow());
            for (message, count) in &s.errors {
                let _ = writeln!(out, "    {count:>5}  {message}");
            }
        }

        if let Some(resources) = &report.resources {
            let line = format!(
                "  memory {:.1} MB -> {:.1} MB ({:+.1} MB, ceiling {:.1} MB)",
                resources.before.memory_mb,
                resources.after.memory_mb,
                resources.delta.memory_mb,
                resources.memory_ceiling_mb
            );
            if resources.anomaly {
                let _ = writeln!(out, "{}", line.red());
            } else {
                let _ = writeln!(out, "{line}");
            }
        }

        if let Some(slow) = report.sla.slow_requests {
            let _ = writeln!(out, "  slow requests: {slow}");
        }
        for violation in &report.sla.violations {
            let _ = writeln!(out, "  {} {violation}", "✗".red());
        }

        let status = match report.status() {
            RunStatus::Passed => "PASSED".green().bold(),
            RunStatus::PassedWithFailures => "PASSED (with failed invocations)".yellow().bold(),
            RunStatus::SlaNotMet => "SLA NOT MET".red().bold(),
        };
        let _ = writeln!(out, "  Result: {status}");
        out
    }
}

fn kind_line(kind: &str, report: &BatchReport) -> String {
    format!(
        "{kind:<12} {:>6} ok {:>6} failed  mean {:>9.2} ms  p95 {:>9.2} ms",
        report.success, report.failure, report.response_times.mean_ms, report.response_times.p95_ms
    )
}

impl ReportSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn record(&self, report: &RunReport) -> Result<()> {
        print!("{}", self.render(report));
        Ok(())
    }
}
