//! Plumbing shared by the commands that execute load runs.

use super::{CliConfig, CommandOutcome};
use crate::config::{LoadConfig, RunMode};
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::runner::{LoadRunner, RunStatus};
use crate::sink::{ConsoleSink, JsonFileSink, SinkSet};
use crate::targets::build_target;
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Flags that override values from the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunOverrides {
    /// Report name
    #[arg(long)]
    pub name: Option<String>,

    /// Descriptors per batch
    #[arg(short = 'n', long)]
    pub requests: Option<usize>,

    /// Maximum invocations in flight
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-invocation timeout in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Seed for deterministic workload shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory to write the JSON report to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include every invocation result in the JSON report
    #[arg(long)]
    pub raw_results: bool,

    /// Skip process memory sampling
    #[arg(long)]
    pub no_monitor: bool,
}

impl RunOverrides {
    /// Apply every flag that was given to `config`.
    pub fn apply(&self, config: &mut LoadConfig) {
        if let Some(name) = &self.name {
            config.name.clone_from(name);
        }
        if let Some(requests) = self.requests {
            config.requests = requests;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.operation_timeout_ms = timeout_ms;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(output) = &self.output {
            config.output.dir = Some(output.clone());
        }
        if self.raw_results {
            config.output.raw_results = true;
        }
        if self.no_monitor {
            config.monitor_resources = false;
        }
    }
}

/// Load the configuration the CLI should use.
///
/// An explicit path must exist. Without one, `./loadprobe.toml` is used when
/// present and the built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadConfig> {
    if let Some(path) = explicit {
        return LoadConfig::load(path);
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        LoadConfig::load(default_path)
    } else {
        tracing::debug!("No {DEFAULT_CONFIG_FILE} found; using built-in defaults");
        Ok(LoadConfig::default())
    }
}

/// Run `config` against its configured target and report the outcome.
pub async fn execute_run(config: LoadConfig, cli: &CliConfig) -> Result<CommandOutcome> {
    let target = build_target(&config.target)?;

    let mut sinks = SinkSet::new();
    if !cli.quiet {
        sinks = sinks.with(Box::new(ConsoleSink::new()));
    }
    if let Some(dir) = &config.output.dir {
        sinks = sinks.with(Box::new(
            JsonFileSink::new(dir).with_raw_results(config.output.raw_results),
        ));
    }

    let runner = LoadRunner::new(config)?;
    let config = runner.config();
    let visible = !cli.no_progress && !cli.quiet && std::io::stderr().is_terminal();
    let progress = match config.mode {
        RunMode::FanOut => ProgressBar::new(config.requests as u64, visible),
        RunMode::Sustained => ProgressBar::new_spinner(visible),
    };
    progress.set_message(format!("{} ({})", config.name, config.mode));
    let mut runner = runner.with_progress(progress.clone());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt_watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing in-flight invocations");
            on_interrupt.cancel();
        }
    });

    let outcome = runner.run(target, &sinks, &cancel).await;
    interrupt_watcher.abort();
    progress.finish_and_clear();

    let report = outcome.context("Load run did not complete")?;
    Ok(match report.status() {
        RunStatus::SlaNotMet => CommandOutcome::SlaNotMet,
        RunStatus::Passed | RunStatus::PassedWithFailures => CommandOutcome::Success,
    })
}

/// Print a green check line unless quiet.
pub fn print_success(cli: &CliConfig, message: &str) {
    if !cli.quiet {
        println!("{} {message}", "✓".green());
    }
}
