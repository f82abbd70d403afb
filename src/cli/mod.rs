//! Command-line interface for loadprobe.
//!
//! Each subcommand lives in its own module with its own argument struct and
//! `execute` method. Shared run plumbing (config loading, flag overrides,
//! sinks, progress, Ctrl-C) is in [`common`].
//!
//! # Available Commands
//!
//! - `run` - Execute the configured load run (fan-out unless the file says otherwise)
//! - `sustained` - Execute a duration-based sustained-load run
//! - `init` - Write a commented default `loadprobe.toml`
//! - `validate` - Check a configuration and show the workload it would produce
//!
//! # Exit status
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | run completed and met its SLA |
//! | 1 | fatal error (bad configuration, invalid workload, sink failure) |
//! | 2 | run completed but did not meet its SLA |
//!
//! # Examples
//!
//! ```bash
//! loadprobe init
//! loadprobe run --workers 20 --requests 200
//! loadprobe sustained --duration 30 --output reports
//! loadprobe --config ci/loadprobe.toml validate
//! ```

pub mod common;
pub mod init;
pub mod run;
pub mod sustained;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing to report beyond success.
    Success,
    /// A load run completed but failed its SLA assessment.
    SlaNotMet,
}

impl CommandOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::SlaNotMet => 2,
        }
    }
}

/// Settings derived from the global flags.
///
/// Passed explicitly to commands instead of being written to the process
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter for the tracing subscriber; `None` keeps `RUST_LOG` or the default
    pub log_level: Option<String>,
    /// Disable progress bars
    pub no_progress: bool,
    /// Suppress the console report
    pub quiet: bool,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Configuration with every option at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Concurrent load generation and SLA assessment.
#[derive(Parser)]
#[command(
    name = "loadprobe",
    about = "Drive concurrent load against a target and assess it against SLA thresholds",
    version,
    author,
    long_about = "loadprobe runs batches of timed operations with bounded parallelism, aggregates \
                  response-time statistics and checks them against service-level thresholds."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    ///
    /// Equivalent to `RUST_LOG=debug`. Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors; the console report is suppressed.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file (default: ./loadprobe.toml when present).
    #[arg(short, long, global = true, env = "LOADPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Disable progress bars and spinners.
    ///
    /// Progress is also hidden automatically when stderr is not a terminal.
    #[arg(
        long,
        global = true,
        env = "LOADPROBE_NO_PROGRESS",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Execute a load run as configured.
    Run(run::RunCommand),

    /// Execute a sustained-load run for a fixed duration.
    Sustained(sustained::SustainedCommand),

    /// Create a default loadprobe.toml.
    Init(init::InitCommand),

    /// Validate a configuration without sending any load.
    Validate(validate::ValidateCommand),
}

impl Cli {
    /// Execute the parsed command with the configuration from its global flags.
    pub async fn execute(self) -> Result<CommandOutcome> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            quiet: self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Execute the command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<CommandOutcome> {
        match self.command {
            Commands::Run(cmd) => cmd.execute(&config).await,
            Commands::Sustained(cmd) => cmd.execute(&config).await,
            Commands::Init(cmd) => cmd.execute().await.map(|()| CommandOutcome::Success),
            Commands::Validate(cmd) => cmd.execute(&config).await.map(|()| CommandOutcome::Success),
        }
    }
}
