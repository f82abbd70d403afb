//! Execute a sustained-load run.
//!
//! Repeats the configured batch back to back, with a fixed pause between
//! rounds, until the duration budget is spent. Results from every round are
//! combined into one report.
//!
//! # Examples
//!
//! ```bash
//! loadprobe sustained --duration 30
//! loadprobe sustained -d 120 --pause-ms 250 -w 20 --output reports
//! ```

use super::common::{RunOverrides, execute_run, load_config};
use super::{CliConfig, CommandOutcome};
use crate::config::RunMode;
use anyhow::Result;
use clap::Args;

/// Command to execute a sustained-load run.
#[derive(Args, Debug, Default)]
pub struct SustainedCommand {
    /// Wall-clock budget in seconds
    #[arg(short, long)]
    duration: Option<u64>,

    /// Pause between rounds in milliseconds
    #[arg(long = "pause-ms")]
    pause_ms: Option<u64>,

    #[command(flatten)]
    overrides: RunOverrides,
}

impl SustainedCommand {
    /// Load the configuration, force sustained mode and run it.
    pub async fn execute(self, cli: &CliConfig) -> Result<CommandOutcome> {
        let mut config = load_config(cli.config_path.as_deref())?;
        self.overrides.apply(&mut config);
        config.mode = RunMode::Sustained;
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(pause_ms) = self.pause_ms {
            config.round_pause_ms = pause_ms;
        }
        execute_run(config, cli).await
    }
}
