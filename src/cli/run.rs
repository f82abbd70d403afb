//! Execute the configured load run.
//!
//! `loadprobe run` loads the configuration, applies flag overrides and runs
//! it in whatever mode the file selects (fan-out by default). The console
//! report distinguishes failed invocations from a missed SLA; only the latter
//! changes the exit status.
//!
//! # Examples
//!
//! ```bash
//! loadprobe run                              # ./loadprobe.toml or defaults
//! loadprobe run -n 500 -w 50 --seed 7        # override batch size and workers
//! loadprobe run --output reports --raw-results
//! ```

use super::common::{RunOverrides, execute_run, load_config};
use super::{CliConfig, CommandOutcome};
use anyhow::Result;
use clap::Args;

/// Command to execute a load run.
#[derive(Args, Debug, Default)]
pub struct RunCommand {
    #[command(flatten)]
    overrides: RunOverrides,
}

impl RunCommand {
    /// Load the configuration, apply overrides and run it.
    pub async fn execute(self, cli: &CliConfig) -> Result<CommandOutcome> {
        let mut config = load_config(cli.config_path.as_deref())?;
        self.overrides.apply(&mut config);
        execute_run(config, cli).await
    }
}
