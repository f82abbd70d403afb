//! Validate a configuration without sending load.
//!
//! Parses the file, checks every value and builds the workload composer, then
//! prints the per-kind split one batch would have. Nothing is invoked.

use super::CliConfig;
use super::common::{print_success, load_config};
use crate::workload::WorkloadComposer;
use anyhow::Result;
use clap::Args;

/// Command to validate a configuration.
#[derive(Args, Debug, Default)]
pub struct ValidateCommand {
    /// Print the validated configuration as JSON
    #[arg(long)]
    json: bool,
}

impl ValidateCommand {
    /// Validate and describe the configuration.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = load_config(cli.config_path.as_deref())?;
        config.validate()?;
        let composer = WorkloadComposer::new(config.workload.clone())?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }

        print_success(cli, &format!("Configuration '{}' is valid", config.name));
        if !cli.quiet {
            println!(
                "  mode {}, {} requests, {} workers, {} ms timeout",
                config.mode, config.requests, config.workers, config.operation_timeout_ms
            );
            for (kind, count) in composer.plan(config.requests) {
                println!("    {kind:<12} {count:>6}");
            }
        }
        Ok(())
    }
}
