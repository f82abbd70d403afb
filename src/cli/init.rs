//! Create a default configuration file.
//!
//! `loadprobe init` writes a commented `loadprobe.toml` with every setting at
//! its default value, ready to be edited.

use crate::constants::DEFAULT_CONFIG_FILE;
use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

/// Default configuration written by `loadprobe init`.
pub const CONFIG_TEMPLATE: &str = r#"# loadprobe configuration

# Report name, also the prefix of JSON report files
name = "loadprobe"

# "fan-out" runs one batch; "sustained" repeats batches for duration_secs
mode = "fan-out"

# Descriptors per batch and invocations in flight at once
requests = 10
workers = 10

# Invocations still running after this budget are recorded as TIMEOUT
operation_timeout_ms = 30000

# Sustained mode only
duration_secs = 60
round_pause_ms = 1000

# Fixed seed for reproducible workload order
# seed = 42

# Flag memory growth above this many MB during a run
memory_ceiling_mb = 100.0
monitor_resources = true

# Count successful requests slower than this (informational)
# slow_request_ms = 500.0

[sla]
max_avg_response_ms = 5000.0
min_throughput_rps = 0.0
max_error_rate = 0.05

# Ratios must sum to at most 1.0; the remainder goes to the first kind
[[workload]]
kind = "cpu"
ratio = 0.4
params = { iterations = 100000 }

[[workload]]
kind = "io"
ratio = 0.3
params = { latency_ms = 20 }

[[workload]]
kind = "search"
ratio = 0.3
params = { latency_ms = 100 }

[target]
kind = "simulated"
# kind = "http"
# url = "http://localhost:8080/api/invoke"

[output]
# dir = "reports"
raw_results = false
"#;

/// Command to create a `loadprobe.toml`.
#[derive(Args, Debug, Default)]
pub struct InitCommand {
    /// Directory to create the file in (defaults to the current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(short, long)]
    force: bool,
}

impl InitCommand {
    /// Write the template.
    pub async fn execute(self) -> Result<()> {
        let target_dir = self.path.unwrap_or_else(|| PathBuf::from("."));
        let config_path = target_dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() && !self.force {
            return Err(anyhow!(
                "Configuration already exists at {}. Use --force to overwrite",
                config_path.display()
            ));
        }

        if !target_dir.exists() {
            fs::create_dir_all(&target_dir)
                .with_context(|| format!("Failed to create {}", target_dir.display()))?;
        }
        fs::write(&config_path, CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        println!("{} Created {}", "✓".green(), config_path.display());
        println!("\n{}", "Next steps:".cyan());
        println!("  Check it with {}", "loadprobe validate".bright_white());
        println!("  Then start a run with {}", "loadprobe run".bright_white());
        Ok(())
    }
}
