//! loadprobe CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, runs the command and
//! maps the outcome to an exit status: 0 on success, 1 on a fatal error and 2
//! when a run completed without meeting its SLA.

use anyhow::Result;
use clap::Parser;
use loadprobe_cli::cli::{self, CommandOutcome};
use loadprobe_cli::core::user_friendly_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.build_config();

    init_tracing(config.log_level.as_deref());

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute_with_config(config).await {
        Ok(CommandOutcome::Success) => Ok(()),
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

/// Log to stderr so stdout stays reserved for reports.
///
/// An explicit level from the flags wins over `RUST_LOG`; `info` is the
/// fallback.
fn init_tracing(log_level: Option<&str>) {
    let env_filter = match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level '{level}', falling back to 'info'");
            EnvFilter::new("info")
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
