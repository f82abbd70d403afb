//! Generic TOML configuration parsing.
//!
//! [`parse_config`] reads a TOML file into any [`serde::de::DeserializeOwned`]
//! type. Failures are reported as typed [`LoadError`]s carrying the file path,
//! so the CLI can attach a suggestion:
//!
//! - a missing file is [`LoadError::ConfigNotFound`]
//! - an unreadable file or invalid TOML is [`LoadError::ConfigParseError`]
//!
//! ```rust,no_run
//! use loadprobe_cli::config::{LoadConfig, parse_config};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config: LoadConfig = parse_config(Path::new("loadprobe.toml"))?;
//! println!("{} workers", config.workers);
//! # Ok(())
//! # }
//! ```

use crate::core::LoadError;
use anyhow::Result;
use std::path::Path;

/// Parse a TOML configuration file into `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            LoadError::ConfigParseError {
                file: path.display().to_string(),
                reason: format!("failed to read file: {e}"),
            }
        }
    })?;

    let config: T = toml::from_str(&content).map_err(|e| LoadError::ConfigParseError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(config)
}
