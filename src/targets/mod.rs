//! Built-in Target Operations.
//!
//! Library callers normally supply their own [`TargetOperation`]. The CLI needs
//! something to drive without writing code, so two targets ship with the crate:
//!
//! - [`SimulatedTarget`]: synthetic CPU, I/O, search and calculation work
//!   selected by each descriptor's kind
//! - [`HttpTarget`]: POSTs each descriptor's payload to a URL
//!
//! [`TargetConfig`] is the `[target]` table of the configuration file and
//! [`build_target`] turns it into a shareable target.

mod http;
mod simulated;

pub use http::HttpTarget;
pub use simulated::SimulatedTarget;

use crate::core::TargetOperation;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which built-in target a run drives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetConfig {
    /// Synthetic work chosen by operation kind.
    #[default]
    Simulated,
    /// JSON POST to an HTTP endpoint.
    Http {
        /// Endpoint every invocation posts to
        url: String,
        /// Extra request headers
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

/// Construct the target described by `config`.
pub fn build_target(config: &TargetConfig) -> Result<Arc<dyn TargetOperation>> {
    match config {
        TargetConfig::Simulated => Ok(Arc::new(SimulatedTarget::new())),
        TargetConfig::Http {
            url,
            headers,
        } => Ok(Arc::new(HttpTarget::new(url, headers)?)),
    }
}
