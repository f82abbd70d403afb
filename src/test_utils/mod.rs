//! Test utilities for loadprobe
//!
//! Helpers shared by the unit, integration and stress suites:
//! - [`init_test_logging`] to see `tracing` output from a test
//! - [`targets`] with fake Target Operations that sleep, fail, panic or hang
//! - [`FixedProbe`] returning scripted memory readings
//! - [`descriptors`] and [`write_config`] for building inputs quickly
//!
//! # Example
//!
//! ```rust,no_run
//! use loadprobe_cli::test_utils::{descriptors, targets};
//! use loadprobe_cli::driver::ConcurrencyDriver;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let batch = descriptors("io", 10);
//! let target = targets::sleeping(Duration::from_millis(10));
//! let driver = ConcurrencyDriver::new(10, Duration::from_secs(1));
//! let results = driver.fan_out(&batch, target, &CancellationToken::new()).await;
//! assert_eq!(results.len(), 10);
//! # }
//! ```

pub mod targets;

use crate::core::OperationDescriptor;
use crate::monitor::{ResourceProbe, ResourceSample};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` the filter is set to that
/// level; without it, `RUST_LOG` is honoured when present and logging stays off
/// otherwise.
///
/// ```bash
/// RUST_LOG=loadprobe_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// `count` descriptors of one kind with case ids `case_0`, `case_1`, ...
pub fn descriptors(kind: &str, count: usize) -> Vec<OperationDescriptor> {
    (0..count).map(|i| OperationDescriptor::new(format!("case_{i}"), kind, Value::Null)).collect()
}

/// Probe that returns `readings` in order, repeating the last one.
pub struct FixedProbe {
    readings: Vec<f64>,
    next: AtomicUsize,
}

impl FixedProbe {
    /// Probe yielding `readings` megabytes.
    ///
    /// # Panics
    ///
    /// Panics if `readings` is empty.
    pub fn new(readings: &[f64]) -> Self {
        assert!(!readings.is_empty(), "FixedProbe needs at least one reading");
        Self {
            readings: readings.to_vec(),
            next: AtomicUsize::new(0),
        }
    }
}

impl ResourceProbe for FixedProbe {
    fn sample(&self) -> anyhow::Result<ResourceSample> {
        let i = self.next.fetch_add(1, Ordering::SeqCst).min(self.readings.len() - 1);
        Ok(ResourceSample::now(self.readings[i], None))
    }
}

/// Write `content` to `loadprobe.toml` inside `dir` and return its path.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join(crate::constants::DEFAULT_CONFIG_FILE);
    std::fs::write(&path, content).unwrap_or_else(|e| {
        panic!("Failed to write test config {}: {e}", path.display());
    });
    path
}
