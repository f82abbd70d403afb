//! loadprobe - concurrent load generation and performance assessment
//!
//! Drives batches of timed operations against a target with bounded
//! parallelism, aggregates what happened into response-time statistics and
//! judges the result against service-level thresholds.
//!
//! # Architecture Overview
//!
//! A run flows through the crate in one direction:
//!
//! 1. [`workload`] turns a kind/ratio mix into a shuffled list of
//!    [`core::OperationDescriptor`]s.
//! 2. [`driver`] executes them against a [`core::TargetOperation`], either as
//!    one fan-out batch or as repeated rounds until a duration elapses.
//! 3. [`invocation`] times each call and classifies it as success, failure,
//!    timeout or scheduling error. Nothing escapes as a panic or error.
//! 4. [`stats`] reduces the results to a [`stats::BatchReport`], overall and
//!    per operation kind.
//! 5. [`sla`] compares the report with thresholds; [`monitor`] compares memory
//!    before and after.
//! 6. [`runner`] ties these together into a [`runner::RunReport`] and hands it
//!    to the configured [`sink`]s.
//!
//! # Core Modules
//!
//! ## Execution
//! - [`invocation`] - Timed, panic-safe single invocations
//! - [`driver`] - Fan-out and sustained concurrency drivers
//! - [`targets`] - Built-in simulated and HTTP targets
//! - [`workload`] - Ratio-based workload composition
//!
//! ## Analysis
//! - [`stats`] - Response-time statistics and batch reports
//! - [`sla`] - SLA threshold assessment
//! - [`monitor`] - Process memory and CPU sampling
//!
//! ## Orchestration and output
//! - [`runner`] - End-to-end load runs
//! - [`sink`] - Console and JSON report sinks
//! - [`config`] - `loadprobe.toml` configuration
//! - [`cli`] - Command-line interface
//!
//! ## Supporting Modules
//! - [`core`] - Operation traits, descriptors and error types
//! - [`constants`] - Defaults shared across modules
//! - [`utils`] - File and progress helpers
//!
//! # Configuration Format (loadprobe.toml)
//!
//! ```toml
//! name = "checkout"
//! mode = "fan-out"
//! requests = 200
//! workers = 20
//! operation_timeout_ms = 5000
//!
//! [sla]
//! max_avg_response_ms = 250.0
//! min_throughput_rps = 50.0
//! max_error_rate = 0.01
//!
//! [[workload]]
//! kind = "search"
//! ratio = 0.7
//!
//! [[workload]]
//! kind = "io"
//! ratio = 0.3
//!
//! [target]
//! kind = "http"
//! url = "http://localhost:8080/invoke"
//! ```
//!
//! # Library use
//!
//! ```rust,no_run
//! use loadprobe_cli::config::LoadConfig;
//! use loadprobe_cli::runner::LoadRunner;
//! use loadprobe_cli::sink::MemorySink;
//! use loadprobe_cli::targets::build_target;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = LoadConfig::default();
//! let target = build_target(&config.target)?;
//! let sink = MemorySink::new();
//! let mut runner = LoadRunner::new(config)?;
//! let report = runner.run(target, &sink, &CancellationToken::new()).await?;
//! println!("meets SLA: {}", report.sla.meets_sla);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod driver;
pub mod invocation;
pub mod monitor;
pub mod runner;
pub mod sink;
pub mod sla;
pub mod stats;
pub mod targets;
pub mod utils;
pub mod workload;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
