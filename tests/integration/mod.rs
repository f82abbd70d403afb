//! Integration test suite for loadprobe
//!
//! End-to-end tests of the public library API and the `loadprobe` binary.
//! They run in a few seconds and are executed in CI on every commit.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! cargo nextest run --test integration
//! ```
//!
//! # Test Organization
//!
//! - **driver**: Fan-out and sustained concurrency behavior
//! - **runner**: Full runs through [`LoadRunner`](loadprobe_cli::runner::LoadRunner)
//! - **report_files**: JSON report sink output
//! - **cli**: The `loadprobe` binary, its commands and exit codes

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod driver;
mod report_files;
mod runner;
