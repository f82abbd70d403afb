//! Utilities shared by the CLI and the report sinks
//!
//! - [`fs`] - Directory creation and atomic writes for report files
//! - [`progress`] - Progress bars and spinners for long-running batches

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use progress::ProgressBar;
