//! Stress and Performance Test Suite for loadprobe
//!
//! Large batches and long sustained runs that check the driver holds its
//! guarantees under load. These take longer than the integration suite and
//! are **not executed in CI**.
//!
//! Performance is logged via `println!` for manual review rather than
//! asserted tightly; the assertions cover correctness (result counts, worker
//! limits, termination) and leave generous timing bounds.
//!
//! # Running Stress Tests
//!
//! ```bash
//! cargo test --test stress -- --nocapture
//! ```

mod large_batch;
mod sustained_duration;
