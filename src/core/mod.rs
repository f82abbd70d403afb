//! Core types for loadprobe
//!
//! This module holds the fundamental abstractions the rest of the crate is built on:
//!
//! - [`error`] - [`LoadError`] for run-aborting conditions, [`ErrorContext`] and
//!   [`user_friendly_error`] for CLI reporting
//! - [`operation`] - [`OperationDescriptor`], [`OperationKind`] and the
//!   [`TargetOperation`] trait with its [`FnTarget`] / [`BlockingTarget`] adapters
//!
//! # Thread Safety
//!
//! - [`OperationDescriptor`] and [`OperationKind`] are plain owned data and can be
//!   cloned into tasks freely
//! - [`TargetOperation`] is `Send + Sync + 'static` and is shared across workers
//!   behind an [`std::sync::Arc`]

pub mod error;
pub mod operation;

pub use error::{ErrorContext, LoadError, user_friendly_error};
pub use operation::{BlockingTarget, FnTarget, OperationDescriptor, OperationKind, TargetOperation};
