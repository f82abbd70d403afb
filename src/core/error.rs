//! Error handling for loadprobe
//!
//! This module provides the typed errors and user-friendly error reporting used by
//! the library and the CLI. The error system is built around two principles:
//! 1. **Strongly-typed errors** for the few conditions that abort a run
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # What is (and is not) an error here
//!
//! A failing Target Operation is *not* a [`LoadError`]. Operation failures,
//! timeouts and scheduling failures are captured per invocation as
//! [`crate::invocation::InvocationResult`] records and never abort a batch.
//! [`LoadError`] covers conditions that prevent a run from starting or from
//! being reported:
//! - **Workload construction**: [`LoadError::InvalidWorkload`]
//! - **Configuration**: [`LoadError::InvalidConfig`], [`LoadError::ConfigParseError`],
//!   [`LoadError::ConfigNotFound`]
//! - **Collaborators**: [`LoadError::TargetError`], [`LoadError::SinkError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use loadprobe_cli::core::{LoadError, user_friendly_error};
//!
//! let err = LoadError::InvalidWorkload {
//!     reason: "ratios sum to 1.20".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Conditions that abort a load run before or after execution.
///
/// Every variant carries owned strings so the error is [`Clone`] and can be
/// rebuilt into an [`ErrorContext`] after being recovered from an
/// [`anyhow::Error`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The workload ratio map cannot produce a batch.
    ///
    /// Raised by the workload composer before any invocation begins, e.g. when
    /// the ratios sum above 1.0, a ratio is negative, or no kinds are given.
    #[error("Invalid workload: {reason}")]
    InvalidWorkload {
        /// Why the workload was rejected
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig {
        /// Name of the offending field, as written in the config file
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("Failed to parse configuration file {file}: {reason}")]
    ConfigParseError {
        /// Path of the configuration file
        file: String,
        /// Underlying read or TOML error
        reason: String,
    },

    /// No configuration file exists at the requested location.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was looked up
        path: String,
    },

    /// The Target Operation could not be constructed.
    #[error("Failed to build target operation: {reason}")]
    TargetError {
        /// Why the target could not be built
        reason: String,
    },

    /// A report sink failed to record a report.
    #[error("Report sink '{sink}' failed: {reason}")]
    SinkError {
        /// Name of the sink
        sink: String,
        /// Underlying failure
        reason: String,
    },

    /// Any other failure, carrying the outermost message.
    #[error("{message}")]
    Other {
        /// Top-level error message
        message: String,
    },
}

/// An error wrapped with a suggestion and details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: LoadError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: LoadError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Typed [`LoadError`]s get tailored suggestions. TOML and I/O errors are mapped
/// onto [`LoadError::ConfigParseError`]. Anything else becomes
/// [`LoadError::Other`] with its cause chain listed in the details.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(load_error) = error.downcast_ref::<LoadError>() {
        return create_error_context(load_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(LoadError::ConfigParseError {
            file: "loadprobe.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your configuration file")
        .with_details("TOML parsing errors are usually caused by missing quotes or mismatched brackets");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return ErrorContext::new(LoadError::ConfigParseError {
            file: "unknown".to_string(),
            reason: io_error.to_string(),
        })
        .with_suggestion("Check that the file exists and is readable");
    }

    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let ctx = ErrorContext::new(LoadError::Other {
        message: error.to_string(),
    });
    if causes.is_empty() {
        return ctx;
    }

    let mut details = String::from("Caused by:");
    for (i, cause) in causes.iter().enumerate() {
        details.push_str(&format!("\n  {}: {}", i + 1, cause));
    }
    ctx.with_details(details)
}

fn create_error_context(error: LoadError) -> ErrorContext {
    match &error {
        LoadError::InvalidWorkload { .. } => ErrorContext::new(error)
            .with_suggestion("Make every [[workload]] ratio non-negative and keep their sum at or below 1.0")
            .with_details("The workload is validated before any request is sent; nothing was executed"),
        LoadError::InvalidConfig { field, .. } => {
            let suggestion = format!("Fix the '{field}' value in loadprobe.toml or the matching CLI flag");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        LoadError::ConfigParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'loadprobe validate' to see the parse error in context"),
        LoadError::ConfigNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'loadprobe init' to create a default configuration, or pass --config"),
        LoadError::TargetError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the [target] section: kind must be 'simulated' or 'http' and http targets need a url"),
        LoadError::SinkError { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the output directory exists and is writable")
            .with_details("The run itself completed; only persisting the report failed"),
        LoadError::Other { .. } => ErrorContext::new(error),
    }
}
