//! Progress indicators for load runs
//!
//! This module wraps `indicatif` with loadprobe's styling. The CLI creates one
//! bar per batch and the concurrency driver advances it as invocations
//! complete, so long runs show how far along they are.
//!
//! Whether a bar is drawn is decided by the caller: a hidden bar silently
//! ignores every update, which is what non-interactive runs and tests use.
//!
//! # Examples
//!
//! ```rust,no_run
//! use loadprobe_cli::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new(100, true);
//! progress.set_message("fan-out");
//!
//! for _ in 0..100 {
//!     progress.inc(1);
//! }
//!
//! progress.finish_with_message("done");
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// A progress bar with consistent styling.
///
/// Cloning is cheap and every clone drives the same bar, which is how the bar
/// is shared across concurrently running invocations.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a progress bar for `len` units of work.
    ///
    /// When `visible` is false the bar is hidden and all updates are no-ops.
    pub fn new(len: u64, visible: bool) -> Self {
        let bar = if visible {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        } else {
            IndicatifBar::hidden()
        };
        Self { inner: bar }
    }

    /// Creates a spinner for work of unknown size, such as a sustained run.
    pub fn new_spinner(visible: bool) -> Self {
        let bar = if visible {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            bar
        } else {
            IndicatifBar::hidden()
        };
        Self { inner: bar }
    }

    /// Creates a bar that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Sets the message displayed next to the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Advances the bar by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Current position of the bar.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Finishes the bar, leaving `msg` in place of it.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Finishes the bar and removes it from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

const BAR_TEMPLATE: &str = "[{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {pos} completed {msg}";

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("━╸━"))
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .map(|style| style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
}
