//! Progress display for resolution and test runs
//!
//! Spinners while metadata is fetched, a bar while tests run. Everything
//! goes to stderr through indicatif so stdout stays clean for the report.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TICK: Duration = Duration::from_millis(80);

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
        .expect("Invalid template")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
        .expect("Invalid template")
        .progress_chars("█▓▒░")
}

/// Progress reporter for one invocation; disabled in quiet and JSON modes
pub struct Progress {
    enabled: bool,
    current: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: None,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Replaces whatever is showing with `bar`
    fn show(&mut self, bar: ProgressBar, message: &str) {
        self.finish_and_clear();
        bar.set_message(message.to_string());
        bar.enable_steady_tick(SPINNER_TICK);
        self.current = Some(bar);
    }

    /// Spinner for an operation of unknown length
    pub fn spinner(&mut self, message: &str) {
        if self.enabled {
            self.show(ProgressBar::new_spinner().with_style(spinner_style()), message);
        }
    }

    /// Bar over `total` items; nothing is shown for zero items
    pub fn start(&mut self, total: u64, message: &str) {
        if self.enabled && total > 0 {
            self.show(ProgressBar::new(total).with_style(bar_style()), message);
        }
    }

    pub fn inc(&self) {
        if let Some(bar) = &self.current {
            bar.inc(1);
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.current {
            bar.set_message(message.to_string());
        }
    }

    pub fn finish_and_clear(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish_and_clear();
    }
}
