//! Progress reporting and cooperative cancellation for long-running grid edits

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Sink for progress updates from grid algorithms and readers
///
/// Implementations must tolerate calls from several worker threads at once;
/// row-parallel edits report each finished row independently.
pub trait ProgressMonitor: Sync {
    /// Announce the total amount of work
    fn begin(&self, total: usize);

    /// Record `amount` units of completed work
    fn worked(&self, amount: usize);

    /// Whether the caller has asked for the operation to stop
    fn is_cancelled(&self) -> bool;

    /// Signal that no more work will be reported
    fn done(&self) {}
}

/// Monitor that discards updates and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn begin(&self, _total: usize) {}

    fn worked(&self, _amount: usize) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

static BAR_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    let template = format!(
        "{{msg}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} rows [{{elapsed_precise}}]"
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Terminal progress bar for command-line runs
pub struct TerminalProgress {
    bar: ProgressBar,
    cancelled: AtomicBool,
}

impl TerminalProgress {
    /// Create a bar labelled with `message`
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(BAR_STYLE.clone());
        bar.set_message(message.into());
        Self {
            bar,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Create a bar that draws nowhere
    pub fn hidden() -> Self {
        let progress = Self::new(String::new());
        progress.bar.set_draw_target(ProgressDrawTarget::hidden());
        progress
    }

    /// Request cancellation of the running operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Current bar position
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressMonitor for TerminalProgress {
    fn begin(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn worked(&self, amount: usize) {
        self.bar.inc(amount as u64);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn done(&self) {
        if self.is_cancelled() {
            self.bar.abandon_with_message("cancelled");
        } else {
            self.bar.finish_and_clear();
        }
    }
}
