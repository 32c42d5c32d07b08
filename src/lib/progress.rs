//! Per-phase progress logging.
//!
//! Reader roles tick a shared [`ProgressTracker`] once per read pushed into
//! the pipeline; milestones are logged as interval boundaries are crossed and
//! the orchestrator emits the final count when the phase drains.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::format_count;

/// Thread-safe counter that logs milestones at interval boundaries.
///
/// Several readers may tick the same tracker concurrently; a tick that
/// carries the count across one or more boundaries logs each milestone it
/// crossed.
///
/// # Example
/// ```
/// use refsieve_lib::progress::ProgressTracker;
///
/// let progress = ProgressTracker::new("Reads pushed").with_interval(1000);
/// for _ in 0..2500 {
///     progress.log_if_needed(1); // logs at 1,000 and 2,000
/// }
/// progress.log_final(); // logs "Reads pushed 2,500 (complete)"
/// ```
pub struct ProgressTracker {
    /// Milestones are multiples of this.
    interval: u64,
    /// Log line prefix.
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker with the default interval of 100,000 reads.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 100_000, message: message.into(), count: AtomicU64::new(0) }
    }

    /// Create a tracker labeled with the phase it covers.
    #[must_use]
    pub fn for_phase(index_num: u16, part: u16) -> Self {
        Self::new(format!("Reads pushed (index {index_num} part {part})"))
    }

    /// Set the milestone interval.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Add to the count, logging every milestone the addition crossed.
    ///
    /// Returns `true` when the resulting count sits exactly on a boundary.
    pub fn log_if_needed(&self, additional: u64) -> bool {
        if additional == 0 {
            let count = self.count.load(Ordering::Relaxed);
            return count > 0 && count % self.interval == 0;
        }

        let before = self.count.fetch_add(additional, Ordering::Relaxed);
        let after = before + additional;
        for crossed in (before / self.interval + 1)..=(after / self.interval) {
            info!("{} {}", self.message, format_count(crossed * self.interval));
        }
        after % self.interval == 0
    }

    /// Log the final count, unless the last tick landed on a boundary and
    /// already logged it.
    pub fn log_final(&self) {
        if !self.log_if_needed(0) {
            let count = self.count.load(Ordering::Relaxed);
            if count > 0 {
                info!("{} {} (complete)", self.message, format_count(count));
            }
        }
    }

    /// The current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
