//! Progress bookkeeping for a running batch.

use crate::domain::{Outcome, ProgressSnapshot};

/// Holds the processed/total counters and bucket sizes of one batch.
///
/// Updated only by the pipeline; trusts the counts it is given.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    snapshot: ProgressSnapshot,
}

impl ProgressTracker {
    /// Starts tracking a batch of `total` items.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            snapshot: ProgressSnapshot {
                total,
                ..ProgressSnapshot::default()
            },
        }
    }

    /// Records one classified item.
    pub fn record(&mut self, outcome: Outcome) {
        debug_assert!(self.snapshot.processed < self.snapshot.total);
        self.snapshot.processed += 1;
        self.snapshot.counts.increment(outcome);
    }

    /// Current progress.
    #[must_use]
    pub const fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        self.snapshot = ProgressSnapshot::default();
    }
}
