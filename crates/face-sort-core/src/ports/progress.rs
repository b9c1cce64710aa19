//! Progress reporting port for UI integration.

use crate::domain::{Outcome, ProgressSnapshot};

/// Events emitted while a batch is sorted.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Classification started.
    Started {
        /// Items in the batch.
        total: usize,
    },
    /// One item was classified.
    Classified {
        /// Index in the batch (0-based).
        index: usize,
        /// Item file name.
        name: String,
        /// Assigned outcome.
        outcome: Outcome,
        /// Progress after this item.
        snapshot: ProgressSnapshot,
    },
    /// All items are classified and the archive is being built.
    Archiving {
        /// Files going into the archive.
        files: usize,
    },
    /// The archive was built and is ready for download.
    Finished {
        /// Final progress.
        snapshot: ProgressSnapshot,
        /// Archive size in bytes.
        archive_bytes: usize,
    },
    /// The archive could not be built.
    ArchiveFailed {
        /// Error message.
        message: String,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that discards every event.
impl ProgressSink for () {
    fn on_event(&self, _event: ProgressEvent) {}
}
