//! Rejections reported by the session.

use thiserror::Error;

use super::{SessionEvent, SessionState};

/// Why a session operation was rejected.
///
/// A rejected operation leaves the session untouched, except for
/// `InitFailed` and `ArchiveFailed`, which report the transition that was
/// just made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The operation is not valid in the current state.
    #[error("cannot {event} while the session is {state}")]
    InvalidState {
        /// Rejected trigger.
        event: SessionEvent,
        /// State at the time of the call.
        state: SessionState,
    },
    /// The batch contained no files.
    #[error("no files were submitted")]
    EmptyBatch,
    /// The batch contained no image files.
    #[error("none of the {rejected} submitted file(s) is an image")]
    NoImages {
        /// Number of non-image files that were filtered out.
        rejected: usize,
    },
    /// The face analyzer could not be initialized.
    #[error("face analyzer failed to initialize: {0}")]
    InitFailed(String),
    /// The archive could not be built.
    #[error("failed to build archive: {0}")]
    ArchiveFailed(String),
}
