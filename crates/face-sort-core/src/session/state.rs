//! Session lifecycle states and the transition table.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a sorting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Models are not loaded yet.
    Loading,
    /// Ready to accept a batch.
    Idle,
    /// A batch is being classified or archived.
    Processing,
    /// The archive is available for download.
    Ready,
    /// The archive build failed; the build can be retried or the session reset.
    ArchiveFailed,
    /// Initialization failed; the session accepts nothing.
    Error,
}

/// Triggers that move a session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Models loaded.
    Initialized,
    /// Models failed to load.
    InitFailed,
    /// A validated batch was submitted.
    Submit,
    /// Classify the next item or build the archive.
    Advance,
    /// Every item was classified and the archive was built.
    ArchiveBuilt,
    /// Every item was classified but the archive build failed.
    ArchiveBuildFailed,
    /// Retry the archive build from the retained buckets.
    RetryArchive,
    /// Retrieve the archive.
    Download,
    /// Discard the batch and its results.
    Reset,
}

impl SessionState {
    /// Returns the state `event` leads to, or `None` if the event is not
    /// accepted in this state.
    #[must_use]
    pub const fn on(self, event: SessionEvent) -> Option<Self> {
        use SessionEvent as E;

        match (self, event) {
            (Self::Loading, E::Initialized) => Some(Self::Idle),
            (Self::Loading, E::InitFailed) => Some(Self::Error),
            (Self::Idle, E::Submit)
            | (Self::Processing, E::Advance)
            | (Self::ArchiveFailed, E::RetryArchive) => Some(Self::Processing),
            (Self::Processing, E::ArchiveBuilt) | (Self::Ready, E::Download) => Some(Self::Ready),
            (Self::Processing, E::ArchiveBuildFailed) => Some(Self::ArchiveFailed),
            (Self::Ready | Self::ArchiveFailed, E::Reset) => Some(Self::Idle),
            _ => None,
        }
    }

    /// Returns true if `event` is accepted in this state.
    #[must_use]
    pub const fn accepts(self, event: SessionEvent) -> bool {
        self.on(event).is_some()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Loading => "loading",
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::ArchiveFailed => "archive failed",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initialized | Self::InitFailed => "initialize",
            Self::Submit => "submit a batch",
            Self::Advance => "advance the batch",
            Self::ArchiveBuilt | Self::ArchiveBuildFailed => "build the archive",
            Self::RetryArchive => "retry the archive build",
            Self::Download => "download",
            Self::Reset => "reset",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [SessionState; 6] = [
        SessionState::Loading,
        SessionState::Idle,
        SessionState::Processing,
        SessionState::Ready,
        SessionState::ArchiveFailed,
        SessionState::Error,
    ];

    #[test]
    fn test_happy_path() {
        let state = SessionState::Loading;
        let state = state.on(SessionEvent::Initialized);
        assert_eq!(state, Some(SessionState::Idle));
        let state = state.and_then(|s| s.on(SessionEvent::Submit));
        assert_eq!(state, Some(SessionState::Processing));
        let state = state.and_then(|s| s.on(SessionEvent::ArchiveBuilt));
        assert_eq!(state, Some(SessionState::Ready));
        let state = state.and_then(|s| s.on(SessionEvent::Download));
        assert_eq!(state, Some(SessionState::Ready));
        let state = state.and_then(|s| s.on(SessionEvent::Reset));
        assert_eq!(state, Some(SessionState::Idle));
    }

    #[test]
    fn test_download_only_when_ready() {
        for state in STATES {
            assert_eq!(
                state.accepts(SessionEvent::Download),
                state == SessionState::Ready,
                "download in {state}"
            );
        }
    }

    #[test]
    fn test_submit_only_when_idle() {
        for state in STATES {
            assert_eq!(
                state.accepts(SessionEvent::Submit),
                state == SessionState::Idle,
                "submit in {state}"
            );
        }
    }

    #[test]
    fn test_error_is_terminal() {
        let events = [
            SessionEvent::Initialized,
            SessionEvent::InitFailed,
            SessionEvent::Submit,
            SessionEvent::Advance,
            SessionEvent::ArchiveBuilt,
            SessionEvent::ArchiveBuildFailed,
            SessionEvent::RetryArchive,
            SessionEvent::Download,
            SessionEvent::Reset,
        ];
        for event in events {
            assert_eq!(SessionState::Error.on(event), None, "{event:?}");
        }
    }

    #[test]
    fn test_init_failure_only_while_loading() {
        assert_eq!(
            SessionState::Loading.on(SessionEvent::InitFailed),
            Some(SessionState::Error)
        );
        assert_eq!(SessionState::Idle.on(SessionEvent::InitFailed), None);
    }

    #[test]
    fn test_archive_failure_recovery() {
        let failed = SessionState::Processing.on(SessionEvent::ArchiveBuildFailed);
        assert_eq!(failed, Some(SessionState::ArchiveFailed));
        assert_eq!(
            SessionState::ArchiveFailed.on(SessionEvent::RetryArchive),
            Some(SessionState::Processing)
        );
        assert_eq!(
            SessionState::ArchiveFailed.on(SessionEvent::Reset),
            Some(SessionState::Idle)
        );
        assert_eq!(SessionState::ArchiveFailed.on(SessionEvent::Download), None);
    }

    #[test]
    fn test_advance_only_while_processing() {
        for state in STATES {
            let expected = (state == SessionState::Processing).then_some(SessionState::Processing);
            assert_eq!(state.on(SessionEvent::Advance), expected, "advance in {state}");
        }
        assert_eq!(SessionEvent::Advance.to_string(), "advance the batch");
    }

    #[test]
    fn test_no_reset_mid_batch() {
        assert_eq!(SessionState::Processing.on(SessionEvent::Reset), None);
    }
}
