//! Sorting session: owns one batch's lifecycle from submission to download.
//!
//! The session is the only writer of batch state. Every public operation is
//! gated by [`SessionState::on`]; a rejected operation returns a
//! [`SessionError`] and changes nothing.

mod error;
mod state;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

pub use error::SessionError;
pub use state::{SessionEvent, SessionState};

use crate::archive::ArchiveBuilder;
use crate::domain::{
    Archive, ImageClassifier, ImageItem, ItemDiagnostic, ProgressSnapshot, ResultBuckets,
};
use crate::pipeline::{ClassifierPipeline, ItemClassified, PipelineRun};
use crate::ports::{ArchiveEncoder, ProgressEvent, ProgressSink};

/// Outcome of one [`Session::advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// One more item was classified.
    Classified(ItemClassified),
    /// All items were classified and the archive is ready.
    Archived {
        /// Final progress.
        snapshot: ProgressSnapshot,
        /// Archive size in bytes.
        archive_bytes: usize,
    },
}

/// Checks that a batch has at least one image item.
///
/// Hosts may call this before initializing the session to fail fast; `submit`
/// applies the same rule.
///
/// # Errors
///
/// Returns [`SessionError::EmptyBatch`] for an empty batch and
/// [`SessionError::NoImages`] when no item has an image media type.
pub fn validate_batch(batch: &[ImageItem]) -> Result<usize, SessionError> {
    if batch.is_empty() {
        return Err(SessionError::EmptyBatch);
    }
    match batch.iter().filter(|item| item.is_image()).count() {
        0 => Err(SessionError::NoImages {
            rejected: batch.len(),
        }),
        images => Ok(images),
    }
}

/// A sorting session.
pub struct Session {
    state: SessionState,
    builder: ArchiveBuilder,
    pipeline: Option<ClassifierPipeline>,
    run: Option<PipelineRun>,
    buckets: ResultBuckets,
    diagnostics: Vec<ItemDiagnostic>,
    snapshot: ProgressSnapshot,
    archive: Option<Archive>,
    last_error: Option<String>,
}

impl Session {
    /// Creates a session in the `Loading` state.
    #[must_use]
    pub fn new(encoder: Arc<dyn ArchiveEncoder>) -> Self {
        Self::with_builder(ArchiveBuilder::new(encoder))
    }

    /// Creates a session using a preconfigured archive builder.
    #[must_use]
    pub fn with_builder(builder: ArchiveBuilder) -> Self {
        Self {
            state: SessionState::Loading,
            builder,
            pipeline: None,
            run: None,
            buckets: ResultBuckets::new(),
            diagnostics: Vec::new(),
            snapshot: ProgressSnapshot::default(),
            archive: None,
            last_error: None,
        }
    }

    /// Runs `load` to obtain the classifier, moving to `Idle` on success or to
    /// the terminal `Error` state on failure.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InitFailed`] if `load` fails, or
    /// [`SessionError::InvalidState`] if the session was already initialized.
    pub fn initialize<F>(&mut self, load: F) -> Result<(), SessionError>
    where
        F: FnOnce() -> anyhow::Result<Arc<dyn ImageClassifier>>,
    {
        self.check(SessionEvent::Initialized)?;

        match load() {
            Ok(classifier) => {
                info!("Session ready ({} classifier)", classifier.name());
                self.pipeline = Some(ClassifierPipeline::new(classifier));
                self.transition(SessionEvent::Initialized);
                Ok(())
            }
            Err(e) => {
                let message = format!("{e:#}");
                error!("Initialization failed: {message}");
                self.last_error = Some(message.clone());
                self.transition(SessionEvent::InitFailed);
                Err(SessionError::InitFailed(message))
            }
        }
    }

    /// Accepts a batch and starts classifying it.
    ///
    /// Non-image items are filtered out first. Returns the number of items
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Idle`, and
    /// [`SessionError::EmptyBatch`] / [`SessionError::NoImages`] when nothing
    /// is left to classify. The session stays `Idle` in every case.
    pub fn submit(&mut self, batch: Vec<ImageItem>) -> Result<usize, SessionError> {
        self.check(SessionEvent::Submit)?;
        validate_batch(&batch)?;

        let pipeline = self.pipeline.as_ref().ok_or(SessionError::InvalidState {
            event: SessionEvent::Submit,
            state: self.state,
        })?;

        let submitted = batch.len();
        let images: Vec<ImageItem> = batch
            .into_iter()
            .filter(|item| {
                let keep = item.is_image();
                if !keep {
                    info!(
                        "Skipping non-image file {} ({})",
                        item.name(),
                        item.media_type()
                    );
                }
                keep
            })
            .collect();

        let accepted = images.len();
        if accepted < submitted {
            warn!("Filtered out {} non-image file(s)", submitted - accepted);
        }

        let run = pipeline.start(images);
        self.clear_results();
        self.snapshot = run.snapshot();
        self.run = Some(run);
        self.transition(SessionEvent::Submit);
        Ok(accepted)
    }

    /// Performs the next unit of work: classifies one item, or builds the
    /// archive once every item has been classified.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Processing`, and
    /// [`SessionError::ArchiveFailed`] if the archive build fails, in which
    /// case the session moves to `ArchiveFailed`.
    pub fn advance(&mut self) -> Result<Step, SessionError> {
        self.check(SessionEvent::Advance)?;

        if let Some(run) = self.run.as_mut() {
            if let Some(classified) = run.next() {
                self.snapshot = classified.snapshot;
                return Ok(Step::Classified(classified));
            }
        }

        if let Some(run) = self.run.take() {
            let output = run.finish();
            debug!(
                "Classification finished: {} items, {} unsorted",
                output.snapshot.processed,
                output.diagnostics.len()
            );
            self.buckets = output.buckets;
            self.diagnostics = output.diagnostics;
            self.snapshot = output.snapshot;
        }

        self.build_archive()
    }

    /// Advances until the batch is archived, publishing progress to `sink`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::advance`].
    pub fn process(&mut self, sink: &dyn ProgressSink) -> Result<ProgressSnapshot, SessionError> {
        self.check(SessionEvent::Advance)?;

        if let Some(run) = &self.run {
            sink.on_event(ProgressEvent::Started {
                total: run.snapshot().total,
            });
        }

        loop {
            if self.run.as_ref().is_some_and(PipelineRun::is_done) {
                sink.on_event(ProgressEvent::Archiving {
                    files: self.snapshot.processed,
                });
            }

            match self.advance() {
                Ok(Step::Classified(classified)) => sink.on_event(classified.into_event()),
                Ok(Step::Archived {
                    snapshot,
                    archive_bytes,
                }) => {
                    sink.on_event(ProgressEvent::Finished {
                        snapshot,
                        archive_bytes,
                    });
                    return Ok(snapshot);
                }
                Err(e) => {
                    if let SessionError::ArchiveFailed(message) = &e {
                        sink.on_event(ProgressEvent::ArchiveFailed {
                            message: message.clone(),
                        });
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Rebuilds the archive from the retained buckets after a failed build.
    ///
    /// No item is classified again.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `ArchiveFailed`, and
    /// [`SessionError::ArchiveFailed`] if the build fails again.
    pub fn retry_archive(&mut self) -> Result<&Archive, SessionError> {
        self.check(SessionEvent::RetryArchive)?;
        info!("Retrying archive build");
        self.transition(SessionEvent::RetryArchive);
        self.build_archive()?;
        self.download()
    }

    /// Returns the archive. Repeatable; does not consume the archive.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Ready`.
    pub fn download(&self) -> Result<&Archive, SessionError> {
        self.check(SessionEvent::Download)?;
        self.archive.as_ref().ok_or(SessionError::InvalidState {
            event: SessionEvent::Download,
            state: self.state,
        })
    }

    /// Discards the batch, its results and the archive, returning to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Ready` and
    /// `ArchiveFailed`.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.check(SessionEvent::Reset)?;
        self.run = None;
        self.clear_results();
        self.transition(SessionEvent::Reset);
        info!("Session reset");
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current progress.
    #[must_use]
    pub const fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot
    }

    /// Classified items. Filled once classification of the batch completes.
    #[must_use]
    pub const fn buckets(&self) -> &ResultBuckets {
        &self.buckets
    }

    /// Reasons for every `Unknown` outcome of the current batch.
    #[must_use]
    pub fn diagnostics(&self) -> &[ItemDiagnostic] {
        &self.diagnostics
    }

    /// The most recent initialization or archive error.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn build_archive(&mut self) -> Result<Step, SessionError> {
        match self.builder.build(&self.buckets) {
            Ok(archive) => {
                let archive_bytes = archive.bytes().len();
                self.archive = Some(archive);
                self.last_error = None;
                self.transition(SessionEvent::ArchiveBuilt);
                Ok(Step::Archived {
                    snapshot: self.snapshot,
                    archive_bytes,
                })
            }
            Err(e) => {
                let message = format!("{e:#}");
                error!("Archive build failed: {message}");
                self.last_error = Some(message.clone());
                self.transition(SessionEvent::ArchiveBuildFailed);
                Err(SessionError::ArchiveFailed(message))
            }
        }
    }

    fn clear_results(&mut self) {
        self.buckets.clear();
        self.diagnostics.clear();
        self.snapshot = ProgressSnapshot::default();
        self.archive = None;
        self.last_error = None;
    }

    fn check(&self, event: SessionEvent) -> Result<(), SessionError> {
        if self.state.accepts(event) {
            Ok(())
        } else {
            debug!("Rejected {event:?} in state {}", self.state);
            Err(SessionError::InvalidState {
                event,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, event: SessionEvent) {
        if let Some(next) = self.state.on(event) {
            debug!("Session {} -> {next} on {event:?}", self.state);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArchiveEntry, Outcome, Verdict};

    struct AllMale;

    impl ImageClassifier for AllMale {
        fn name(&self) -> &'static str {
            "all-male"
        }

        fn classify(&self, _item: &ImageItem) -> Verdict {
            Verdict::sorted(Outcome::Male)
        }
    }

    struct CountingEncoder;

    impl ArchiveEncoder for CountingEncoder {
        fn encode(&self, entries: &[ArchiveEntry<'_>]) -> anyhow::Result<Vec<u8>> {
            Ok(entries.len().to_le_bytes().to_vec())
        }
    }

    fn ready_session() -> Session {
        let mut session = Session::new(Arc::new(CountingEncoder));
        let loaded = session.initialize(|| Ok(Arc::new(AllMale) as Arc<dyn ImageClassifier>));
        assert!(loaded.is_ok());
        session
    }

    fn images(n: usize) -> Vec<ImageItem> {
        (0..n)
            .map(|i| ImageItem::new(format!("{i}.png"), "image/png", vec![0]))
            .collect()
    }

    #[test]
    fn test_starts_loading() {
        let session = Session::new(Arc::new(CountingEncoder));
        assert_eq!(session.state(), SessionState::Loading);
        assert_eq!(
            session.download().err(),
            Some(SessionError::InvalidState {
                event: SessionEvent::Download,
                state: SessionState::Loading
            })
        );
    }

    #[test]
    fn test_validate_batch() {
        assert_eq!(validate_batch(&[]), Err(SessionError::EmptyBatch));
        let text = vec![ImageItem::new("a.txt", "text/plain", vec![0])];
        assert_eq!(
            validate_batch(&text),
            Err(SessionError::NoImages { rejected: 1 })
        );
        assert_eq!(validate_batch(&images(2)), Ok(2));
    }

    #[test]
    fn test_advance_step_by_step() {
        let mut session = ready_session();
        assert_eq!(session.submit(images(2)), Ok(2));
        assert_eq!(session.state(), SessionState::Processing);

        assert!(matches!(session.advance(), Ok(Step::Classified(_))));
        assert_eq!(session.snapshot().processed, 1);
        assert!(matches!(session.advance(), Ok(Step::Classified(_))));
        assert!(matches!(session.advance(), Ok(Step::Archived { .. })));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.buckets().counts().male, 2);
        assert!(session.advance().is_err());
    }

    #[test]
    fn test_advance_while_idle_names_advance() {
        let mut session = ready_session();
        let rejected = SessionError::InvalidState {
            event: SessionEvent::Advance,
            state: SessionState::Idle,
        };
        assert_eq!(session.advance().err(), Some(rejected.clone()));
        assert_eq!(session.process(&()).err(), Some(rejected.clone()));
        assert_eq!(
            rejected.to_string(),
            "cannot advance the batch while the session is idle"
        );
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_initialize_twice_rejected() {
        let mut session = ready_session();
        let again = session.initialize(|| Ok(Arc::new(AllMale) as Arc<dyn ImageClassifier>));
        assert!(matches!(again, Err(SessionError::InvalidState { .. })));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_non_images_are_filtered() {
        let mut session = ready_session();
        let mut batch = images(1);
        batch.push(ImageItem::new("notes.txt", "text/plain", vec![1]));
        assert_eq!(session.submit(batch), Ok(1));
        assert_eq!(session.snapshot().total, 1);
    }
}
