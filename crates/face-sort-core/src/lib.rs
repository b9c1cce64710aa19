//! face-sort core: domain types, the classification pipeline, the archive
//! builder and the session state machine.
//!
//! The crate talks to the outside world only through the traits in
//! [`ports`]. The bundled Candle analyzer lives in [`inference`].

pub mod archive;
pub mod detection;
pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod ports;
pub mod session;

pub use archive::ArchiveBuilder;
pub use detection::{GenderClassifier, DEFAULT_CONFIDENCE_THRESHOLD};
pub use domain::{
    Archive, ArchiveEntry, BucketCounts, Gender, GenderEstimate, ImageClassifier, ImageItem,
    ItemDiagnostic, Outcome, ProgressSnapshot, ResultBuckets, UnknownReason, Verdict,
    ARCHIVE_FILE_NAME,
};
pub use pipeline::{ClassifierPipeline, ItemClassified, PipelineOutput, PipelineRun};
pub use ports::{ArchiveEncoder, FaceAnalyzer, ImageSource, ProgressEvent, ProgressSink};
pub use session::{validate_batch, Session, SessionError, SessionEvent, SessionState, Step};
