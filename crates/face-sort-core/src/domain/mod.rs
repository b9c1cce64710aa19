//! Core domain types for sorting photos by detected gender.

mod archive;
mod buckets;
mod classifier;
mod diagnostic;
mod item;
mod outcome;

pub use archive::{Archive, ArchiveEntry, ARCHIVE_FILE_NAME};
pub use buckets::{BucketCounts, ProgressSnapshot, ResultBuckets};
pub use classifier::{ImageClassifier, Verdict};
pub use diagnostic::{ItemDiagnostic, UnknownReason};
pub use item::{ImageItem, OCTET_STREAM};
pub use outcome::{Gender, GenderEstimate, Outcome};
