//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and the
//! external capabilities it orchestrates: face analysis, archive encoding,
//! the input surface and progress display.

mod archive_encoder;
mod face_analyzer;
mod image_source;
mod progress;

pub use archive_encoder::ArchiveEncoder;
pub use face_analyzer::FaceAnalyzer;
pub use image_source::ImageSource;
pub use progress::{ProgressEvent, ProgressSink};
