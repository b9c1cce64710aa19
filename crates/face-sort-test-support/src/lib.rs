//! Test support utilities for face-sort.
//!
//! Provides mocks for every core port and synthetic batch items, so sessions
//! can be driven end to end without model weights.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use face_sort_core::{ImageClassifier, Outcome, Session};
//! use face_sort_test_support::{MockArchiveEncoder, ScriptedClassifier, SyntheticImageBuilder};
//!
//! let classifier = ScriptedClassifier::new().with("a.png", Outcome::Female);
//! let mut session = Session::new(Arc::new(MockArchiveEncoder::new()));
//! session
//!     .initialize(|| Ok(Arc::new(classifier) as Arc<dyn ImageClassifier>))
//!     .unwrap();
//! session.submit(SyntheticImageBuilder::batch(&["a.png"])).unwrap();
//! session.process(&()).unwrap();
//! assert_eq!(session.buckets().counts().female, 1);
//! ```

mod builders;
mod mocks;

pub use builders::SyntheticImageBuilder;
pub use mocks::{
    AnalyzerResponse, MockArchiveEncoder, MockImageSource, MockProgressSink, ScriptedAnalyzer,
    ScriptedClassifier,
};
