//! Detection adapter: turns raw item bytes into an outcome.
//!
//! Wraps a [`FaceAnalyzer`] with decoding and the confidence threshold, and
//! folds every per-item failure into `Unknown`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{ImageClassifier, ImageItem, UnknownReason, Verdict};
use crate::ports::FaceAnalyzer;

/// Estimates below this confidence are classified `Unknown`.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Gender classifier backed by a face analyzer.
pub struct GenderClassifier {
    analyzer: Arc<dyn FaceAnalyzer>,
    threshold: f32,
}

impl GenderClassifier {
    /// Creates a classifier with the default confidence threshold.
    #[must_use]
    pub fn new(analyzer: Arc<dyn FaceAnalyzer>) -> Self {
        Self {
            analyzer,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Sets the confidence threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// The confidence threshold in use.
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl ImageClassifier for GenderClassifier {
    fn name(&self) -> &'static str {
        "gender"
    }

    fn classify(&self, item: &ImageItem) -> Verdict {
        let Some(bytes) = item.bytes() else {
            let message = item.read_error().unwrap_or_default().to_string();
            warn!("Unreadable item {}: {message}", item.name());
            return Verdict::unknown(UnknownReason::Unreadable { message });
        };

        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to decode {}: {e}", item.name());
                return Verdict::unknown(UnknownReason::DecodeFailed {
                    message: e.to_string(),
                });
            }
        };

        match self.analyzer.analyze(&image) {
            Err(e) => {
                warn!("Face analysis failed for {}: {e:#}", item.name());
                Verdict::unknown(UnknownReason::DetectionFailed {
                    message: format!("{e:#}"),
                })
            }
            Ok(None) => {
                debug!("No face found in {}", item.name());
                Verdict::unknown(UnknownReason::NoFace)
            }
            Ok(Some(estimate))
                if estimate.confidence.is_nan() || estimate.confidence < self.threshold =>
            {
                debug!(
                    "Low confidence for {}: {:?} at {:.3}",
                    item.name(),
                    estimate.gender,
                    estimate.confidence
                );
                Verdict::unknown(UnknownReason::LowConfidence {
                    gender: estimate.gender,
                    confidence: estimate.confidence,
                })
            }
            Ok(Some(estimate)) => {
                debug!(
                    "{} classified {:?} ({:.3})",
                    item.name(),
                    estimate.gender,
                    estimate.confidence
                );
                Verdict::sorted(estimate.gender.into())
            }
        }
    }
}
