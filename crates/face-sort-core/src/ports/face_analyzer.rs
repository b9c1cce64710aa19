//! Face analysis port.

use crate::domain::GenderEstimate;

/// Port for the inference capability.
///
/// Implementations are fully initialized (models loaded) on construction.
pub trait FaceAnalyzer: Send + Sync {
    /// Estimates the gender of the most prominent face in `image`.
    ///
    /// Returns `Ok(None)` when no face is found.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn analyze(&self, image: &image::DynamicImage) -> anyhow::Result<Option<GenderEstimate>>;
}
