//! Candle-backed [`FaceAnalyzer`]: `BlazeFace` detection followed by the
//! gender head on the strongest face.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{load_safetensors, select_device, BlazeFace, GenderNet};
use crate::domain::GenderEstimate;
use crate::ports::FaceAnalyzer;

/// Default floor for the detector score of the face that gets classified.
pub const DEFAULT_MIN_FACE_CONFIDENCE: f32 = 0.75;

/// Weight files for the two networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// `BlazeFace` weights.
    pub face_detector: PathBuf,
    /// Gender classifier weights.
    pub gender: PathBuf,
}

/// Face analyzer running both networks with Candle.
pub struct CandleGenderAnalyzer {
    detector: BlazeFace,
    gender: GenderNet,
    min_face_confidence: f32,
}

impl CandleGenderAnalyzer {
    /// Loads both networks.
    ///
    /// # Errors
    ///
    /// Returns an error if either weight file is missing or invalid.
    pub fn load(paths: &ModelPaths, min_face_confidence: f32, prefer_gpu: bool) -> Result<Self> {
        let device = select_device(prefer_gpu);

        let detector = load_safetensors(&paths.face_detector, &device)
            .and_then(BlazeFace::new)
            .context("Failed to load face detector")?;
        let gender = load_safetensors(&paths.gender, &device)
            .and_then(GenderNet::new)
            .context("Failed to load gender classifier")?;

        info!("Face analyzer ready (min face confidence {min_face_confidence})");
        Ok(Self {
            detector,
            gender,
            min_face_confidence,
        })
    }
}

impl FaceAnalyzer for CandleGenderAnalyzer {
    fn analyze(&self, image: &image::DynamicImage) -> Result<Option<GenderEstimate>> {
        let faces = self.detector.detect(image)?;
        debug!("Detector returned {} face(s)", faces.len());

        let Some(face) = faces
            .into_iter()
            .filter(|f| f.score >= self.min_face_confidence)
            .max_by(|a, b| a.score.total_cmp(&b.score))
        else {
            return Ok(None);
        };

        let input = self.gender.preprocess(image, &face.bbox)?;
        let p_male = self.gender.male_probability(&input)?;
        debug!("Face score {:.3}, P(male) {p_male:.3}", face.score);

        Ok(Some(GenderEstimate::from_male_probability(p_male)))
    }
}
