//! Classification outcomes and the raw estimates they are derived from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The bucket an item is routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A face was found and estimated male with sufficient confidence.
    Male,
    /// A face was found and estimated female with sufficient confidence.
    Female,
    /// Anything else: no face, low confidence, or a processing failure.
    Unknown,
}

impl Outcome {
    /// All outcomes in archive order.
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Unknown];

    /// Folder name used for this outcome inside the archive.
    #[must_use]
    pub const fn group_name(self) -> &'static str {
        match self {
            Self::Male => "Boys",
            Self::Female => "Girls",
            Self::Unknown => "Unsorted",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Gender label reported by a face analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl From<Gender> for Outcome {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self::Male,
            Gender::Female => Self::Female,
        }
    }
}

/// A gender estimate for the most prominent face in an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenderEstimate {
    /// Estimated label.
    pub gender: Gender,
    /// Confidence in the label, 0.0 to 1.0.
    pub confidence: f32,
}

impl GenderEstimate {
    /// Creates an estimate.
    #[must_use]
    pub const fn new(gender: Gender, confidence: f32) -> Self {
        Self { gender, confidence }
    }

    /// Builds an estimate from a binary classifier's probability of `Male`.
    ///
    /// The label is the more likely class and the confidence is that class's
    /// probability, so it never drops below 0.5.
    #[must_use]
    pub fn from_male_probability(p_male: f32) -> Self {
        let p_male = p_male.clamp(0.0, 1.0);
        if p_male >= 0.5 {
            Self::new(Gender::Male, p_male)
        } else {
            Self::new(Gender::Female, 1.0 - p_male)
        }
    }
}
