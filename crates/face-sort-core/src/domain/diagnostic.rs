//! Per-item diagnostics for items that ended up unsorted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Gender, Outcome};

/// Why an item was classified as `Unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnknownReason {
    /// The input surface could not read the file.
    Unreadable {
        /// Read error.
        message: String,
    },
    /// The bytes are not a decodable still image.
    DecodeFailed {
        /// Decoder error.
        message: String,
    },
    /// The face analyzer returned an error.
    DetectionFailed {
        /// Analyzer error.
        message: String,
    },
    /// No face was found.
    NoFace,
    /// A face was found but the estimate was below the threshold.
    LowConfidence {
        /// Estimated label.
        gender: Gender,
        /// Estimate confidence.
        confidence: f32,
    },
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { message } => write!(f, "unreadable: {message}"),
            Self::DecodeFailed { message } => write!(f, "not a decodable image: {message}"),
            Self::DetectionFailed { message } => write!(f, "face analysis failed: {message}"),
            Self::NoFace => f.write_str("no face found"),
            Self::LowConfidence { gender, confidence } => write!(
                f,
                "{} at {confidence:.2} is below the threshold",
                Outcome::from(*gender)
            ),
        }
    }
}

/// Diagnostic record keyed by item name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDiagnostic {
    /// Item file name.
    pub name: String,
    /// Reason for the `Unknown` outcome.
    #[serde(flatten)]
    pub reason: UnknownReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display() {
        assert_eq!(UnknownReason::NoFace.to_string(), "no face found");
        let low = UnknownReason::LowConfidence {
            gender: Gender::Female,
            confidence: 0.55,
        };
        assert_eq!(low.to_string(), "female at 0.55 is below the threshold");
    }
}
