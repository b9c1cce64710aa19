//! Classifier trait used by the pipeline.

use super::{ImageItem, Outcome, UnknownReason};

/// Result of classifying one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Bucket the item belongs in.
    pub outcome: Outcome,
    /// Why the item is `Unknown`, when it is.
    pub diagnostic: Option<UnknownReason>,
}

impl Verdict {
    /// A confident `Male`/`Female` (or deliberately `Unknown`) outcome.
    #[must_use]
    pub const fn sorted(outcome: Outcome) -> Self {
        Self {
            outcome,
            diagnostic: None,
        }
    }

    /// An `Unknown` outcome with its reason.
    #[must_use]
    pub const fn unknown(reason: UnknownReason) -> Self {
        Self {
            outcome: Outcome::Unknown,
            diagnostic: Some(reason),
        }
    }
}

/// Maps an input item to an outcome.
///
/// Implementations must not fail: every error is folded into an `Unknown`
/// verdict so a single bad item never aborts a batch.
pub trait ImageClassifier: Send + Sync {
    /// Returns the name of this classifier.
    fn name(&self) -> &'static str;

    /// Classifies an item, reporting the reason for `Unknown` outcomes.
    fn classify(&self, item: &ImageItem) -> Verdict;

    /// Classifies an item, returning only the outcome.
    fn outcome(&self, item: &ImageItem) -> Outcome {
        self.classify(item).outcome
    }
}
