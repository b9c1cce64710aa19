//! Result buckets and the progress counters derived from them.

use serde::{Deserialize, Serialize};

use super::{ImageItem, Outcome};

/// Items grouped by outcome, each bucket in classification order.
#[derive(Debug, Clone, Default)]
pub struct ResultBuckets {
    male: Vec<ImageItem>,
    female: Vec<ImageItem>,
    unknown: Vec<ImageItem>,
}

impl ResultBuckets {
    /// Creates empty buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item to the bucket for `outcome`.
    pub fn push(&mut self, outcome: Outcome, item: ImageItem) {
        self.bucket_mut(outcome).push(item);
    }

    /// Items routed to `outcome`, in insertion order.
    #[must_use]
    pub fn get(&self, outcome: Outcome) -> &[ImageItem] {
        match outcome {
            Outcome::Male => &self.male,
            Outcome::Female => &self.female,
            Outcome::Unknown => &self.unknown,
        }
    }

    /// Iterates `(outcome, items)` pairs in archive order.
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, &[ImageItem])> {
        Outcome::ALL.into_iter().map(|o| (o, self.get(o)))
    }

    /// Per-bucket sizes.
    #[must_use]
    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            male: self.male.len(),
            female: self.female.len(),
            unknown: self.unknown.len(),
        }
    }

    /// Total number of items across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.male.len() + self.female.len() + self.unknown.len()
    }

    /// Returns true if every bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.male.clear();
        self.female.clear();
        self.unknown.clear();
    }

    fn bucket_mut(&mut self, outcome: Outcome) -> &mut Vec<ImageItem> {
        match outcome {
            Outcome::Male => &mut self.male,
            Outcome::Female => &mut self.female,
            Outcome::Unknown => &mut self.unknown,
        }
    }
}

/// Number of items per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    /// Items in the `Male` bucket.
    pub male: usize,
    /// Items in the `Female` bucket.
    pub female: usize,
    /// Items in the `Unknown` bucket.
    pub unknown: usize,
}

impl BucketCounts {
    /// Count for a single outcome.
    #[must_use]
    pub const fn get(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Male => self.male,
            Outcome::Female => self.female,
            Outcome::Unknown => self.unknown,
        }
    }

    /// Sum over all buckets.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.male + self.female + self.unknown
    }

    pub(crate) fn increment(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Male => self.male += 1,
            Outcome::Female => self.female += 1,
            Outcome::Unknown => self.unknown += 1,
        }
    }
}

/// Point-in-time view of batch progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Items classified so far.
    pub processed: usize,
    /// Items in the batch.
    pub total: usize,
    /// Bucket sizes; always sums to `processed`.
    pub counts: BucketCounts,
}

impl ProgressSnapshot {
    /// Returns true once every item in a non-empty batch has been classified.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.processed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> ImageItem {
        ImageItem::new(name, "image/png", vec![0])
    }

    #[test]
    fn test_push_preserves_order() {
        let mut buckets = ResultBuckets::new();
        buckets.push(Outcome::Male, item("a"));
        buckets.push(Outcome::Unknown, item("b"));
        buckets.push(Outcome::Male, item("c"));

        let names: Vec<_> = buckets.get(Outcome::Male).iter().map(ImageItem::name).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(buckets.len(), 3);
        assert_eq!(
            buckets.counts(),
            BucketCounts {
                male: 2,
                female: 0,
                unknown: 1
            }
        );
    }

    #[test]
    fn test_clear() {
        let mut buckets = ResultBuckets::new();
        buckets.push(Outcome::Female, item("a"));
        buckets.clear();
        assert!(buckets.is_empty());
        assert_eq!(buckets.counts().total(), 0);
    }

    #[test]
    fn test_iter_in_archive_order() {
        let buckets = ResultBuckets::new();
        let order: Vec<_> = buckets.iter().map(|(o, _)| o).collect();
        assert_eq!(order, Outcome::ALL);
    }

    #[test]
    fn test_snapshot_completion() {
        assert!(!ProgressSnapshot::default().is_complete());
        let snapshot = ProgressSnapshot {
            processed: 2,
            total: 2,
            counts: BucketCounts {
                male: 1,
                female: 1,
                unknown: 0,
            },
        };
        assert!(snapshot.is_complete());
    }
}
