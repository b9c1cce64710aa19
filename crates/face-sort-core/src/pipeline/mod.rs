//! Sequential classification pipeline.
//!
//! A batch is classified strictly in input order, one item at a time. Each
//! step appends the item to its bucket and yields an updated snapshot, so
//! progress is monotonic and needs no locking.

mod progress;

use std::sync::Arc;

use tracing::{debug, info};

pub use progress::ProgressTracker;

use crate::domain::{
    ImageClassifier, ImageItem, ItemDiagnostic, Outcome, ProgressSnapshot, ResultBuckets,
};
use crate::ports::{ProgressEvent, ProgressSink};

/// One classified item, as yielded by [`PipelineRun`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemClassified {
    /// Index in the batch (0-based).
    pub index: usize,
    /// Item file name.
    pub name: String,
    /// Assigned outcome.
    pub outcome: Outcome,
    /// Progress after this item.
    pub snapshot: ProgressSnapshot,
}

impl ItemClassified {
    /// Converts into the matching progress event.
    #[must_use]
    pub fn into_event(self) -> ProgressEvent {
        ProgressEvent::Classified {
            index: self.index,
            name: self.name,
            outcome: self.outcome,
            snapshot: self.snapshot,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Items grouped by outcome.
    pub buckets: ResultBuckets,
    /// Reasons for every `Unknown` outcome.
    pub diagnostics: Vec<ItemDiagnostic>,
    /// Final progress.
    pub snapshot: ProgressSnapshot,
}

/// Classifier pipeline bound to one classifier.
#[derive(Clone)]
pub struct ClassifierPipeline {
    classifier: Arc<dyn ImageClassifier>,
}

impl ClassifierPipeline {
    /// Creates a pipeline using `classifier` for every item.
    #[must_use]
    pub fn new(classifier: Arc<dyn ImageClassifier>) -> Self {
        Self { classifier }
    }

    /// Starts a run over `batch`. Nothing is classified until the run is
    /// iterated.
    #[must_use]
    pub fn start(&self, batch: Vec<ImageItem>) -> PipelineRun {
        info!(
            "Starting {} classifier over {} items",
            self.classifier.name(),
            batch.len()
        );
        PipelineRun {
            classifier: Arc::clone(&self.classifier),
            tracker: ProgressTracker::new(batch.len()),
            pending: batch.into_iter(),
            index: 0,
            buckets: ResultBuckets::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Classifies the whole batch, publishing progress to `sink`.
    ///
    /// An empty batch completes immediately with empty buckets.
    pub fn run(&self, batch: Vec<ImageItem>, sink: &dyn ProgressSink) -> PipelineOutput {
        let mut run = self.start(batch);
        sink.on_event(ProgressEvent::Started {
            total: run.snapshot().total,
        });
        for classified in run.by_ref() {
            sink.on_event(classified.into_event());
        }
        run.finish()
    }
}

/// A batch being classified.
///
/// Finite and not restartable: each call to `next` classifies one more item
/// until the batch is exhausted.
pub struct PipelineRun {
    classifier: Arc<dyn ImageClassifier>,
    pending: std::vec::IntoIter<ImageItem>,
    index: usize,
    tracker: ProgressTracker,
    buckets: ResultBuckets,
    diagnostics: Vec<ItemDiagnostic>,
}

impl PipelineRun {
    /// Current progress.
    #[must_use]
    pub const fn snapshot(&self) -> ProgressSnapshot {
        self.tracker.snapshot()
    }

    /// Returns true once every item has been classified.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pending.len() == 0
    }

    /// Buckets filled so far.
    #[must_use]
    pub const fn buckets(&self) -> &ResultBuckets {
        &self.buckets
    }

    /// Consumes the run, returning buckets, diagnostics and final progress.
    ///
    /// Items not yet classified are dropped.
    #[must_use]
    pub fn finish(self) -> PipelineOutput {
        PipelineOutput {
            snapshot: self.tracker.snapshot(),
            buckets: self.buckets,
            diagnostics: self.diagnostics,
        }
    }
}

impl Iterator for PipelineRun {
    type Item = ItemClassified;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.pending.next()?;
        let verdict = self.classifier.classify(&item);
        let name = item.name().to_string();

        if let Some(reason) = verdict.diagnostic {
            self.diagnostics.push(ItemDiagnostic {
                name: name.clone(),
                reason,
            });
        }

        self.buckets.push(verdict.outcome, item);
        self.tracker.record(verdict.outcome);

        let index = self.index;
        self.index += 1;
        let snapshot = self.tracker.snapshot();
        debug!(
            "[{}/{}] {name} -> {}",
            snapshot.processed, snapshot.total, verdict.outcome
        );

        Some(ItemClassified {
            index,
            name,
            outcome: verdict.outcome,
            snapshot,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

impl ExactSizeIterator for PipelineRun {}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{UnknownReason, Verdict};

    /// Classifies by the first character of the item name.
    struct ByInitial;

    impl ImageClassifier for ByInitial {
        fn name(&self) -> &'static str {
            "by-initial"
        }

        fn classify(&self, item: &ImageItem) -> Verdict {
            match item.name().chars().next() {
                Some('m') => Verdict::sorted(Outcome::Male),
                Some('f') => Verdict::sorted(Outcome::Female),
                _ => Verdict::unknown(UnknownReason::NoFace),
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for Recorder {
        fn on_event(&self, event: ProgressEvent) {
            self.0
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event);
        }
    }

    fn batch(names: &[&str]) -> Vec<ImageItem> {
        names
            .iter()
            .map(|n| ImageItem::new(*n, "image/png", vec![0]))
            .collect()
    }

    fn pipeline() -> ClassifierPipeline {
        ClassifierPipeline::new(Arc::new(ByInitial))
    }

    #[test]
    fn test_items_land_in_one_bucket_each() {
        let output = pipeline().run(batch(&["m1", "f1", "x1", "m2"]), &());

        assert_eq!(output.buckets.len(), 4);
        assert_eq!(output.snapshot.processed, 4);
        assert_eq!(output.snapshot.counts.total(), 4);
        let males: Vec<_> = output
            .buckets
            .get(Outcome::Male)
            .iter()
            .map(ImageItem::name)
            .collect();
        assert_eq!(males, ["m1", "m2"]);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].name, "x1");
    }

    #[test]
    fn test_empty_batch_completes_immediately() {
        let output = pipeline().run(Vec::new(), &());
        assert!(output.buckets.is_empty());
        assert_eq!(output.snapshot, ProgressSnapshot::default());
    }

    #[test]
    fn test_run_yields_monotonic_snapshots() {
        let mut run = pipeline().start(batch(&["m", "f", "z"]));
        assert_eq!(run.len(), 3);
        assert_eq!(run.snapshot().processed, 0);

        let processed: Vec<_> = run.by_ref().map(|c| c.snapshot.processed).collect();
        assert_eq!(processed, [1, 2, 3]);
        assert!(run.is_done());
        assert!(run.next().is_none());
    }

    #[test]
    fn test_run_publishes_events_in_order() {
        let sink = Recorder::default();
        pipeline().run(batch(&["m", "f"]), &sink);

        let events = sink.0.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ProgressEvent::Started { total: 2 });
        assert!(matches!(
            &events[2],
            ProgressEvent::Classified { index: 1, outcome: Outcome::Female, .. }
        ));
    }
}
