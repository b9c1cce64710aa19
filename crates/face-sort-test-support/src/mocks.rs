//! Mock implementations of core port traits.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use face_sort_core::domain::{
    ArchiveEntry, GenderEstimate, ImageClassifier, ImageItem, Outcome, ProgressSnapshot,
    UnknownReason, Verdict,
};
use face_sort_core::ports::{ArchiveEncoder, FaceAnalyzer, ImageSource, ProgressEvent, ProgressSink};

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built items and tracks iteration for assertions.
pub struct MockImageSource {
    items: Vec<ImageItem>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockImageSource {
    /// Creates a new mock source with the given items.
    #[must_use]
    pub fn new(items: Vec<ImageItem>) -> Self {
        Self {
            items,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSource for MockImageSource {
    fn items(&self) -> Box<dyn Iterator<Item = ImageItem> + Send + '_> {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Box::new(self.items.iter().cloned())
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Scripted response of a [`ScriptedAnalyzer`].
pub type AnalyzerResponse = Result<Option<GenderEstimate>, String>;

/// `FaceAnalyzer` returning queued responses in call order.
///
/// Once the queue is empty every call reports no face.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    responses: Mutex<VecDeque<AnalyzerResponse>>,
    calls: Mutex<usize>,
}

impl ScriptedAnalyzer {
    /// Creates an analyzer answering with `responses` in order.
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = AnalyzerResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of images analyzed.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FaceAnalyzer for ScriptedAnalyzer {
    fn analyze(&self, _image: &image::DynamicImage) -> anyhow::Result<Option<GenderEstimate>> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Ok(estimate)) => Ok(estimate),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(None),
        }
    }
}

/// `ImageClassifier` answering by item name.
///
/// Unscripted names are `Unknown` with no face found. Every classified name
/// is recorded in call order.
#[derive(Default)]
pub struct ScriptedClassifier {
    verdicts: HashMap<String, Verdict>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    /// Creates a classifier with no scripted names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `outcome` for items named `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, outcome: Outcome) -> Self {
        let verdict = match outcome {
            Outcome::Unknown => Verdict::unknown(UnknownReason::NoFace),
            sorted => Verdict::sorted(sorted),
        };
        self.verdicts.insert(name.into(), verdict);
        self
    }

    /// Returns the names classified so far, in order.
    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ImageClassifier for ScriptedClassifier {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn classify(&self, item: &ImageItem) -> Verdict {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item.name().to_string());
        self.verdicts
            .get(item.name())
            .cloned()
            .unwrap_or_else(|| Verdict::unknown(UnknownReason::NoFace))
    }
}

/// `ArchiveEncoder` that records entry paths instead of zipping.
///
/// The encoded bytes are each `path\tlength` line, so equal inputs produce
/// identical archives. Can be told to fail a number of times first.
#[derive(Default)]
pub struct MockArchiveEncoder {
    calls: Mutex<Vec<Vec<String>>>,
    failures_left: Mutex<usize>,
}

impl MockArchiveEncoder {
    /// Creates an encoder that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an encoder whose first `times` calls fail.
    #[must_use]
    pub fn failing(times: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures_left: Mutex::new(times),
        }
    }

    /// Returns the entry paths of every encode call, failed ones included.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the entry paths of the most recent encode call.
    #[must_use]
    pub fn last_paths(&self) -> Vec<String> {
        self.calls().pop().unwrap_or_default()
    }
}

impl ArchiveEncoder for MockArchiveEncoder {
    fn encode(&self, entries: &[ArchiveEntry<'_>]) -> anyhow::Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entries.iter().map(ArchiveEntry::path).collect());

        let mut failures_left = self
            .failures_left
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *failures_left > 0 {
            *failures_left -= 1;
            anyhow::bail!("mock encoder failure");
        }

        Ok(entries
            .iter()
            .map(|e| format!("{}\t{}\n", e.path(), e.bytes.len()))
            .collect::<String>()
            .into_bytes())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the snapshots of every `Classified` event, in order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Classified { snapshot, .. } => Some(snapshot),
                _ => None,
            })
            .collect()
    }

    /// Returns the outcomes of every `Classified` event, in order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<(String, Outcome)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Classified { name, outcome, .. } => Some((name, outcome)),
                _ => None,
            })
            .collect()
    }

    /// Returns the final snapshot from the `Finished` event, if any.
    #[must_use]
    pub fn finished(&self) -> Option<ProgressSnapshot> {
        self.events().into_iter().find_map(|e| match e {
            ProgressEvent::Finished { snapshot, .. } => Some(snapshot),
            _ => None,
        })
    }

    /// Returns whether an `ArchiveFailed` event was received.
    #[must_use]
    pub fn archive_failed(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::ArchiveFailed { .. }))
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
