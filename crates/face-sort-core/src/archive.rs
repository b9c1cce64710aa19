//! Archive builder: lays buckets out as folders and hands them to an encoder.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::domain::{Archive, ArchiveEntry, ResultBuckets, ARCHIVE_FILE_NAME};
use crate::ports::ArchiveEncoder;

/// Name used when an item's file name has no usable final component.
const FALLBACK_NAME: &str = "unnamed";

/// Builds the downloadable archive from classified buckets.
#[derive(Clone)]
pub struct ArchiveBuilder {
    encoder: Arc<dyn ArchiveEncoder>,
    file_name: String,
}

impl ArchiveBuilder {
    /// Creates a builder producing `sorted_images.zip`.
    #[must_use]
    pub fn new(encoder: Arc<dyn ArchiveEncoder>) -> Self {
        Self {
            encoder,
            file_name: ARCHIVE_FILE_NAME.to_string(),
        }
    }

    /// Overrides the artifact file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Encodes `buckets` into one archive.
    ///
    /// Each non-empty bucket becomes a folder; empty buckets are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails.
    pub fn build(&self, buckets: &ResultBuckets) -> Result<Archive> {
        let names = plan_file_names(buckets);
        let entries: Vec<ArchiveEntry<'_>> = buckets
            .iter()
            .flat_map(|(outcome, items)| {
                items.iter().map(move |item| (outcome.group_name(), item))
            })
            .zip(&names)
            .map(|((group, item), file_name)| ArchiveEntry {
                group,
                file_name,
                bytes: item.bytes().unwrap_or_default(),
            })
            .collect();

        debug!("Encoding {} archive entries", entries.len());
        let bytes = self
            .encoder
            .encode(&entries)
            .with_context(|| format!("Failed to encode {}", self.file_name))?;

        info!(
            "Built {} ({} files, {} bytes)",
            self.file_name,
            entries.len(),
            bytes.len()
        );
        Ok(Archive::new(self.file_name.clone(), bytes, entries.len()))
    }
}

/// Assigns every item a file name unique within its folder, in bucket order.
fn plan_file_names(buckets: &ResultBuckets) -> Vec<String> {
    let mut names = Vec::with_capacity(buckets.len());
    for (_, items) in buckets.iter() {
        let mut taken = HashSet::new();
        for item in items {
            names.push(unique_name(base_name(item.name()), &mut taken));
        }
    }
    names
}

/// Strips any directory part from a submitted name.
fn base_name(name: &str) -> &str {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    match last {
        "" | "." | ".." => FALLBACK_NAME,
        other => other,
    }
}

/// Returns `name`, or `stem (n).ext` with the smallest free `n`.
fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };

    let mut n = 1usize;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{ImageItem, Outcome};

    /// Encodes entries as newline-separated paths.
    #[derive(Default)]
    struct ListingEncoder(Mutex<Vec<String>>);

    impl ArchiveEncoder for ListingEncoder {
        fn encode(&self, entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>> {
            let paths: Vec<String> = entries.iter().map(ArchiveEntry::path).collect();
            let listing = paths.join("\n").into_bytes();
            *self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = paths;
            Ok(listing)
        }
    }

    struct FailingEncoder;

    impl ArchiveEncoder for FailingEncoder {
        fn encode(&self, _entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>> {
            anyhow::bail!("disk full")
        }
    }

    fn item(name: &str) -> ImageItem {
        ImageItem::new(name, "image/jpeg", vec![1, 2])
    }

    #[test]
    fn test_groups_follow_outcomes() {
        let mut buckets = ResultBuckets::new();
        buckets.push(Outcome::Male, item("a.jpg"));
        buckets.push(Outcome::Female, item("b.jpg"));
        buckets.push(Outcome::Unknown, item("c.jpg"));

        let encoder = Arc::new(ListingEncoder::default());
        let archive = ArchiveBuilder::new(encoder.clone()).build(&buckets);
        assert!(archive.is_ok());

        let paths = encoder.0.lock().map(|p| p.clone()).unwrap_or_default();
        assert_eq!(paths, ["Boys/a.jpg", "Girls/b.jpg", "Unsorted/c.jpg"]);
    }

    #[test]
    fn test_empty_buckets_build() {
        let archive = ArchiveBuilder::new(Arc::new(ListingEncoder::default()))
            .build(&ResultBuckets::new());
        assert!(archive.is_ok_and(|a| a.entry_count() == 0 && a.file_name() == ARCHIVE_FILE_NAME));
    }

    #[test]
    fn test_collisions_are_suffixed_per_group() {
        let mut buckets = ResultBuckets::new();
        buckets.push(Outcome::Male, item("photo.jpg"));
        buckets.push(Outcome::Male, item("photo.jpg"));
        buckets.push(Outcome::Male, item("photo (1).jpg"));
        buckets.push(Outcome::Female, item("photo.jpg"));

        assert_eq!(
            plan_file_names(&buckets),
            ["photo.jpg", "photo (1).jpg", "photo (1) (1).jpg", "photo.jpg"]
        );
    }

    #[test]
    fn test_unique_name_without_extension() {
        let mut taken = HashSet::new();
        assert_eq!(unique_name("README", &mut taken), "README");
        assert_eq!(unique_name("README", &mut taken), "README (1)");
        assert_eq!(unique_name(".hidden", &mut taken), ".hidden");
        assert_eq!(unique_name(".hidden", &mut taken), ".hidden (1)");
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("a/b/c.jpg"), "c.jpg");
        assert_eq!(base_name(r"C:\photos\d.png"), "d.png");
        assert_eq!(base_name("dir/"), FALLBACK_NAME);
        assert_eq!(base_name(".."), FALLBACK_NAME);
    }

    #[test]
    fn test_unreadable_items_are_stored_empty() {
        let mut buckets = ResultBuckets::new();
        buckets.push(
            Outcome::Unknown,
            ImageItem::unreadable("x.jpg", "image/jpeg", "denied"),
        );
        let archive = ArchiveBuilder::new(Arc::new(ListingEncoder::default())).build(&buckets);
        assert!(archive.is_ok_and(|a| a.entry_count() == 1));
    }

    #[test]
    fn test_encoder_failure_propagates() {
        let mut buckets = ResultBuckets::new();
        buckets.push(Outcome::Male, item("a.jpg"));
        let err = ArchiveBuilder::new(Arc::new(FailingEncoder))
            .with_file_name("out.zip")
            .build(&buckets);
        assert!(err.is_err_and(|e| format!("{e:#}").contains("disk full")));
    }
}
