//! End-of-run summary, as text or JSON.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::ValueEnum;
use face_sort_core::{BucketCounts, ItemDiagnostic, ProgressSnapshot};
use serde::Serialize;
use tracing::debug;

/// Summary output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// A single JSON object
    Json,
}

impl SummaryFormat {
    /// Parses a config file value.
    #[must_use]
    pub fn from_config(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// What a sorting run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SortSummary {
    /// Where the archive was written.
    pub archive: PathBuf,
    /// Archive size in bytes.
    pub archive_bytes: usize,
    /// Photos classified.
    pub processed: usize,
    /// Photos per group.
    pub counts: BucketCounts,
    /// Non-image files left out of the batch.
    pub skipped: usize,
    /// Why each unsorted photo is unsorted.
    pub unsorted: Vec<ItemDiagnostic>,
    /// Completion time, RFC 3339.
    pub finished_at: String,
}

impl SortSummary {
    /// Builds a summary stamped with the current time.
    #[must_use]
    pub fn new(
        archive: PathBuf,
        archive_bytes: usize,
        snapshot: ProgressSnapshot,
        skipped: usize,
        unsorted: Vec<ItemDiagnostic>,
    ) -> Self {
        Self {
            archive,
            archive_bytes,
            processed: snapshot.processed,
            counts: snapshot.counts,
            skipped,
            unsorted,
            finished_at: rfc3339_now(),
        }
    }

    /// Renders the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(&self, format: SummaryFormat, pretty: bool) -> Result<String> {
        Ok(match format {
            SummaryFormat::Json if pretty => serde_json::to_string_pretty(self)?,
            SummaryFormat::Json => serde_json::to_string(self)?,
            SummaryFormat::Text => self.text(),
        })
    }

    fn text(&self) -> String {
        let mut out = format!(
            "Sorted {} photo(s) into {} ({} bytes)\n",
            self.processed,
            self.archive.display(),
            self.archive_bytes
        );
        for (group, count) in [
            ("Boys", self.counts.male),
            ("Girls", self.counts.female),
            ("Unsorted", self.counts.unknown),
        ] {
            let _ = writeln!(out, "  {group:<9} {count}");
        }
        if self.skipped > 0 {
            let _ = writeln!(out, "Skipped {} non-image file(s)", self.skipped);
        }
        for diagnostic in &self.unsorted {
            let _ = writeln!(out, "  {}: {}", diagnostic.name, diagnostic.reason);
        }
        out.truncate(out.trim_end().len());
        out
    }
}

fn rfc3339_now() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use face_sort_core::UnknownReason;

    use super::*;

    fn summary() -> SortSummary {
        let snapshot = ProgressSnapshot {
            processed: 3,
            total: 3,
            counts: BucketCounts {
                male: 1,
                female: 1,
                unknown: 1,
            },
        };
        SortSummary::new(
            PathBuf::from("sorted_images.zip"),
            512,
            snapshot,
            2,
            vec![ItemDiagnostic {
                name: "c.png".to_string(),
                reason: UnknownReason::NoFace,
            }],
        )
    }

    #[test]
    fn test_text_summary() {
        let text = summary().render(SummaryFormat::Text, false).unwrap();
        assert!(text.starts_with("Sorted 3 photo(s) into sorted_images.zip (512 bytes)"));
        assert!(text.contains("Boys      1"));
        assert!(text.contains("Skipped 2 non-image file(s)"));
        assert!(text.ends_with("c.png: no face found"));
    }

    #[test]
    fn test_json_summary() {
        let json = summary().render(SummaryFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["counts"]["female"], 1);
        assert_eq!(value["unsorted"][0]["name"], "c.png");
        assert_eq!(value["unsorted"][0]["reason"], "no_face");
        assert!(value["finished_at"].as_str().is_some_and(|t| t.contains('T')));
    }

    #[test]
    fn test_pretty_json_is_multiline() {
        let json = summary().render(SummaryFormat::Json, true).unwrap();
        assert!(json.lines().count() > 1);
    }

    #[test]
    fn test_format_from_config() {
        assert_eq!(SummaryFormat::from_config("json"), Some(SummaryFormat::Json));
        assert_eq!(SummaryFormat::from_config("yaml"), None);
    }
}
