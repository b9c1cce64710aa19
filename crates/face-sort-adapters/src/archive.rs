//! Zip encoding of the sorted archive.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use face_sort_core::{ArchiveEncoder, ArchiveEntry};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Writes entries into an in-memory zip, one folder per group.
///
/// Timestamps are pinned so identical input yields identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveEncoder;

impl ZipArchiveEncoder {
    /// Creates a deflating encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn options(self) -> FileOptions {
        FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
    }
}

impl ArchiveEncoder for ZipArchiveEncoder {
    fn encode(&self, entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>> {
        let options = self.options();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut current_group = None;

        for entry in entries {
            if current_group != Some(entry.group) {
                zip.add_directory(format!("{}/", entry.group), options)
                    .with_context(|| format!("Failed to add folder {}", entry.group))?;
                current_group = Some(entry.group);
            }

            let path = entry.path();
            zip.start_file(path.as_str(), options)
                .with_context(|| format!("Failed to add {path}"))?;
            zip.write_all(entry.bytes)
                .with_context(|| format!("Failed to write {path}"))?;
        }

        let bytes = zip.finish().context("Failed to finalize zip")?.into_inner();
        debug!("Encoded {} entries into {} bytes", entries.len(), bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'a>(group: &'static str, file_name: &'a str, bytes: &'a [u8]) -> ArchiveEntry<'a> {
        ArchiveEntry {
            group,
            file_name,
            bytes,
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let entries = [entry("Boys", "a.jpg", b"aaaa"), entry("Girls", "b.jpg", b"bb")];
        let first = ZipArchiveEncoder::new().encode(&entries);
        let second = ZipArchiveEncoder::new().encode(&entries);
        assert!(first.is_ok());
        assert_eq!(first.ok(), second.ok());
    }

    #[test]
    fn test_empty_archive_is_valid_zip() {
        let bytes = ZipArchiveEncoder::new().encode(&[]).unwrap_or_default();
        let archive = zip::ZipArchive::new(Cursor::new(bytes));
        assert!(archive.is_ok_and(|a| a.is_empty()));
    }
}
