//! Archive artifact types.

use std::sync::Arc;

/// Default file name of the produced artifact.
pub const ARCHIVE_FILE_NAME: &str = "sorted_images.zip";

/// One file to be placed inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveEntry<'a> {
    /// Folder inside the archive (`Boys`, `Girls`, `Unsorted`).
    pub group: &'static str,
    /// File name within the folder, unique per folder.
    pub file_name: &'a str,
    /// File contents.
    pub bytes: &'a [u8],
}

impl ArchiveEntry<'_> {
    /// Path of the entry inside the archive, `group/file_name`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.group, self.file_name)
    }
}

/// A finished, downloadable artifact.
///
/// Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    file_name: String,
    bytes: Arc<[u8]>,
    entry_count: usize,
}

impl Archive {
    /// Wraps encoded bytes.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>, entry_count: usize) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            entry_count,
        }
    }

    /// Suggested file name for saving.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Encoded archive bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of files stored in the archive.
    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entry_count
    }
}
