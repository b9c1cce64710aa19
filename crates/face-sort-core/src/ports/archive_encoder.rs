//! Archive encoding port.

use crate::domain::ArchiveEntry;

/// Port for packaging grouped files into a single binary artifact.
pub trait ArchiveEncoder: Send + Sync {
    /// Encodes `entries` into one archive.
    ///
    /// Entry paths (`group/file_name`) are unique.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn encode(&self, entries: &[ArchiveEntry<'_>]) -> anyhow::Result<Vec<u8>>;
}
