//! Filesystem input surface.

use std::path::{Path, PathBuf};

use face_sort_core::domain::OCTET_STREAM;
use face_sort_core::{ImageItem, ImageSource};
use image::ImageFormat;
use tracing::{debug, warn};

/// Collects batch items from files and directories.
///
/// Every regular file found becomes an item, images or not; non-image files
/// are filtered out by the session so they can be reported.
pub struct FsImageSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsImageSource {
    /// Creates a source over `paths`.
    ///
    /// Directories contribute their files; with `recursive` their
    /// subdirectories too.
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Returns every file under the configured paths, in a stable order.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
            Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };
        entries.sort();

        for path in entries {
            if path.is_file() {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

impl ImageSource for FsImageSource {
    fn items(&self) -> Box<dyn Iterator<Item = ImageItem> + Send + '_> {
        let files = self.files();
        debug!("Found {} files", files.len());

        Box::new(files.into_iter().map(|path| read_item(&path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.files().len())
    }
}

/// Media type guessed from the file extension.
#[must_use]
pub fn media_type(path: &Path) -> &'static str {
    ImageFormat::from_path(path).map_or(OCTET_STREAM, |format| format.to_mime_type())
}

/// Reads one file. Read failures become unreadable items.
///
/// Files without an image media type are not read: the session only counts
/// them, so they are passed on with an empty payload.
fn read_item(path: &Path) -> ImageItem {
    let name = path.to_string_lossy().into_owned();
    let media_type = media_type(path);

    let placeholder = ImageItem::new(name.as_str(), media_type, Vec::new());
    if !placeholder.is_image() {
        debug!("Not reading non-image file {}", path.display());
        return placeholder;
    }

    match std::fs::read(path) {
        Ok(bytes) => ImageItem::new(name, media_type, bytes),
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            ImageItem::unreadable(name, media_type, e.to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type() {
        assert_eq!(media_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(media_type(Path::new("b.png")), "image/png");
        assert_eq!(media_type(Path::new("c.webp")), "image/webp");
        assert_eq!(media_type(Path::new("notes.txt")), OCTET_STREAM);
        assert_eq!(media_type(Path::new("README")), OCTET_STREAM);
    }

    #[test]
    fn test_non_image_files_are_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let movie = dir.path().join("movie.mp4");
        std::fs::write(&movie, vec![0u8; 1 << 20]).unwrap();

        let item = read_item(&movie);
        assert!(!item.is_image());
        assert_eq!(item.bytes(), Some(&[][..]));
    }

    #[test]
    fn test_missing_path_yields_nothing() {
        let source = FsImageSource::new(vec![PathBuf::from("/nonexistent/face-sort")], true);
        assert_eq!(source.count_hint(), Some(0));
    }
}
