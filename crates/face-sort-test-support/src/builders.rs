//! Synthetic batch items for testing.

use std::io::Cursor;

use face_sort_core::domain::{ImageItem, OCTET_STREAM};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Builder for creating synthetic batch items.
///
/// Images are small, fully decodable and encoded in memory, so tests need no
/// fixture files.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Encoded images ===

    /// Creates a decodable PNG item with a diagonal color gradient.
    #[must_use]
    pub fn png(name: &str) -> ImageItem {
        ImageItem::new(name, "image/png", Self::png_bytes(16, 16))
    }

    /// Creates a decodable JPEG item.
    #[must_use]
    pub fn jpeg(name: &str) -> ImageItem {
        ImageItem::new(name, "image/jpeg", Self::encode(&gradient(16, 16), ImageFormat::Jpeg))
    }

    /// Returns PNG bytes for a `width x height` gradient.
    #[must_use]
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        Self::encode(&gradient(width, height), ImageFormat::Png)
    }

    /// Creates one PNG item per name, in order.
    #[must_use]
    pub fn batch(names: &[&str]) -> Vec<ImageItem> {
        names.iter().map(|name| Self::png(name)).collect()
    }

    // === Edge cases ===

    /// Creates an item claiming `image/jpeg` whose bytes do not decode.
    #[must_use]
    pub fn corrupt(name: &str) -> ImageItem {
        ImageItem::new(name, "image/jpeg", b"\xFF\xD8 truncated".to_vec())
    }

    /// Creates an image item whose bytes could not be read.
    #[must_use]
    pub fn unreadable(name: &str) -> ImageItem {
        ImageItem::unreadable(name, "image/png", "permission denied")
    }

    /// Creates a plain-text item.
    #[must_use]
    pub fn text(name: &str) -> ImageItem {
        ImageItem::new(name, "text/plain", b"not an image".to_vec())
    }

    /// Creates an item of unknown type.
    #[must_use]
    pub fn binary(name: &str) -> ImageItem {
        ImageItem::new(name, OCTET_STREAM, vec![0, 1, 2, 3])
    }

    /// Encodes `image`; returns no bytes if encoding fails.
    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        match image.write_to(&mut cursor, format) {
            Ok(()) => cursor.into_inner(),
            Err(_) => Vec::new(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn gradient(width: u32, height: u32) -> DynamicImage {
    let span = (width + height).max(1);
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let v = ((x + y) * 255 / span) as u8;
        Rgb([v, 255 - v, 128])
    }))
}
