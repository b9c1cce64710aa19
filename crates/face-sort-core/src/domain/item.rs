//! Input items accepted into a sorting batch.

use std::sync::Arc;

/// Media type declared for payloads whose type could not be determined.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A named binary payload submitted for classification.
///
/// Items are immutable once created. Cloning is cheap: the bytes are shared.
#[derive(Debug, Clone)]
pub struct ImageItem {
    name: String,
    media_type: String,
    data: ItemData,
}

#[derive(Debug, Clone)]
enum ItemData {
    Bytes(Arc<[u8]>),
    Unreadable(String),
}

impl ImageItem {
    /// Creates an item from its file name, declared media type and bytes.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: ItemData::Bytes(bytes.into()),
        }
    }

    /// Creates an item whose bytes could not be read by the input surface.
    ///
    /// Such items still travel through the pipeline and end up in the
    /// `Unknown` bucket.
    #[must_use]
    pub fn unreadable(
        name: impl Into<String>,
        media_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: ItemData::Unreadable(reason.into()),
        }
    }

    /// Original file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type, e.g. `image/jpeg`.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns true if the declared media type is an `image/*` type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.media_type
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
    }

    /// Payload bytes, or `None` if the item could not be read.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.data {
            ItemData::Bytes(bytes) => Some(bytes),
            ItemData::Unreadable(_) => None,
        }
    }

    /// The read failure recorded for this item, if any.
    #[must_use]
    pub fn read_error(&self) -> Option<&str> {
        match &self.data {
            ItemData::Bytes(_) => None,
            ItemData::Unreadable(reason) => Some(reason),
        }
    }

    /// Payload size in bytes (zero for unreadable items).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes().map_or(0, <[u8]>::len)
    }

    /// Returns true if the payload is empty or unreadable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_media_types() {
        assert!(ImageItem::new("a.jpg", "image/jpeg", vec![1]).is_image());
        assert!(ImageItem::new("a.png", "IMAGE/PNG", vec![1]).is_image());
        assert!(!ImageItem::new("a.txt", "text/plain", vec![1]).is_image());
        assert!(!ImageItem::new("a", OCTET_STREAM, vec![1]).is_image());
        assert!(!ImageItem::new("a", "image", vec![1]).is_image());
    }

    #[test]
    fn test_unreadable_item() {
        let item = ImageItem::unreadable("broken.jpg", "image/jpeg", "permission denied");
        assert!(item.bytes().is_none());
        assert_eq!(item.read_error(), Some("permission denied"));
        assert!(item.is_empty());
        assert!(item.is_image());
    }

    #[test]
    fn test_clone_shares_bytes() {
        let item = ImageItem::new("a.png", "image/png", vec![1, 2, 3]);
        let copy = item.clone();
        assert_eq!(item.bytes(), copy.bytes());
        assert_eq!(copy.len(), 3);
    }
}
