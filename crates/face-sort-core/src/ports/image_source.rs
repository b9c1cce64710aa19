//! Input surface port for collecting a batch of items.

use crate::domain::ImageItem;

/// Port for loading the items of a batch from a source.
pub trait ImageSource: Send + Sync {
    /// Returns an iterator over the items of this source.
    ///
    /// Items that cannot be read are yielded as
    /// [`ImageItem::unreadable`](crate::domain::ImageItem::unreadable)
    /// rather than dropped, so they are still accounted for downstream.
    fn items(&self) -> Box<dyn Iterator<Item = ImageItem> + Send + '_>;

    /// Returns the total number of items, if known.
    fn count_hint(&self) -> Option<usize>;
}
