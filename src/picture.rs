//! Decoded image resource shared between the cache and display slots.

use image::{DynamicImage, RgbaImage};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};

/// Identifier of a logical picture, shared by both of its tiers.
pub trait PictureId: Hash + Eq + Clone + Debug + Send + Sync + 'static {}

impl<K> PictureId for K where K: Hash + Eq + Clone + Debug + Send + Sync + 'static {}

/// A decoded image ready for display.
///
/// Clones share the same pixel buffer, so handing a cached picture to a slot
/// never copies pixel data.
#[derive(Debug, Clone)]
pub struct Picture {
    image: Arc<DynamicImage>,
}

impl Picture {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Wraps raw RGBA8 pixel data. Returns `None` when the buffer length does
    /// not match `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, data).map(|buf| Self::new(DynamicImage::ImageRgba8(buf)))
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Approximate decoded size in bytes.
    pub fn memory_size(&self) -> usize {
        self.image.as_bytes().len()
    }

    /// True when both pictures share the same allocation.
    pub fn ptr_eq(&self, other: &Picture) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.image == *other.image
    }
}

impl From<DynamicImage> for Picture {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// Receives incremental progress from a remote full-size fetch.
///
/// Loaders only ever hold a [`Weak`] reference to the sink so a slow download
/// cannot keep a dismissed UI component alive.
pub trait ProgressSink: Send + Sync {
    /// Reports `done` bytes out of `total` (when known).
    fn set_progress(&self, done: u64, total: Option<u64>);
}

struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_progress(&self, _done: u64, _total: Option<u64>) {}
}

/// A weak progress handle that never resolves.
pub fn no_progress() -> Weak<dyn ProgressSink> {
    Weak::<NoProgress>::new()
}
