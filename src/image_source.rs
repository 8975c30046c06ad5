//! Caller-supplied ways of obtaining pictures.

use crate::config::{DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_SIZE};
use crate::error::Result;
use crate::image_loader;
use crate::picture::{Picture, ProgressSink};
use std::path::PathBuf;
use std::sync::Weak;

/// The fetch and derive operations the loader drives for each request.
///
/// `T` is whatever the source needs to locate a thumbnail, `F` the same for
/// the full-size picture. Every method is optional: the default returns
/// `Ok(None)`, which simply moves the loader on to the next step of the chain.
/// An `Err` is logged and treated the same way.
///
/// Methods are called from worker threads and may block for as long as the
/// fetch takes.
pub trait ImageSource<T, F>: Send + Sync {
    /// Thumbnail from local storage. Tried first.
    fn thumbnail_local(&self, _thumbnail: &T) -> Result<Option<Picture>> {
        Ok(None)
    }

    /// Thumbnail from a remote store, tried when the local lookup misses.
    fn thumbnail_remote(&self, _thumbnail: &T) -> Result<Option<Picture>> {
        Ok(None)
    }

    /// Builds the thumbnail out of the full-size picture. Last resort for the
    /// thumbnail tier.
    fn thumbnail_from_full(&self, _thumbnail: &T, _full: &F) -> Result<Option<Picture>> {
        Ok(None)
    }

    /// Full-size picture from local storage, no larger than needed for
    /// `max_width` x `max_height`.
    fn full_local(&self, _full: &F, _max_width: u32, _max_height: u32) -> Result<Option<Picture>> {
        Ok(None)
    }

    /// Full-size picture from a remote store. `progress` may already be gone.
    fn full_remote(
        &self,
        _full: &F,
        _max_width: u32,
        _max_height: u32,
        _progress: &Weak<dyn ProgressSink>,
    ) -> Result<Option<Picture>> {
        Ok(None)
    }
}

/// Source backed by image files: `T` is the thumbnail path, `F` the path of
/// the full image. Missing thumbnails are generated from the full image and
/// written to the thumbnail path.
#[derive(Debug, Clone)]
pub struct FileSource {
    thumbnail_size: u32,
    quality: u8,
    force_base2: bool,
}

impl FileSource {
    pub fn new(thumbnail_size: u32) -> Self {
        Self {
            thumbnail_size,
            quality: DEFAULT_THUMBNAIL_QUALITY,
            force_base2: false,
        }
    }

    /// JPEG quality of generated thumbnail files.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Shrink full images by powers of two only when deriving thumbnails.
    pub fn with_force_base2(mut self, force_base2: bool) -> Self {
        self.force_base2 = force_base2;
        self
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_SIZE)
    }
}

impl ImageSource<PathBuf, PathBuf> for FileSource {
    fn thumbnail_local(&self, thumbnail: &PathBuf) -> Result<Option<Picture>> {
        if !thumbnail.is_file() {
            return Ok(None);
        }
        image_loader::load_thumbnail(thumbnail).map(Some)
    }

    fn thumbnail_from_full(&self, thumbnail: &PathBuf, full: &PathBuf) -> Result<Option<Picture>> {
        if !full.is_file() {
            return Ok(None);
        }
        image_loader::create_thumbnail_from_full(
            full,
            thumbnail,
            self.thumbnail_size,
            self.force_base2,
            self.quality,
        )
        .map(Some)
    }

    fn full_local(
        &self,
        full: &PathBuf,
        max_width: u32,
        max_height: u32,
    ) -> Result<Option<Picture>> {
        if !full.is_file() {
            return Ok(None);
        }
        image_loader::load_full(full, max_width, max_height).map(Some)
    }
}
