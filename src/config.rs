//! Loader configuration constants and tunables.

/// Supported image file extensions for scanning directories.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Number of worker threads in the loader pool.
pub const MAX_THREADS: usize = 15;

/// Free memory (bytes) below which the whole cache is dropped.
pub const REQUIRED_FREE_BYTES: u64 = 4_000_000;

/// Entry capacity of the thumbnail tier.
pub const DEFAULT_THUMBNAIL_CACHE_CAPACITY: usize = 256;

/// Entry capacity of the full-size tier. At the default 1920x1080 bound this
/// caps decoded full images at roughly 130 MB.
pub const DEFAULT_FULL_CACHE_CAPACITY: usize = 16;

/// Longest side (pixels) of derived thumbnails.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 256;

/// JPEG quality of generated thumbnail files.
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 90;

/// Tunables for an [`ImageDisplay`](crate::ImageDisplay) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Number of worker threads.
    pub max_threads: usize,
    /// Free-memory threshold checked before every full-size load.
    pub required_free_bytes: u64,
    /// Maximum number of thumbnails kept.
    pub thumbnail_cache_capacity: usize,
    /// Maximum number of full-size pictures kept.
    pub full_cache_capacity: usize,
    /// Upper bound on the width of decoded full-size images.
    pub desired_width: u32,
    /// Upper bound on the height of decoded full-size images.
    pub desired_height: u32,
    /// Load the full-size tier after the thumbnail, or stop at the thumbnail.
    pub show_full_image: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_threads: MAX_THREADS,
            required_free_bytes: REQUIRED_FREE_BYTES,
            thumbnail_cache_capacity: DEFAULT_THUMBNAIL_CACHE_CAPACITY,
            full_cache_capacity: DEFAULT_FULL_CACHE_CAPACITY,
            desired_width: 1920,
            desired_height: 1080,
            show_full_image: true,
        }
    }
}

impl LoaderConfig {
    /// Creates a configuration bounding full images to `desired_width` x `desired_height`.
    pub fn new(desired_width: u32, desired_height: u32) -> Self {
        Self {
            desired_width,
            desired_height,
            ..Self::default()
        }
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads.max(1);
        self
    }

    pub fn with_required_free_bytes(mut self, bytes: u64) -> Self {
        self.required_free_bytes = bytes;
        self
    }

    pub fn with_thumbnail_cache_capacity(mut self, capacity: usize) -> Self {
        self.thumbnail_cache_capacity = capacity.max(1);
        self
    }

    pub fn with_full_cache_capacity(mut self, capacity: usize) -> Self {
        self.full_cache_capacity = capacity.max(1);
        self
    }

    pub fn with_show_full_image(mut self, show_full_image: bool) -> Self {
        self.show_full_image = show_full_image;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_constants() {
        let config = LoaderConfig::default();
        assert_eq!(config.max_threads, 15);
        assert_eq!(config.required_free_bytes, 4_000_000);
        assert!(config.show_full_image);
        assert!(config.full_cache_capacity < config.thumbnail_cache_capacity);
    }

    #[test]
    fn default_full_tier_fits_in_memory() {
        let config = LoaderConfig::default();
        let full_bytes = config.desired_width as u64 * config.desired_height as u64 * 4;
        assert!(full_bytes * config.full_cache_capacity as u64 <= 256 * 1024 * 1024);
    }

    #[test]
    fn builders_clamp_zero() {
        let config = LoaderConfig::new(640, 480)
            .with_max_threads(0)
            .with_thumbnail_cache_capacity(0)
            .with_full_cache_capacity(0)
            .with_show_full_image(false);
        assert_eq!(config.desired_width, 640);
        assert_eq!(config.desired_height, 480);
        assert_eq!(config.max_threads, 1);
        assert_eq!(config.thumbnail_cache_capacity, 1);
        assert_eq!(config.full_cache_capacity, 1);
        assert!(!config.show_full_image);
    }
}
