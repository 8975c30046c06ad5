//! Unified error types for the picture loader.

use std::fmt;

/// Loader-specific errors.
///
/// None of these ever reach the caller of `display`; they surface from the
/// decode helpers and from capability implementations, and the loader logs
/// them and moves on to the next source.
#[derive(Debug)]
pub enum LoaderError {
    /// Error decoding or encoding image data
    Decode(String),
    /// Error reading or writing a file
    Io(String),
    /// A capability implementation failed to produce an image
    Source(String),
    /// The worker pool could not be built
    PoolBuild(String),
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Decode(msg) => write!(f, "image decode error: {}", msg),
            LoaderError::Io(msg) => write!(f, "I/O error: {}", msg),
            LoaderError::Source(msg) => write!(f, "image source error: {}", msg),
            LoaderError::PoolBuild(msg) => write!(f, "worker pool error: {}", msg),
        }
    }
}

impl std::error::Error for LoaderError {}

impl From<image::ImageError> for LoaderError {
    fn from(err: image::ImageError) -> Self {
        LoaderError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for LoaderError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        LoaderError::PoolBuild(err.to_string())
    }
}

/// Type alias for Results in this crate.
pub type Result<T> = std::result::Result<T, LoaderError>;
