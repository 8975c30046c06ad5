//! Asynchronous, cached, two-tier picture loading.
//!
//! [`ImageDisplay`] resolves an identifier to a picture for a display slot:
//! it serves what it can from [`ImageCache`], then loads the thumbnail and the
//! full-size picture on a worker pool through a caller-supplied
//! [`ImageSource`]. Loads of the same picture and tier never run twice at
//! once, and a result whose slot has since been given another picture is
//! never shown.
//!
//! ```no_run
//! use picture_loader::{
//!     DisplaySlot, FileSource, ImageDisplay, LoaderConfig, Picture, UiQueue, no_progress,
//! };
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! struct Cell;
//! impl DisplaySlot for Cell {
//!     fn set_picture(&self, picture: Picture) {
//!         println!("showing {}x{}", picture.width(), picture.height());
//!     }
//! }
//!
//! let queue = UiQueue::new();
//! let placeholder = Picture::from_rgba8(1, 1, vec![0; 4]).unwrap();
//! let loader = ImageDisplay::<u64, PathBuf, PathBuf, Cell>::new(
//!     LoaderConfig::new(1280, 720),
//!     Arc::new(FileSource::default()),
//!     Arc::new(queue.handle()),
//!     placeholder,
//! )?;
//!
//! let cell = Arc::new(Cell);
//! loader.display(1, "thumbs/1.png".into(), "photos/1.jpg".into(), &cell, no_progress());
//! queue.run_pending();
//! # Ok::<(), picture_loader::LoaderError>(())
//! ```

pub mod config;
pub mod error;
pub mod file_utils;
pub mod image_cache;
pub mod image_loader;
pub mod image_source;
pub mod memory;
pub mod picture;
pub mod services;
pub mod state;
pub mod ui;

pub use config::LoaderConfig;
pub use error::{LoaderError, Result};
pub use image_cache::{CacheStats, ImageCache, Tier};
pub use image_source::{FileSource, ImageSource};
pub use memory::{FixedMemory, MemoryProbe, SystemMemory};
pub use picture::{Picture, PictureId, ProgressSink, no_progress};
pub use services::WorkerPool;
pub use ui::{DisplaySlot, DisplayTracker, ImageDisplay, UiDispatch, UiHandle, UiQueue};
