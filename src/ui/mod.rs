//! UI-facing side of the loader: slots, bindings and the display entry point.
//!
//! Threading model:
//! - `ImageDisplay::display` runs on the UI thread and never blocks on a load
//! - loader tasks run on the rayon worker pool (`services::worker_pool`)
//! - finished pictures come back through a `UiDispatch` and are applied on the UI thread

pub mod dispatch;
pub mod display_tracker;
pub mod image_display;

use crate::picture::Picture;

pub use dispatch::{UiDispatch, UiHandle, UiJob, UiQueue};
pub use display_tracker::DisplayTracker;
pub use image_display::ImageDisplay;

/// Something on screen that shows one picture at a time, such as a grid cell
/// or an image view.
///
/// Only ever called on the UI thread, but shared with worker threads through
/// weak references, hence `Send + Sync`.
pub trait DisplaySlot: Send + Sync {
    fn set_picture(&self, picture: Picture);
}
