//! Loads every image of a directory through the picture loader and reports
//! what each display slot ended up showing.
//!
//! Usage: `picture-loader <directory>`

use log::{info, warn};
use picture_loader::{
    DisplaySlot, FileSource, ImageDisplay, ImageSource, LoaderConfig, Picture, UiQueue,
    file_utils, no_progress,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stands in for an on-screen image view.
struct LoggedSlot {
    name: String,
    shown: Mutex<Option<(u32, u32)>>,
}

impl DisplaySlot for LoggedSlot {
    fn set_picture(&self, picture: Picture) {
        info!("{}: {}x{}", self.name, picture.width(), picture.height());
        if let Ok(mut shown) = self.shown.lock() {
            *shown = Some((picture.width(), picture.height()));
        }
    }
}

fn directory_from_args() -> Option<PathBuf> {
    std::env::args_os()
        .skip(1)
        .find(|arg| !arg.to_string_lossy().starts_with('-'))
        .map(PathBuf::from)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let dir = directory_from_args().ok_or("usage: picture-loader <directory>")?;
    let files = file_utils::scan_directory(&dir)?;
    info!("Found {} images in {}", files.len(), dir.display());

    let queue = UiQueue::new();
    let placeholder =
        Picture::from_rgba8(1, 1, vec![128, 128, 128, 255]).ok_or("invalid placeholder")?;
    let source: Arc<dyn ImageSource<PathBuf, PathBuf>> = Arc::new(FileSource::default());
    let loader = ImageDisplay::<usize, PathBuf, PathBuf, LoggedSlot>::new(
        LoaderConfig::default(),
        source,
        Arc::new(queue.handle()),
        placeholder,
    )?;

    let slots: Vec<Arc<LoggedSlot>> = files
        .iter()
        .map(|path| {
            Arc::new(LoggedSlot {
                name: path.display().to_string(),
                shown: Mutex::new(None),
            })
        })
        .collect();

    for (index, (path, slot)) in files.iter().zip(&slots).enumerate() {
        loader.display(
            index,
            file_utils::thumbnail_path(path),
            path.clone(),
            slot,
            no_progress(),
        );
    }

    // This thread plays the UI thread: apply results until loads go quiet.
    while queue.run_one(Duration::from_secs(2)) {
        queue.run_pending();
    }
    loader.stop();

    for slot in &slots {
        match slot.shown.lock().ok().and_then(|shown| *shown) {
            Some((width, height)) => info!("{} -> {}x{}", slot.name, width, height),
            None => warn!("{} -> nothing shown", slot.name),
        }
    }

    let stats = loader.cache().stats();
    info!(
        "Cache: {} pictures, {} hits, {} misses",
        loader.cache().len(),
        stats.hits,
        stats.misses
    );

    Ok(())
}
