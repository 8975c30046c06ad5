//! Display entry point.
//!
//! `display` is called on the UI thread. It answers from the cache when it
//! can, shows the default picture otherwise, and queues a `LoaderTask` on the
//! worker pool for whatever tier is still missing. Results come back through
//! the `UiDispatch` and are dropped if the slot was given another picture in
//! the meantime.

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::image_cache::ImageCache;
use crate::image_source::ImageSource;
use crate::memory::{MemoryProbe, SystemMemory};
use crate::picture::{Picture, PictureId, ProgressSink};
use crate::services::{LoadRequest, LoaderTask, WorkerPool};
use crate::state::LoaderState;
use crate::ui::{DisplaySlot, DisplayTracker, UiDispatch};
use log::{debug, info};
use std::sync::{Arc, Weak};

/// Asynchronous, cached, two-tier picture loader.
///
/// `K` identifies a picture, `T` and `F` are what the [`ImageSource`] needs to
/// fetch its thumbnail and full-size versions, `S` is the slot type pictures
/// are shown in.
pub struct ImageDisplay<K, T, F, S: ?Sized>
where
    K: PictureId,
{
    state: Arc<LoaderState<K, T, F, S>>,
    pool: WorkerPool,
}

impl<K, T, F, S> ImageDisplay<K, T, F, S>
where
    K: PictureId,
    T: Send + Sync + 'static,
    F: Send + Sync + 'static,
    S: DisplaySlot + ?Sized + 'static,
{
    /// Creates a loader that watches the operating system's free memory.
    pub fn new(
        config: LoaderConfig,
        source: Arc<dyn ImageSource<T, F>>,
        ui: Arc<dyn UiDispatch>,
        default_picture: Picture,
    ) -> Result<Self> {
        Self::with_memory_probe(config, source, ui, Arc::new(SystemMemory), default_picture)
    }

    pub fn with_memory_probe(
        config: LoaderConfig,
        source: Arc<dyn ImageSource<T, F>>,
        ui: Arc<dyn UiDispatch>,
        memory: Arc<dyn MemoryProbe>,
        default_picture: Picture,
    ) -> Result<Self> {
        let pool = WorkerPool::new(config.max_threads)?;
        info!(
            "Image loader started ({} threads, full images {})",
            pool.num_threads(),
            if config.show_full_image { "on" } else { "off" }
        );
        Ok(Self {
            state: Arc::new(LoaderState::new(
                config,
                source,
                ui,
                memory,
                default_picture,
            )),
            pool,
        })
    }

    /// Shows picture `id` in `slot`.
    ///
    /// Must be called on the UI thread. Whatever is cached is applied to the
    /// slot immediately (the default picture if nothing is); missing tiers are
    /// loaded in the background. Calling again for the same slot supersedes
    /// any load still in flight for it.
    pub fn display(
        &self,
        id: K,
        thumbnail: T,
        full: F,
        slot: &Arc<S>,
        progress: Weak<dyn ProgressSink>,
    ) {
        let state = &self.state;
        state.tracker.bind(slot, id.clone());

        let cache = state.cache();
        let show_full = state.config.show_full_image;

        if show_full {
            if let Some(picture) = cache.full(&id) {
                slot.set_picture(picture);
                return;
            }
        }

        let load_thumbnail = match cache.thumbnail(&id) {
            Some(picture) => {
                slot.set_picture(picture);
                if !show_full {
                    return;
                }
                false
            }
            None => {
                slot.set_picture(state.default_picture.clone());
                true
            }
        };

        debug!(
            "Queueing load of {:?} (thumbnail: {}, full: {})",
            id, load_thumbnail, show_full
        );
        let task = LoaderTask::new(
            state.clone(),
            LoadRequest {
                id,
                thumbnail,
                full,
                slot: Arc::downgrade(slot),
                progress,
            },
            load_thumbnail,
        );
        self.pool.submit(move || task.run());
    }

    /// Stops accepting loads, typically when the host screen pauses.
    /// Loads already queued still complete.
    pub fn stop(&self) {
        self.pool.stop();
    }

    /// Resumes after [`stop`](Self::stop). No-op if running.
    pub fn restart(&self) -> Result<()> {
        self.pool.restart()
    }

    pub fn is_running(&self) -> bool {
        self.pool.is_active()
    }

    pub fn clear_cache(&self) {
        self.state.cache().clear();
    }

    /// Clears the cache if free memory is below the configured threshold.
    pub fn clear_cache_if_needed(&self) -> bool {
        self.state.cache().evict_if_under_pressure(
            self.state.memory.as_ref(),
            self.state.config.required_free_bytes,
        )
    }

    /// The cache in use, for handing over to a replacement loader (e.g. when
    /// the owning screen is recreated) via [`restore_cache`](Self::restore_cache).
    pub fn cache(&self) -> Arc<ImageCache<K>> {
        self.state.cache()
    }

    /// Adopts a cache taken from another loader, clearing the current one.
    pub fn restore_cache(&self, cache: Arc<ImageCache<K>>) {
        let previous = self.state.replace_cache(cache.clone());
        if !Arc::ptr_eq(&previous, &cache) {
            previous.clear();
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.state.config
    }

    pub fn tracker(&self) -> &DisplayTracker<K, S> {
        &self.state.tracker
    }
}
