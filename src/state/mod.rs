//! State shared between the display entry point and its loader tasks.

use crate::config::LoaderConfig;
use crate::image_cache::ImageCache;
use crate::image_source::ImageSource;
use crate::memory::MemoryProbe;
use crate::picture::{Picture, PictureId};
use crate::ui::{DisplaySlot, DisplayTracker, UiDispatch};
use std::sync::{Arc, RwLock};

pub mod lock_registry;

pub use lock_registry::{KeyGuard, LockRegistry};

/// Loader-wide state container.
pub struct LoaderState<K, T, F, S: ?Sized>
where
    K: PictureId,
{
    pub config: LoaderConfig,
    /// Swapped out wholesale by `restore_cache`.
    cache: RwLock<Arc<ImageCache<K>>>,
    pub locks: LockRegistry<K>,
    pub tracker: DisplayTracker<K, S>,
    pub source: Arc<dyn ImageSource<T, F>>,
    pub ui: Arc<dyn UiDispatch>,
    pub memory: Arc<dyn MemoryProbe>,
    /// Shown while nothing better is available.
    pub default_picture: Picture,
}

impl<K, T, F, S> LoaderState<K, T, F, S>
where
    K: PictureId,
    T: Send + Sync + 'static,
    F: Send + Sync + 'static,
    S: DisplaySlot + ?Sized + 'static,
{
    pub fn new(
        config: LoaderConfig,
        source: Arc<dyn ImageSource<T, F>>,
        ui: Arc<dyn UiDispatch>,
        memory: Arc<dyn MemoryProbe>,
        default_picture: Picture,
    ) -> Self {
        let cache = Arc::new(ImageCache::with_capacities(
            config.thumbnail_cache_capacity,
            config.full_cache_capacity,
        ));
        Self {
            config,
            cache: RwLock::new(cache),
            locks: LockRegistry::new(),
            tracker: DisplayTracker::new(),
            source,
            ui,
            memory,
            default_picture,
        }
    }

    /// The cache currently in use.
    pub fn cache(&self) -> Arc<ImageCache<K>> {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Installs `cache`, returning the one it replaces.
    pub fn replace_cache(&self, cache: Arc<ImageCache<K>>) -> Arc<ImageCache<K>> {
        let mut current = self.cache.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *current, cache)
    }

    /// Applies `picture` to `slot` on the UI thread, unless the slot has been
    /// rebound or dropped by the time the job runs.
    pub fn post_display(&self, slot: &std::sync::Weak<S>, id: &K, picture: Picture) {
        let slot = slot.clone();
        let id = id.clone();
        let tracker = self.tracker.clone();
        self.ui.post(Box::new(move || {
            if tracker.is_stale(&slot, &id) {
                log::debug!("Slot reused before {:?} could be shown", id);
                return;
            }
            if let Some(slot) = slot.upgrade() {
                slot.set_picture(picture);
            }
        }));
    }
}
