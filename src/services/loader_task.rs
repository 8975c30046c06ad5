//! One display request worth of loading: thumbnail first, then full size.

use crate::error::Result;
use crate::image_cache::Tier;
use crate::picture::{Picture, PictureId, ProgressSink};
use crate::state::LoaderState;
use crate::ui::DisplaySlot;
use log::{debug, warn};
use std::fmt::Debug;
use std::sync::{Arc, Weak};

/// Everything needed to load and show one picture in one slot.
///
/// Built fresh for every display call and never reused.
pub struct LoadRequest<K, T, F, S: ?Sized> {
    pub id: K,
    pub thumbnail: T,
    pub full: F,
    pub slot: Weak<S>,
    pub progress: Weak<dyn ProgressSink>,
}

/// Keeps a successful fetch, logs and discards a failed one.
fn attempt<K: Debug>(id: &K, step: &str, result: Result<Option<Picture>>) -> Option<Picture> {
    match result {
        Ok(Some(picture)) => {
            debug!("{} produced {:?}", step, id);
            Some(picture)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("{} failed for {:?}: {}", step, id, e);
            None
        }
    }
}

/// Runs the fallback chain for a single request on a worker thread.
pub struct LoaderTask<K, T, F, S: ?Sized>
where
    K: PictureId,
{
    state: Arc<LoaderState<K, T, F, S>>,
    request: LoadRequest<K, T, F, S>,
    load_thumbnail: bool,
}

impl<K, T, F, S> LoaderTask<K, T, F, S>
where
    K: PictureId,
    T: Send + Sync + 'static,
    F: Send + Sync + 'static,
    S: DisplaySlot + ?Sized + 'static,
{
    /// `load_thumbnail` is false when the thumbnail is already on screen and
    /// only the full-size picture is still missing.
    pub fn new(
        state: Arc<LoaderState<K, T, F, S>>,
        request: LoadRequest<K, T, F, S>,
        load_thumbnail: bool,
    ) -> Self {
        Self {
            state,
            request,
            load_thumbnail,
        }
    }

    fn is_stale(&self) -> bool {
        self.state
            .tracker
            .is_stale(&self.request.slot, &self.request.id)
    }

    pub fn run(self) {
        let id = &self.request.id;
        if self.is_stale() {
            debug!("Skipping load of {:?}, slot already reused", id);
            return;
        }

        let mut thumbnail = None;
        if self.load_thumbnail {
            thumbnail = self.load_tier(Tier::Thumbnail);
            if self.is_stale() {
                return;
            }
            if let Some(picture) = &thumbnail {
                self.state
                    .post_display(&self.request.slot, id, picture.clone());
            }
        }

        let mut full = None;
        if self.state.config.show_full_image {
            self.state.cache().evict_if_under_pressure(
                self.state.memory.as_ref(),
                self.state.config.required_free_bytes,
            );
            full = self.load_tier(Tier::Full);
            if self.is_stale() {
                return;
            }
            if let Some(picture) = &full {
                self.state
                    .post_display(&self.request.slot, id, picture.clone());
            }
        }

        if self.load_thumbnail && thumbnail.is_none() && full.is_none() {
            debug!("No picture available for {:?}, showing default", id);
            self.state.post_display(
                &self.request.slot,
                id,
                self.state.default_picture.clone(),
            );
        }
    }

    /// Holds the `(tier, id)` lock while checking the cache and, on a miss,
    /// walking the sources for that tier.
    fn load_tier(&self, tier: Tier) -> Option<Picture> {
        let request = &self.request;
        let _guard = self.state.locks.acquire(tier, request.id.clone());

        // Another task may have filled the cache while we waited.
        let cache = self.state.cache();
        if let Some(picture) = cache.get(tier, &request.id) {
            return Some(picture);
        }

        let source = &self.state.source;
        let picture = match tier {
            Tier::Thumbnail => attempt(
                &request.id,
                "local thumbnail",
                source.thumbnail_local(&request.thumbnail),
            )
            .or_else(|| {
                attempt(
                    &request.id,
                    "remote thumbnail",
                    source.thumbnail_remote(&request.thumbnail),
                )
            })
            .or_else(|| {
                attempt(
                    &request.id,
                    "thumbnail from full",
                    source.thumbnail_from_full(&request.thumbnail, &request.full),
                )
            }),
            Tier::Full => {
                let (width, height) = (
                    self.state.config.desired_width,
                    self.state.config.desired_height,
                );
                attempt(
                    &request.id,
                    "local full image",
                    source.full_local(&request.full, width, height),
                )
                .or_else(|| {
                    attempt(
                        &request.id,
                        "remote full image",
                        source.full_remote(&request.full, width, height, &request.progress),
                    )
                })
            }
        }?;

        cache.put(tier, request.id.clone(), picture.clone());
        Some(picture)
    }
}
