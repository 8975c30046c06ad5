//! Two-tier image cache shared by the loader and its worker threads.
//!
//! Thumbnails and full-size pictures are kept in separate LRU maps bounded by
//! entry count. On top of that, the whole cache is dropped when the host runs
//! low on memory: eviction is all or nothing, so callers must expect a miss
//! even for a picture they displayed a moment ago.

use crate::memory::MemoryProbe;
use crate::picture::Picture;
use log::{debug, info};
use lru::LruCache;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Which of the two cached representations of a picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Thumbnail,
    Full,
}

/// Counters describing cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of times the whole cache was dropped.
    pub clears: u64,
}

struct Tiers<K: Hash + Eq> {
    thumbnails: LruCache<K, Picture>,
    full: LruCache<K, Picture>,
    stats: CacheStats,
}

impl<K: Hash + Eq> Tiers<K> {
    fn tier_mut(&mut self, tier: Tier) -> &mut LruCache<K, Picture> {
        match tier {
            Tier::Thumbnail => &mut self.thumbnails,
            Tier::Full => &mut self.full,
        }
    }
}

/// Thread-safe picture cache keyed by identifier.
///
/// Each call takes the internal lock only for the map operation itself; no
/// lock is ever held while a picture is being fetched.
pub struct ImageCache<K: Hash + Eq> {
    inner: Mutex<Tiers<K>>,
}

impl<K> ImageCache<K>
where
    K: Hash + Eq + Clone + Debug,
{
    /// Creates a cache holding at most `capacity` entries per tier.
    pub fn new(capacity: usize) -> Self {
        Self::with_capacities(capacity, capacity)
    }

    /// Creates a cache with separate entry bounds for each tier.
    pub fn with_capacities(thumbnails: usize, full: usize) -> Self {
        let bound = |capacity: usize| NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Tiers {
                thumbnails: LruCache::new(bound(thumbnails)),
                full: LruCache::new(bound(full)),
                stats: CacheStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tiers<K>> {
        // The guarded maps are always left consistent, so a poisoned lock is
        // still safe to use.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Retrieves a picture of the given tier.
    pub fn get(&self, tier: Tier, id: &K) -> Option<Picture> {
        let mut tiers = self.lock();
        let result = tiers.tier_mut(tier).get(id).cloned();
        if result.is_some() {
            tiers.stats.hits += 1;
            debug!("Cache HIT: {:?} {:?}", tier, id);
        } else {
            tiers.stats.misses += 1;
            debug!("Cache MISS: {:?} {:?}", tier, id);
        }
        result
    }

    /// Stores a picture of the given tier, replacing any previous one.
    pub fn put(&self, tier: Tier, id: K, picture: Picture) {
        debug!(
            "Cache PUT: {:?} {:?} ({}x{})",
            tier,
            id,
            picture.width(),
            picture.height()
        );
        self.lock().tier_mut(tier).put(id, picture);
    }

    pub fn thumbnail(&self, id: &K) -> Option<Picture> {
        self.get(Tier::Thumbnail, id)
    }

    pub fn full(&self, id: &K) -> Option<Picture> {
        self.get(Tier::Full, id)
    }

    pub fn put_thumbnail(&self, id: K, picture: Picture) {
        self.put(Tier::Thumbnail, id, picture);
    }

    pub fn put_full(&self, id: K, picture: Picture) {
        self.put(Tier::Full, id, picture);
    }

    /// Checks for an entry without touching its LRU position.
    pub fn contains(&self, tier: Tier, id: &K) -> bool {
        self.lock().tier_mut(tier).contains(id)
    }

    /// Drops every entry of both tiers.
    pub fn clear(&self) {
        let mut tiers = self.lock();
        tiers.thumbnails.clear();
        tiers.full.clear();
        tiers.stats.clears += 1;
    }

    /// Drops the whole cache when `probe` reports less than `required_bytes`
    /// of free memory. Returns whether the cache was cleared.
    pub fn evict_if_under_pressure(&self, probe: &dyn MemoryProbe, required_bytes: u64) -> bool {
        let available = probe.available_bytes();
        if available < required_bytes {
            info!(
                "Memory low ({} bytes free, {} required), clearing image cache",
                available, required_bytes
            );
            self.clear();
            true
        } else {
            false
        }
    }

    /// Total number of cached pictures across both tiers.
    pub fn len(&self) -> usize {
        let tiers = self.lock();
        tiers.thumbnails.len() + tiers.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}
