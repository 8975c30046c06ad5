//! Per-identifier load locks.
//!
//! One table per tier. Holding the guard for `(tier, id)` means no other
//! task loads that tier of that picture at the same time; other ids and the
//! other tier of the same id are unaffected. Entries are counted and removed
//! once nobody holds or waits for them, so the table only ever contains
//! identifiers with work in flight.

use crate::image_cache::Tier;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Hand-off point for one identifier. Only waiters for that identifier
/// sleep on `released`.
#[derive(Default)]
struct Gate {
    held: Mutex<bool>,
    released: Condvar,
}

impl Gate {
    fn enter(&self) {
        let mut held = lock(&self.held);
        while *held {
            held = self.released.wait(held).unwrap_or_else(|e| e.into_inner());
        }
        *held = true;
    }

    fn leave(&self) {
        *lock(&self.held) = false;
        self.released.notify_one();
    }
}

struct Entry {
    gate: Arc<Gate>,
    /// Holder plus waiters.
    users: usize,
}

type TierLocks<K> = Mutex<HashMap<K, Entry>>;

/// Lazily created, reference-counted locks keyed by `(tier, id)`.
pub struct LockRegistry<K> {
    thumbnails: TierLocks<K>,
    full: TierLocks<K>,
}

impl<K> LockRegistry<K>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            thumbnails: Mutex::new(HashMap::new()),
            full: Mutex::new(HashMap::new()),
        }
    }

    fn tier(&self, tier: Tier) -> &TierLocks<K> {
        match tier {
            Tier::Thumbnail => &self.thumbnails,
            Tier::Full => &self.full,
        }
    }

    /// Blocks until `(tier, id)` is free, then holds it until the guard drops.
    pub fn acquire(&self, tier: Tier, id: K) -> KeyGuard<'_, K> {
        let entries = self.tier(tier);
        let gate = {
            let mut entries = lock(entries);
            let entry = entries.entry(id.clone()).or_insert_with(|| Entry {
                gate: Arc::default(),
                users: 0,
            });
            entry.users += 1;
            entry.gate.clone()
        };

        // The table lock is not held while waiting, so other ids proceed.
        gate.enter();

        KeyGuard {
            entries,
            gate,
            id: Some(id),
        }
    }

    /// Number of identifiers currently held or waited on for `tier`.
    pub fn len(&self, tier: Tier) -> usize {
        lock(self.tier(tier)).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len(Tier::Thumbnail) == 0 && self.len(Tier::Full) == 0
    }
}

impl<K> Default for LockRegistry<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on one `(tier, id)` pair. Released on drop.
pub struct KeyGuard<'a, K: Hash + Eq> {
    entries: &'a TierLocks<K>,
    gate: Arc<Gate>,
    id: Option<K>,
}

impl<K: Hash + Eq> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        self.gate.leave();

        let mut entries = lock(self.entries);
        if let Some(entry) = entries.get_mut(&id) {
            entry.users -= 1;
            if entry.users == 0 {
                entries.remove(&id);
            }
        }
    }
}
