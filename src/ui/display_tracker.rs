//! Display slot → identifier bindings.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

struct Binding<K, S: ?Sized> {
    slot: Weak<S>,
    id: K,
}

/// Tracks which picture each display slot is currently supposed to show.
///
/// Updated on the UI thread every time a slot is handed a new identifier and
/// read from worker threads to decide whether a finished load still matters.
/// Slots are held weakly: a dropped slot is treated as stale and its binding
/// is pruned on the next `bind`.
pub struct DisplayTracker<K, S: ?Sized> {
    bindings: Arc<RwLock<HashMap<usize, Binding<K, S>>>>,
}

impl<K, S: ?Sized> Clone for DisplayTracker<K, S> {
    fn clone(&self) -> Self {
        Self {
            bindings: self.bindings.clone(),
        }
    }
}

fn slot_address<S: ?Sized>(ptr: *const S) -> usize {
    ptr as *const () as usize
}

impl<K, S> DisplayTracker<K, S>
where
    K: PartialEq + Clone,
    S: ?Sized,
{
    pub fn new() -> Self {
        Self {
            bindings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<usize, Binding<K, S>>> {
        self.bindings.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<usize, Binding<K, S>>> {
        self.bindings.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Records that `slot` now shows `id`, replacing any earlier binding.
    pub fn bind(&self, slot: &Arc<S>, id: K) {
        let mut bindings = self.write();
        bindings.retain(|_, binding| binding.slot.strong_count() > 0);
        bindings.insert(
            slot_address(Arc::as_ptr(slot)),
            Binding {
                slot: Arc::downgrade(slot),
                id,
            },
        );
    }

    /// Returns true when a load of `id` for `slot` must not be displayed:
    /// the slot is gone, unbound, or bound to another identifier.
    pub fn is_stale(&self, slot: &Weak<S>, id: &K) -> bool {
        if slot.strong_count() == 0 {
            return true;
        }
        match self.read().get(&slot_address(slot.as_ptr())) {
            Some(binding) => !(binding.slot.ptr_eq(slot) && binding.id == *id),
            None => true,
        }
    }

    /// The identifier `slot` is currently bound to.
    pub fn current(&self, slot: &Arc<S>) -> Option<K> {
        self.read()
            .get(&slot_address(Arc::as_ptr(slot)))
            .map(|binding| binding.id.clone())
    }

    pub fn unbind(&self, slot: &Arc<S>) {
        self.write().remove(&slot_address(Arc::as_ptr(slot)));
    }

    /// Number of bindings whose slot is still alive.
    pub fn len(&self) -> usize {
        self.read()
            .values()
            .filter(|binding| binding.slot.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, S> Default for DisplayTracker<K, S>
where
    K: PartialEq + Clone,
    S: ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slot;

    #[test]
    fn bound_slot_is_fresh() {
        let tracker = DisplayTracker::new();
        let slot = Arc::new(Slot);
        tracker.bind(&slot, 1u32);
        assert!(!tracker.is_stale(&Arc::downgrade(&slot), &1));
        assert_eq!(tracker.current(&slot), Some(1));
    }

    #[test]
    fn rebinding_makes_old_id_stale() {
        let tracker = DisplayTracker::new();
        let slot = Arc::new(Slot);
        let weak = Arc::downgrade(&slot);
        tracker.bind(&slot, 1u32);
        tracker.bind(&slot, 2u32);
        assert!(tracker.is_stale(&weak, &1));
        assert!(!tracker.is_stale(&weak, &2));
    }

    #[test]
    fn unbound_slot_is_stale() {
        let tracker: DisplayTracker<u32, Slot> = DisplayTracker::new();
        let slot = Arc::new(Slot);
        assert!(tracker.is_stale(&Arc::downgrade(&slot), &1));

        tracker.bind(&slot, 1);
        tracker.unbind(&slot);
        assert!(tracker.is_stale(&Arc::downgrade(&slot), &1));
    }

    #[test]
    fn dropped_slot_is_stale_and_pruned() {
        let tracker = DisplayTracker::new();
        let slot = Arc::new(Slot);
        let weak = Arc::downgrade(&slot);
        tracker.bind(&slot, 5u32);
        drop(slot);

        assert!(tracker.is_stale(&weak, &5));
        assert_eq!(tracker.len(), 0);

        let other = Arc::new(Slot);
        tracker.bind(&other, 6);
        assert_eq!(tracker.read().len(), 1);
    }

    #[test]
    fn slots_are_tracked_independently() {
        let tracker = DisplayTracker::new();
        let a = Arc::new(Slot);
        let b = Arc::new(Slot);
        tracker.bind(&a, "x");
        tracker.bind(&b, "y");
        assert!(!tracker.is_stale(&Arc::downgrade(&a), &"x"));
        assert!(!tracker.is_stale(&Arc::downgrade(&b), &"y"));
        assert!(tracker.is_stale(&Arc::downgrade(&a), &"y"));
        assert_eq!(tracker.len(), 2);
    }
}
