//! Host memory signal used to decide when the cache must be dropped.

use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use sysinfo::System;

/// Source of the "how much memory is left" signal.
pub trait MemoryProbe: Send + Sync {
    /// Bytes the process can still allocate before the host is under pressure.
    fn available_bytes(&self) -> u64;
}

/// How long an OS reading is reused before it is taken again.
pub const MEMORY_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

const NEVER: u64 = u64::MAX;

/// Last reading of a slow probe, shared lock-free between callers.
struct Sampler {
    started: Instant,
    interval_ms: u64,
    bytes: AtomicU64,
    /// Milliseconds since `started` of the last reading, or `NEVER`.
    taken_at: AtomicU64,
}

impl Sampler {
    fn new(interval: Duration) -> Self {
        Self {
            started: Instant::now(),
            interval_ms: interval.as_millis() as u64,
            // No reading yet means no pressure.
            bytes: AtomicU64::new(u64::MAX),
            taken_at: AtomicU64::new(NEVER),
        }
    }

    /// Returns the cached reading while it is fresh. Otherwise calls `refresh`,
    /// which returns `None` when another caller is already refreshing.
    fn read(&self, refresh: impl FnOnce() -> Option<u64>) -> u64 {
        let now = self.started.elapsed().as_millis() as u64;
        let taken_at = self.taken_at.load(Ordering::Acquire);
        if taken_at != NEVER && now.saturating_sub(taken_at) < self.interval_ms {
            return self.bytes.load(Ordering::Acquire);
        }
        match refresh() {
            Some(bytes) => {
                self.bytes.store(bytes, Ordering::Release);
                self.taken_at.store(now, Ordering::Release);
                bytes
            }
            None => self.bytes.load(Ordering::Acquire),
        }
    }
}

static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| Mutex::new(System::new()));
static SAMPLER: Lazy<Sampler> = Lazy::new(|| Sampler::new(MEMORY_REFRESH_INTERVAL));

/// Reads available memory from the operating system.
///
/// The OS is asked at most once per [`MEMORY_REFRESH_INTERVAL`]; in between,
/// and while another thread is refreshing, callers get the last reading
/// without blocking.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn available_bytes(&self) -> u64 {
        SAMPLER.read(|| {
            // Busy or poisoned: keep the previous reading.
            let mut sys = SYSTEM.try_lock().ok()?;
            sys.refresh_memory();
            Some(sys.available_memory())
        })
    }
}

/// A probe reporting a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn available_bytes(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fixed_probe_reports_value() {
        assert_eq!(FixedMemory(1234).available_bytes(), 1234);
    }

    #[test]
    fn fresh_reading_is_reused() {
        let sampler = Sampler::new(Duration::from_secs(3600));
        let refreshes = Cell::new(0);
        let refresh = |bytes: u64| {
            refreshes.set(refreshes.get() + 1);
            Some(bytes)
        };

        assert_eq!(sampler.read(|| refresh(100)), 100);
        assert_eq!(sampler.read(|| refresh(5)), 100);
        assert_eq!(refreshes.get(), 1);
    }

    #[test]
    fn stale_reading_is_refreshed() {
        let sampler = Sampler::new(Duration::ZERO);
        assert_eq!(sampler.read(|| Some(100)), 100);
        assert_eq!(sampler.read(|| Some(5)), 5);
    }

    #[test]
    fn busy_refresh_keeps_last_reading() {
        let sampler = Sampler::new(Duration::ZERO);
        assert_eq!(sampler.read(|| None), u64::MAX);
        sampler.read(|| Some(42));
        assert_eq!(sampler.read(|| None), 42);
    }

    #[test]
    fn system_memory_is_callable_from_many_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| SystemMemory.available_bytes()))
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
