//! Hand-off from worker threads to the UI thread.

use log::debug;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// A unit of work that must run on the UI thread.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Posts work to the UI thread without waiting for it to run.
///
/// Implement this over a host event loop (e.g. `invoke_from_event_loop`) or
/// use [`UiQueue`], which lets the owning thread drain jobs itself.
pub trait UiDispatch: Send + Sync {
    /// Queues `job`. Returns false if the UI side is gone.
    fn post(&self, job: UiJob) -> bool;
}

/// Producer side of a [`UiQueue`].
#[derive(Clone)]
pub struct UiHandle {
    sender: Sender<UiJob>,
}

impl UiDispatch for UiHandle {
    fn post(&self, job: UiJob) -> bool {
        let sent = self.sender.send(job).is_ok();
        if !sent {
            debug!("UI queue closed, dropping job");
        }
        sent
    }
}

/// A job queue consumed by a single thread acting as the UI thread.
pub struct UiQueue {
    sender: Sender<UiJob>,
    receiver: Receiver<UiJob>,
}

impl UiQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn handle(&self) -> UiHandle {
        UiHandle {
            sender: self.sender.clone(),
        }
    }

    /// Runs every job already queued and returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one job and runs it.
    pub fn run_one(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(_) => false,
        }
    }

    /// Runs jobs until `done` returns true or `timeout` elapses.
    /// Returns the final value of `done`.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.run_one((deadline - now).min(Duration::from_millis(10)));
        }
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn jobs_run_on_draining_thread() {
        let queue = UiQueue::new();
        let handle = queue.handle();
        let ui_thread = thread::current().id();
        let ran_on = Arc::new(std::sync::Mutex::new(None));

        let ran_on_clone = ran_on.clone();
        thread::spawn(move || {
            handle.post(Box::new(move || {
                *ran_on_clone.lock().unwrap() = Some(thread::current().id());
            }));
        })
        .join()
        .unwrap();

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*ran_on.lock().unwrap(), Some(ui_thread));
    }

    #[test]
    fn run_until_stops_when_done() {
        let queue = UiQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = counter.clone();
            queue.handle().post(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert!(queue.run_until(Duration::from_secs(1), || counter.load(Ordering::SeqCst) == 3));
        assert!(!queue.run_until(Duration::from_millis(20), || false));
    }

    #[test]
    fn post_after_drop_fails() {
        let queue = UiQueue::new();
        let handle = queue.handle();
        drop(queue);
        assert!(!handle.post(Box::new(|| {})));
    }
}
