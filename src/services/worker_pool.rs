//! Bounded pool of worker threads running loader tasks.
//!
//! The pool follows the host UI lifecycle: `stop` when the screen is paused,
//! `restart` when it resumes. Stopping never cancels anything; tasks that are
//! already running or queued still run to completion.

use crate::error::Result;
use log::{debug, error, info};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::sync::{Mutex, MutexGuard};

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

fn build_pool(num_threads: usize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|index| format!("picture-loader-{}", index))
        // Without a handler rayon aborts the process on a panicking task.
        .panic_handler(|payload| {
            error!("Loader task panicked: {}", panic_message(payload.as_ref()));
        })
        .build()?;
    Ok(pool)
}

/// Fixed-size worker pool that can be stopped and restarted.
pub struct WorkerPool {
    pool: Mutex<Option<ThreadPool>>,
    num_threads: usize,
}

impl WorkerPool {
    /// Creates and starts a pool of `num_threads` workers.
    pub fn new(num_threads: usize) -> Result<Self> {
        let num_threads = num_threads.max(1);
        Ok(Self {
            pool: Mutex::new(Some(build_pool(num_threads)?)),
            num_threads,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<ThreadPool>> {
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Queues `task`. Returns false, dropping the task, when the pool is stopped.
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.lock().as_ref() {
            Some(pool) => {
                pool.spawn(task);
                true
            }
            None => {
                debug!("Worker pool stopped, task dropped");
                false
            }
        }
    }

    /// Refuses further submissions. Queued and running tasks still finish:
    /// rayon keeps the threads alive until every spawned job has run.
    pub fn stop(&self) {
        if self.lock().take().is_some() {
            info!("Worker pool stopped");
        }
    }

    /// Starts a fresh pool if stopped; no-op while active.
    pub fn restart(&self) -> Result<()> {
        let mut pool = self.lock();
        if pool.is_none() {
            *pool = Some(build_pool(self.num_threads)?);
            info!("Worker pool restarted with {} threads", self.num_threads);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier, mpsc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn runs_submitted_tasks() {
        let pool = WorkerPool::new(2).unwrap();
        let (tx, rx) = mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            assert!(pool.submit(move || tx.send(i).unwrap()));
        }
        let mut got: Vec<i32> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        got.sort();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn runs_tasks_in_parallel() {
        let pool = WorkerPool::new(3).unwrap();
        let barrier = Arc::new(Barrier::new(3));
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            let barrier = barrier.clone();
            let tx = tx.clone();
            pool.submit(move || {
                barrier.wait();
                tx.send(()).unwrap();
            });
        }
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }
    }

    #[test]
    fn stop_rejects_new_tasks_but_finishes_queued() {
        let pool = WorkerPool::new(1).unwrap();
        let done = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        for _ in 0..3 {
            let done = done.clone();
            let tx = tx.clone();
            pool.submit(move || {
                thread::sleep(Duration::from_millis(20));
                done.fetch_add(1, Ordering::SeqCst);
                tx.send(()).unwrap();
            });
        }
        pool.stop();
        assert!(!pool.is_active());
        assert!(!pool.submit(|| {}));

        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn restart_is_noop_when_active() {
        let pool = WorkerPool::new(1).unwrap();
        pool.restart().unwrap();
        assert!(pool.is_active());

        pool.stop();
        pool.restart().unwrap();
        assert!(pool.is_active());

        let (tx, rx) = mpsc::channel();
        assert!(pool.submit(move || tx.send(()).unwrap()));
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }

    #[test]
    fn panicking_task_does_not_kill_pool() {
        let pool = WorkerPool::new(1).unwrap();
        pool.submit(|| panic!("boom"));

        let (tx, rx) = mpsc::channel();
        pool.submit(move || tx.send(()).unwrap());
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }

    #[test]
    fn panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new("oops");
        assert_eq!(panic_message(payload.as_ref()), "oops");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bad"));
        assert_eq!(panic_message(payload.as_ref()), "bad");
    }
}
