//! Worker pool for background evaluation
//!
//! Uses Rayon for the worker threads. Consumers that block on a result while
//! running on one of the pool's own threads keep executing queued jobs instead
//! of parking, so a small pool cannot deadlock on nested work.

use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long a pool thread sleeps on an empty channel when no other job is queued
const IDLE_WAIT: Duration = Duration::from_millis(1);

lazy_static::lazy_static! {
    static ref SHARED_POOL: WorkerPool = WorkerPool::new(num_cpus::get())
        .expect("failed to build the shared worker pool");
}

/// Cloneable handle to a Rayon thread pool
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Builds a pool with `threads` workers (at least one)
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("itrex-worker-{}", i))
            .build()
            .map_err(|e| Error::WorkerPool(format!("Failed to create thread pool: {}", e)))?;

        debug!(threads, "worker pool created");
        Ok(WorkerPool {
            pool: Arc::new(pool),
        })
    }

    /// Process-wide pool sized to the number of CPUs
    pub fn shared() -> Self {
        SHARED_POOL.clone()
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// True when called from one of this pool's worker threads
    pub fn is_worker(&self) -> bool {
        self.pool.current_thread_index().is_some()
    }

    /// Queues a job on the pool
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job);
    }

    /// Blocks until `receiver` yields a message, returning `None` once it is
    /// disconnected and empty
    ///
    /// On a worker thread of this pool the wait keeps running other queued
    /// jobs, since the message may come from a job queued behind the caller.
    pub fn receive<T>(&self, receiver: &Receiver<T>) -> Option<T> {
        if !self.is_worker() {
            return receiver.recv().ok();
        }

        loop {
            match receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Disconnected) => return None,
                Err(TryRecvError::Empty) => {}
            }

            if let Some(rayon::Yield::Executed) = self.pool.yield_now() {
                continue;
            }

            match receiver.recv_timeout(IDLE_WAIT) {
                Ok(message) => return Some(message),
                Err(RecvTimeoutError::Disconnected) => return None,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    /// True if both handles drive the same threads
    pub fn ptr_eq(&self, other: &WorkerPool) -> bool {
        Arc::ptr_eq(&self.pool, &other.pool)
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .finish()
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_spawn_and_receive() {
        let pool = WorkerPool::new(2).unwrap();
        let (tx, rx) = bounded(1);
        pool.spawn(move || {
            tx.send(21 * 2).unwrap();
        });
        assert_eq!(pool.receive(&rx), Some(42));
    }

    #[test]
    fn test_receive_disconnected() {
        let pool = WorkerPool::new(1).unwrap();
        let (tx, rx) = bounded::<i32>(1);
        drop(tx);
        assert_eq!(pool.receive(&rx), None);
    }

    #[test]
    fn test_nested_wait_on_single_thread_pool() {
        // The outer job waits for an inner job queued on the same single thread
        let pool = WorkerPool::new(1).unwrap();
        let (outer_tx, outer_rx) = bounded(1);
        let inner_pool = pool.clone();
        pool.spawn(move || {
            let (tx, rx) = bounded(1);
            inner_pool.spawn(move || {
                tx.send("inner").unwrap();
            });
            let got = inner_pool.receive(&rx);
            outer_tx.send(got).unwrap();
        });
        assert_eq!(pool.receive(&outer_rx), Some(Some("inner")));
    }

    #[test]
    fn test_zero_threads_means_one() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.threads(), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
