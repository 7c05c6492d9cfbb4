//! Handles for `thread`-scheduled evaluations

use crate::error::{Error, Result};
use crate::parallel::{panic_message, WorkerPool};
use crate::runtime::Value;
use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static TASK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Future of a value computed on a [`WorkerPool`]
///
/// The job stores its outcome and then drops its end of a rendezvous
/// channel; every joiner waits for that disconnect, so any number of
/// clones may join the same task.
#[derive(Clone)]
pub struct TaskHandle {
    id: u64,
    pool: WorkerPool,
    done: Receiver<()>,
    outcome: Arc<Mutex<Option<Result<Value>>>>,
}

impl TaskHandle {
    /// Schedules `job` on `pool` and returns immediately
    ///
    /// A panic inside the job becomes an [`Error::BackgroundTask`].
    pub fn spawn<F>(pool: &WorkerPool, job: F) -> Self
    where
        F: FnOnce() -> Result<Value> + Send + 'static,
    {
        let id = TASK_COUNTER.fetch_add(1, Ordering::SeqCst);
        let (done_tx, done) = bounded::<()>(0);
        let outcome = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&outcome);
        pool.spawn(move || {
            trace!(task = id, "task started");
            let result = catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
                Err(Error::background(format!(
                    "task {} panicked: {}",
                    id,
                    panic_message(payload.as_ref())
                )))
            });
            if let Err(e) = &result {
                debug!(task = id, error = %e, "task failed");
            }
            *slot.lock() = Some(result);
            drop(done_tx);
        });

        TaskHandle {
            id,
            pool: pool.clone(),
            done,
            outcome,
        }
    }

    /// Unique task number
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once the job has stored its outcome
    pub fn is_finished(&self) -> bool {
        self.outcome.lock().is_some()
    }

    /// Blocks until the job finishes and returns its result or re-raises its failure
    pub fn join(&self) -> Result<Value> {
        // Only ever disconnects; no message is sent
        let _ = self.pool.receive(&self.done);

        match self.outcome.lock().as_ref() {
            Some(result) => result.clone(),
            None => Err(Error::background(format!(
                "task {} was dropped before it ran",
                self.id
            ))),
        }
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}
