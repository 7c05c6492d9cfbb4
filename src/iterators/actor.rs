//! Background producer shared by the concurrent iterators
//!
//! An actor owns one source iterator and a sender into a bounded channel.
//! While scheduled it pulls from the source until the channel holds
//! `lookahead` elements, then goes idle. The consumer re-arms it after every
//! receive. The `scheduled` flag guarantees at most one pool job per actor,
//! which keeps each source's elements in order.

use crate::error::{Error, Result};
use crate::parallel::{panic_message, WorkerPool};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Boxed source iterator
pub(crate) type Source<T> = Box<dyn Iterator<Item = Result<T>> + Send>;

/// Queue entry; failures travel in band so they reach the consumer in order
pub(crate) enum Staged<T> {
    /// Next element
    Item(T),
    /// The source failed producing the next element
    Failed(Error),
    /// The source is exhausted
    Done,
}

pub(crate) struct Actor<T> {
    source: Mutex<Option<Source<T>>>,
    sender: Sender<Staged<T>>,
    lookahead: usize,
    scheduled: AtomicBool,
    finished: AtomicBool,
}

impl<T: Send + 'static> Actor<T> {
    pub(crate) fn new(source: Source<T>, sender: Sender<Staged<T>>, lookahead: usize) -> Arc<Self> {
        Arc::new(Actor {
            source: Mutex::new(Some(source)),
            sender,
            lookahead: lookahead.max(1),
            scheduled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        })
    }

    /// Queues a producer job unless one is already pending or the source is done
    pub(crate) fn schedule(self: &Arc<Self>, pool: &WorkerPool) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        if self
            .scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let actor = Arc::clone(self);
            pool.spawn(move || actor.run());
        }
    }

    fn run(&self) {
        loop {
            self.fill();
            self.scheduled.store(false, Ordering::SeqCst);

            // The consumer may have freed space after fill() saw a full queue
            // but before the flag was cleared; re-claim the flag in that case.
            if self.finished.load(Ordering::SeqCst) || self.sender.len() >= self.lookahead {
                return;
            }
            if self
                .scheduled
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }
        }
    }

    fn fill(&self) {
        let mut source = self.source.lock();

        while self.sender.len() < self.lookahead {
            let pulled = source
                .as_mut()
                .map(|iter| catch_unwind(AssertUnwindSafe(|| iter.next())));

            let staged = match pulled {
                None | Some(Ok(None)) => {
                    *source = None;
                    self.finished.store(true, Ordering::SeqCst);
                    Staged::Done
                }
                Some(Ok(Some(Ok(item)))) => Staged::Item(item),
                Some(Ok(Some(Err(e)))) => Staged::Failed(e),
                Some(Err(payload)) => {
                    // Report the panic, then finish with Done on the next pass
                    *source = None;
                    Staged::Failed(Error::background(format!(
                        "source iterator panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                }
            };

            let done = matches!(staged, Staged::Done);
            if self.sender.send(staged).is_err() {
                // Consumer went away
                trace!("consumer dropped; stopping producer");
                *source = None;
                self.finished.store(true, Ordering::SeqCst);
                return;
            }
            if done {
                return;
            }
        }
    }
}
