//! Background prefetch over a single source

use super::actor::{Actor, Source, Staged};
use crate::error::Result;
use crate::parallel::WorkerPool;
use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;

/// Iterator that pulls from its source on a worker pool ahead of demand
///
/// Up to `lookahead` elements are staged in a bounded queue. Elements come
/// out in source order; a source error is returned by the call that would
/// have produced that element. After the source is exhausted `next` returns
/// `None` (and `next_or_exhausted` returns `NoMoreElements`) without blocking.
pub struct PrefetchingIterator<T> {
    pool: WorkerPool,
    actor: Arc<Actor<T>>,
    receiver: Receiver<Staged<T>>,
    peeked: Option<Staged<T>>,
    exhausted: bool,
}

impl<T: Send + 'static> PrefetchingIterator<T> {
    /// Starts prefetching `source` on `pool`
    pub fn new<I>(pool: &WorkerPool, source: I, lookahead: usize) -> Self
    where
        I: Iterator<Item = Result<T>> + Send + 'static,
    {
        let lookahead = lookahead.max(1);
        let (sender, receiver) = bounded(lookahead);
        let source: Source<T> = Box::new(source);
        let actor = Actor::new(source, sender, lookahead);
        actor.schedule(pool);

        PrefetchingIterator {
            pool: pool.clone(),
            actor,
            receiver,
            peeked: None,
            exhausted: false,
        }
    }

    /// True if another element (or error) is available
    ///
    /// Blocks until the background task has staged the next element or
    /// reached the end of the source.
    pub fn has_next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if self.peeked.is_none() {
            self.peeked = Some(self.fetch());
        }
        !matches!(self.peeked, Some(Staged::Done))
    }

    fn fetch(&mut self) -> Staged<T> {
        let staged = self.pool.receive(&self.receiver).unwrap_or(Staged::Done);
        // A slot just opened up
        self.actor.schedule(&self.pool);
        staged
    }
}

impl<T: Send + 'static> Iterator for PrefetchingIterator<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let staged = match self.peeked.take() {
            Some(staged) => staged,
            None => self.fetch(),
        };
        match staged {
            Staged::Item(item) => Some(Ok(item)),
            Staged::Failed(e) => Some(Err(e)),
            Staged::Done => {
                self.exhausted = true;
                None
            }
        }
    }
}
