//! Concurrent fan-in over several sources

use super::actor::{Actor, Source, Staged};
use crate::error::Result;
use crate::parallel::WorkerPool;
use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;

/// Merges `k` sources by prefetching each of them concurrently
///
/// Producers stop filling once the shared queue holds `lookahead` elements;
/// the queue itself has room for `lookahead + k` so that every source can
/// always report its end. Elements of one source keep their relative order,
/// elements of different sources interleave by completion time. Iteration
/// ends once every source has finished and the queue is drained.
pub struct ParallelIteratorIterator<T> {
    pool: WorkerPool,
    actors: Vec<Arc<Actor<T>>>,
    receiver: Receiver<Staged<T>>,
    active: usize,
}

impl<T: Send + 'static> ParallelIteratorIterator<T> {
    /// Starts prefetching every source on `pool`
    pub fn new<I, S>(pool: &WorkerPool, lookahead: usize, sources: S) -> Self
    where
        S: IntoIterator<Item = I>,
        I: Iterator<Item = Result<T>> + Send + 'static,
    {
        let sources: Vec<Source<T>> = sources
            .into_iter()
            .map(|source| Box::new(source) as Source<T>)
            .collect();
        let lookahead = lookahead.max(1);
        let (sender, receiver) = bounded(lookahead + sources.len());

        let actors: Vec<Arc<Actor<T>>> = sources
            .into_iter()
            .map(|source| Actor::new(source, sender.clone(), lookahead))
            .collect();
        for actor in &actors {
            actor.schedule(pool);
        }

        ParallelIteratorIterator {
            pool: pool.clone(),
            active: actors.len(),
            actors,
            receiver,
        }
    }

    /// Number of sources that have not finished yet
    pub fn active_sources(&self) -> usize {
        self.active
    }

    fn reschedule(&self) {
        for actor in &self.actors {
            actor.schedule(&self.pool);
        }
    }
}

impl<T: Send + 'static> Iterator for ParallelIteratorIterator<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.active > 0 {
            let staged = match self.pool.receive(&self.receiver) {
                Some(staged) => staged,
                None => {
                    self.active = 0;
                    break;
                }
            };
            self.reschedule();

            match staged {
                Staged::Item(item) => return Some(Ok(item)),
                Staged::Failed(e) => return Some(Err(e)),
                Staged::Done => self.active -= 1,
            }
        }
        None
    }
}
