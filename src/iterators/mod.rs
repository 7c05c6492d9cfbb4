//! Lazy iterator adapters
//!
//! Sequential adapters over value streams plus the two concurrent adapters,
//! [`PrefetchingIterator`] and [`ParallelIteratorIterator`], which stage
//! elements on a [`WorkerPool`](crate::parallel::WorkerPool) ahead of demand.

mod actor;
mod merge;
mod prefetch;

pub use merge::ParallelIteratorIterator;
pub use prefetch::PrefetchingIterator;

use crate::error::{Error, Result};
use crate::runtime::{Value, ValueIter};

/// Converts iterator exhaustion into [`Error::NoMoreElements`]
pub trait NextOrExhausted<T> {
    /// Next element, or `NoMoreElements` once the iterator is used up
    fn next_or_exhausted(&mut self) -> Result<T>;
}

impl<I, T> NextOrExhausted<T> for I
where
    I: Iterator<Item = Result<T>> + ?Sized,
{
    fn next_or_exhausted(&mut self) -> Result<T> {
        self.next().unwrap_or(Err(Error::NoMoreElements))
    }
}

/// Splices nested lists and iterators into one flat stream
///
/// With a depth limit of `1` this concatenates the sequences found in the
/// source, one after another, leaving deeper nesting alone. Without a limit
/// every level is flattened. Nesting is tracked on an explicit stack, so deep
/// structures do not grow the call stack.
pub struct FlattenValues {
    stack: Vec<ValueIter>,
    max_depth: Option<usize>,
}

impl FlattenValues {
    /// Flattens `source` down to `max_depth` levels (`None` for all of them)
    pub fn new(source: ValueIter, max_depth: Option<usize>) -> Self {
        FlattenValues {
            stack: vec![source],
            max_depth,
        }
    }

    /// Flattens every level of nesting
    pub fn deep(source: ValueIter) -> Self {
        Self::new(source, None)
    }

    /// Flattens a single level of nesting
    pub fn one_level(source: ValueIter) -> Self {
        Self::new(source, Some(1))
    }
}

impl Iterator for FlattenValues {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let depth = self.stack.len();
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(value)) => {
                    if self.max_depth.map_or(true, |max| depth <= max) {
                        if let Some(inner) = value.iterate() {
                            self.stack.push(inner);
                            continue;
                        }
                    }
                    return Some(Ok(value));
                }
            }
        }
    }
}

/// Drops `Null` elements from a value stream
pub struct SkipNulls<I> {
    inner: I,
}

impl<I> SkipNulls<I> {
    /// Wraps `inner`
    pub fn new(inner: I) -> Self {
        SkipNulls { inner }
    }
}

impl<I> Iterator for SkipNulls<I>
where
    I: Iterator<Item = Result<Value>>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find(|item| !matches!(item, Ok(Value::Null)))
    }
}
