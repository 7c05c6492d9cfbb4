//! Worker pool and background tasks
//!
//! Every concurrent feature of the evaluator runs on a [`WorkerPool`]: the
//! `thread` function, the prefetching iterator and the fan-in iterator.

mod pool;
mod task;

pub use pool::WorkerPool;
pub(crate) use pool::panic_message;
pub use task::TaskHandle;
