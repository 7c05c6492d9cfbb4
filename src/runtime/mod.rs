//! Runtime for itrex expressions: values, scopes, functions and dispatch

mod args;
mod context;
mod evaluator;
mod function;
mod session;
mod value;

pub use args::Args;
pub use context::Context;
pub use evaluator::{evaluate, Evaluator};
pub use function::{Aggregator, CombineFn, Function, NativeFn};
pub use session::{EvaluatorConfig, Session, DEFAULT_LOOKAHEAD};
pub use value::{LazyIter, Value, ValueIter};
