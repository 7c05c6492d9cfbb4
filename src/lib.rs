//! # itrex - Iterator Expressions
//!
//! An embeddable evaluator for a small bracketed expression language built
//! around lazy arguments and iterators. Functions receive their arguments
//! unevaluated and pull them on demand, so control flow (`if`, `and`, `or`,
//! `case`) is ordinary library code, and sequences stay lazy from `range`
//! through `map` and `filter` to whoever consumes them.
//!
//! ## Features
//!
//! - **Lazy arguments** - a function only evaluates the arguments it asks for
//! - **Lexical scoping** - user functions capture the context they were defined in
//! - **Functional toolkit** - `curry`, `compose`, `pipeline`, `map`, `filter`, `fold`
//! - **Concurrency** - `thread`/`join`, prefetching and fan-in iterators on a rayon pool
//! - **Packages** - functions come in named bundles that `import` can namespace
//! - **Host interop** - reach objects of the embedding program through a [`HostBridge`]
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! itrex = "1.0.0"
//! ```
//!
//! ### Basic Usage
//!
//! ```rust
//! use itrex::{Evaluator, Value};
//!
//! # fn main() -> itrex::Result<()> {
//! let evaluator = Evaluator::new();
//!
//! let result = evaluator.evaluate_str("[fold add 0 [range 1 11]]")?;
//! assert_eq!(result, Value::Int(55));
//!
//! // Bare words are strings; variables are read with get
//! evaluator.evaluate_str("[set greeting hello]")?;
//! let result = evaluator.evaluate_str("[stringConcat [get greeting] \", world\"]")?;
//! assert_eq!(result, Value::from("hello, world"));
//! # Ok(())
//! # }
//! ```
//!
//! ### User Functions
//!
//! ```rust
//! use itrex::{Evaluator, Value};
//!
//! # fn main() -> itrex::Result<()> {
//! let evaluator = Evaluator::new();
//! // [function body] reads its arguments with arg
//! evaluator.evaluate_str("[register square [function [let [set x [arg]] [mul [get x] [get x]]]]]")?;
//!
//! let result = evaluator.evaluate_str("[square 4]")?;
//! assert_eq!(result, Value::Int(16));
//! # Ok(())
//! # }
//! ```
//!
//! ### Registering Rust Functions
//!
//! ```rust
//! use itrex::{Evaluator, Value};
//!
//! # fn main() -> itrex::Result<()> {
//! let evaluator = Evaluator::new();
//! evaluator.register_fn("shout", |args, _| {
//!     let words = args
//!         .map(|v| v.map(|v| v.to_text().to_uppercase()))
//!         .collect::<itrex::Result<Vec<_>>>()?;
//!     Ok(Value::from(words.join(" ")))
//! });
//!
//! assert_eq!(evaluator.evaluate_str("[shout a b]")?, Value::from("A B"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source → Scanner → Tokens → ExpressionParser → Expression → evaluate() → Value
//!                                                                ↑
//!                                       Context chain (bindings, functions, arguments)
//! ```
//!
//! - [`Scanner`] - tokenizes source text, recording character offsets
//! - [`ExpressionParser`] - turns tokens into [`Expression`] trees
//! - [`Evaluator`] - owns the root [`Context`] and evaluates expressions
//! - [`Function`] - builtins, reducers, closures, curried functions, pipelines
//! - [`WorkerPool`] - rayon pool behind `thread` and the concurrent iterators
//! - [`Shell`] - line-oriented interactive loop used by the `itrex` binary
//!
//! ## Error Handling
//!
//! ```rust
//! use itrex::{Error, Evaluator};
//!
//! let evaluator = Evaluator::new();
//! match evaluator.evaluate_str("[div 10 0]") {
//!     Err(Error::DivisionByZero) => {}
//!     other => panic!("expected division by zero, got {:?}", other),
//! }
//!
//! // Input that ends inside a group asks for more input instead of failing
//! let err = evaluator.evaluate_str("[add 1").unwrap_err();
//! assert!(err.is_incomplete());
//! ```
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

#![warn(missing_docs)]

/// Version of the itrex evaluator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod interop;
pub mod iterators;
pub mod lexer;
pub mod packages;
pub mod parallel;
pub mod parser;
pub mod runtime;
pub mod shell;

// Re-export main types
pub use error::{Error, ErrorSeverity, Result};
pub use interop::{HostBridge, HostClass, HostObject, HostRegistry, InteropError};
pub use iterators::{ParallelIteratorIterator, PrefetchingIterator};
pub use lexer::{Scanner, Token, TokenKind};
pub use packages::{Installer, Package};
pub use parallel::{TaskHandle, WorkerPool};
pub use parser::{parse, Expression, ExpressionParser};
pub use runtime::{
    evaluate, Args, Context, Evaluator, EvaluatorConfig, Function, LazyIter, Session, Value,
};
pub use shell::{render, Shell};
