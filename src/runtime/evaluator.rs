use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::interop::HostBridge;
use crate::packages::{self, Package};
use crate::parser::{Expression, ExpressionParser};
use crate::runtime::{Args, Context, EvaluatorConfig, Function, LazyIter, Session, Value};

/// Evaluates an expression against a context
///
/// Atoms evaluate to themselves. For a sequence the head is resolved in the
/// function registry and invoked with a lazy stream over the remaining
/// elements; those are only evaluated when the function pulls them.
pub fn evaluate(expr: &Expression, ctx: &Context) -> Result<Value> {
    let items = match expr {
        Expression::Sequence(items) => items,
        atom => return Ok(Value::from_atom(atom).unwrap_or(Value::Null)),
    };

    let head = match items.first() {
        Some(head) => head,
        None => return Ok(Value::Iter(LazyIter::empty())),
    };

    let function = match head {
        Expression::Word(name) | Expression::Text(name) => {
            ctx.function(name).ok_or_else(|| Error::UnknownFunction { name: name.clone() })?
        }
        Expression::Sequence(_) => {
            let value = evaluate(head, ctx)?;
            ctx.resolve_function(&value)?
        }
        other => {
            return Err(Error::UnknownFunction {
                name: other.to_string(),
            })
        }
    };

    trace!(function = %function.name(), args = items.len() - 1, "dispatch");
    function.apply(Args::from_expressions(Arc::clone(items), 1, ctx.clone()), ctx)
}

/// Embeddable evaluator: a root context with the default packages imported
///
/// # Example
///
/// ```rust
/// use itrex::{Evaluator, Value};
///
/// let evaluator = Evaluator::new();
/// let result = evaluator.evaluate_str("[fold [curry add] 0 [list 1 2 3 4]]").unwrap();
/// assert_eq!(result, Value::Int(10));
/// ```
pub struct Evaluator {
    root: Context,
}

impl Evaluator {
    /// Evaluator on the shared worker pool with every default package imported
    pub fn new() -> Self {
        let evaluator = Self::bare(Session::shared());
        evaluator.install_defaults();
        evaluator
    }

    /// Evaluator with a dedicated worker pool built from `config`
    pub fn with_config(config: EvaluatorConfig) -> Result<Self> {
        let evaluator = Self::bare(Session::new(config)?);
        evaluator.install_defaults();
        Ok(evaluator)
    }

    /// Evaluator whose registry is empty; packages are importable but not imported
    pub fn bare(session: Arc<Session>) -> Self {
        for package in packages::defaults() {
            session.add_package(package);
        }
        Evaluator {
            root: Context::root(session),
        }
    }

    fn install_defaults(&self) {
        for name in packages::DEFAULT_IMPORTS {
            if let Err(e) = self.import(name, None) {
                debug!(package = name, error = %e, "default import failed");
            }
        }
    }

    /// Root context of this evaluator
    pub fn context(&self) -> &Context {
        &self.root
    }

    /// Fresh child of the root context
    pub fn child_context(&self) -> Context {
        self.root.child()
    }

    /// Session shared by this evaluator's contexts
    pub fn session(&self) -> &Arc<Session> {
        self.root.session()
    }

    /// Evaluates `expr` in the root context
    pub fn evaluate(&self, expr: &Expression) -> Result<Value> {
        evaluate(expr, &self.root)
    }

    /// Evaluates `expr` in `ctx`
    pub fn evaluate_in(&self, expr: &Expression, ctx: &Context) -> Result<Value> {
        evaluate(expr, ctx)
    }

    /// Parses and evaluates every expression in `source`, returning the last value
    pub fn evaluate_str(&self, source: &str) -> Result<Value> {
        let mut parser = ExpressionParser::from_source(source)?;
        let mut last = Value::Null;
        while let Some(expr) = parser.parse_next()? {
            last = self.evaluate(&expr)?;
        }
        Ok(last)
    }

    /// Installs or replaces a function in the root registry
    pub fn register(&self, name: impl Into<String>, function: Function) {
        self.root.register(name, function);
    }

    /// Registers a Rust closure under `name`
    pub fn register_fn<F>(&self, name: &str, body: F)
    where
        F: Fn(Args, &Context) -> Result<Value> + Send + Sync + 'static,
    {
        self.root.register(name, Function::native(name, body));
    }

    /// Makes `package` importable by name
    pub fn install_package(&self, package: Arc<dyn Package>) {
        self.session().add_package(package);
    }

    /// Imports a package into the root registry, optionally under `prefix`
    pub fn import(&self, name: &str, prefix: Option<&str>) -> Result<()> {
        packages::import_into(&self.root, name, prefix)
    }

    /// Drops every binding and function of the root context
    ///
    /// Closures bound in the root capture it, so an evaluator that defined
    /// functions keeps its root alive until this is called. Values still
    /// being drained after `shutdown` fail with `UnknownFunction`.
    pub fn shutdown(&self) {
        debug!("evaluator shutdown");
        self.root.clear();
    }

    /// Makes the `interop` package importable, backed by `bridge`
    pub fn with_host(self, bridge: Arc<dyn HostBridge>) -> Self {
        self.install_package(Arc::new(packages::InteropPackage::new(bridge)));
        self
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
