use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::interop::InteropCall;
use crate::iterators::FlattenValues;
use crate::parser::Expression;
use crate::runtime::{evaluate, Args, Context, LazyIter, Value};

/// Signature of a function implemented in Rust
pub type NativeFn = dyn Fn(Args, &Context) -> Result<Value> + Send + Sync;

/// Combine step of an [`Aggregator`]: `(continue?, new accumulator)`
pub type CombineFn = fn(&Value, &Value) -> Result<(bool, Value)>;

/// Anything that can be invoked with a lazy argument stream and a context
///
/// Cloning is cheap: every variant is reference counted.
#[derive(Clone)]
pub enum Function {
    /// Function implemented in Rust
    Builtin(Arc<Builtin>),
    /// Reducer with short-circuit support
    Reducer(Arc<Aggregator>),
    /// User-defined function with its lexical scope
    Closure(Arc<Closure>),
    /// Partial application
    Curried(Arc<Curried>),
    /// Stages applied one after another
    Pipeline(Arc<Pipeline>),
    /// Call into a host bridge
    Interop(Arc<InteropCall>),
}

/// Native function with its registered name and help text
pub struct Builtin {
    name: String,
    help: Option<String>,
    body: Box<NativeFn>,
}

/// Folds evaluated arguments into an accumulator
///
/// List and iterator arguments contribute their elements. When the combine
/// step answers `false` no further argument is evaluated.
pub struct Aggregator {
    name: String,
    initial: Value,
    combine: CombineFn,
}

/// Function defined in the expression language
pub struct Closure {
    body: Expression,
    captured: Context,
}

/// Function with some leading arguments already supplied
pub struct Curried {
    target: Function,
    prefix: Vec<Value>,
}

/// Left-to-right composition: each stage receives the previous stage's result
pub struct Pipeline {
    stages: Vec<Function>,
}

impl Aggregator {
    /// Creates a reducer starting from `initial`
    pub fn new(name: impl Into<String>, initial: Value, combine: CombineFn) -> Self {
        Aggregator {
            name: name.into(),
            initial,
            combine,
        }
    }

    /// Runs the reduction over `args`
    pub fn reduce(&self, args: Args) -> Result<Value> {
        let mut acc = self.initial.clone();
        for value in FlattenValues::one_level(Box::new(args)) {
            let (go_on, next) = (self.combine)(&acc, &value?)?;
            acc = next;
            if !go_on {
                break;
            }
        }
        Ok(acc)
    }
}

impl Function {
    /// Wraps a Rust closure
    pub fn native<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args, &Context) -> Result<Value> + Send + Sync + 'static,
    {
        Function::Builtin(Arc::new(Builtin {
            name: name.into(),
            help: None,
            body: Box::new(body),
        }))
    }

    /// Wraps a Rust closure with help text shown by `help`
    pub fn with_help<F>(name: impl Into<String>, help: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args, &Context) -> Result<Value> + Send + Sync + 'static,
    {
        Function::Builtin(Arc::new(Builtin {
            name: name.into(),
            help: Some(help.into()),
            body: Box::new(body),
        }))
    }

    /// Creates a reducer
    pub fn reducer(name: impl Into<String>, initial: Value, combine: CombineFn) -> Self {
        Function::Reducer(Arc::new(Aggregator::new(name, initial, combine)))
    }

    /// Creates a user function that evaluates `body` in a child of `captured`
    pub fn closure(body: Expression, captured: Context) -> Self {
        Function::Closure(Arc::new(Closure { body, captured }))
    }

    /// Binds leading arguments
    pub fn curry(target: Function, prefix: Vec<Value>) -> Self {
        Function::Curried(Arc::new(Curried { target, prefix }))
    }

    /// Chains `stages`, first stage first
    pub fn pipeline(stages: Vec<Function>) -> Self {
        Function::Pipeline(Arc::new(Pipeline { stages }))
    }

    /// Invokes the function
    pub fn apply(&self, mut args: Args, ctx: &Context) -> Result<Value> {
        trace!(function = %self.name(), "apply");
        match self {
            Function::Builtin(builtin) => (builtin.body)(args, ctx),
            Function::Reducer(aggregator) => aggregator.reduce(args),
            Function::Closure(closure) => {
                let scope = closure.captured.child();
                scope.set_arguments(LazyIter::new(args));
                evaluate(&closure.body, &scope)
            }
            Function::Curried(curried) => {
                args.prepend(curried.prefix.iter().cloned());
                curried.target.apply(args, ctx)
            }
            Function::Pipeline(pipeline) => {
                let mut stages = pipeline.stages.iter();
                let mut result = match stages.next() {
                    Some(first) => first.apply(args, ctx)?,
                    None => return Ok(Value::Null),
                };
                for stage in stages {
                    result = stage.apply(Args::from_values(vec![result]), ctx)?;
                }
                Ok(result)
            }
            Function::Interop(call) => call.apply(args),
        }
    }

    /// Invokes the function with already computed arguments
    pub fn call(&self, args: Vec<Value>, ctx: &Context) -> Result<Value> {
        self.apply(Args::from_values(args), ctx)
    }

    /// Name used in traces, errors and `help`
    pub fn name(&self) -> String {
        match self {
            Function::Builtin(builtin) => builtin.name.clone(),
            Function::Reducer(aggregator) => aggregator.name.clone(),
            Function::Closure(_) => "closure".to_string(),
            Function::Curried(curried) => format!("curry {}", curried.target.name()),
            Function::Pipeline(pipeline) => {
                let names: Vec<String> = pipeline.stages.iter().map(Function::name).collect();
                format!("pipeline {}", names.join(" | "))
            }
            Function::Interop(call) => call.name().to_string(),
        }
    }

    /// Help text, if the function has any
    pub fn help(&self) -> Option<String> {
        match self {
            Function::Builtin(builtin) => builtin.help.clone(),
            Function::Closure(closure) => Some(format!("[function {}]", closure.body)),
            Function::Curried(curried) => curried.target.help(),
            _ => None,
        }
    }

    /// True if both values are the same function object
    pub fn ptr_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => Arc::ptr_eq(a, b),
            (Function::Reducer(a), Function::Reducer(b)) => Arc::ptr_eq(a, b),
            (Function::Closure(a), Function::Closure(b)) => Arc::ptr_eq(a, b),
            (Function::Curried(a), Function::Curried(b)) => Arc::ptr_eq(a, b),
            (Function::Pipeline(a), Function::Pipeline(b)) => Arc::ptr_eq(a, b),
            (Function::Interop(a), Function::Interop(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name())
    }
}
