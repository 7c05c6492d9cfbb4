use std::collections::VecDeque;
use std::iter::Peekable;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::parser::Expression;
use crate::runtime::{evaluate, Context, Value, ValueIter};

/// Lazy argument stream handed to every function call
///
/// Arguments coming from source text are evaluated one at a time, only when
/// pulled, so control functions can skip a branch or take a body
/// unevaluated. Values pushed in front (by curried functions) and streams
/// built from already computed values pass through as they are.
pub struct Args {
    pending: VecDeque<Value>,
    source: ArgSource,
}

enum ArgSource {
    Expressions {
        context: Context,
        exprs: Arc<[Expression]>,
        next: usize,
    },
    Values(Peekable<ValueIter>),
}

impl Args {
    /// Arguments `exprs[start..]`, evaluated against `context` on demand
    pub fn from_expressions(exprs: Arc<[Expression]>, start: usize, context: Context) -> Self {
        Args {
            pending: VecDeque::new(),
            source: ArgSource::Expressions {
                context,
                exprs,
                next: start,
            },
        }
    }

    /// Arguments drawn from a stream of computed values
    pub fn from_iter(values: ValueIter) -> Self {
        Args {
            pending: VecDeque::new(),
            source: ArgSource::Values(values.peekable()),
        }
    }

    /// Arguments from a vector of computed values
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::from_iter(Box::new(values.into_iter().map(Ok)))
    }

    /// No arguments
    pub fn empty() -> Self {
        Self::from_values(Vec::new())
    }

    /// Places `values` in front of the remaining arguments, keeping their order
    pub fn prepend(&mut self, values: impl IntoIterator<Item = Value>) {
        let values: Vec<Value> = values.into_iter().collect();
        for value in values.into_iter().rev() {
            self.pending.push_front(value);
        }
    }

    /// True if another argument remains
    ///
    /// For a stream of computed values this may force the next element.
    pub fn has_next(&mut self) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        match &mut self.source {
            ArgSource::Expressions { exprs, next, .. } => *next < exprs.len(),
            ArgSource::Values(values) => values.peek().is_some(),
        }
    }

    /// Evaluates the next argument against `context` instead of the call site
    ///
    /// Used by `let`, whose arguments see the bindings made by earlier ones.
    pub fn next_in(&mut self, context: &Context) -> Option<Result<Value>> {
        if let Some(value) = self.pending.pop_front() {
            return Some(Ok(value));
        }
        match &mut self.source {
            ArgSource::Expressions { exprs, next, .. } => {
                let expr = exprs.get(*next)?;
                *next += 1;
                Some(evaluate(expr, context))
            }
            ArgSource::Values(values) => values.next(),
        }
    }

    /// Takes the next argument without evaluating it
    ///
    /// Already computed values are turned back into expressions.
    pub fn next_unevaluated(&mut self) -> Option<Result<Expression>> {
        if let Some(value) = self.pending.pop_front() {
            return Some(Expression::try_from(&value));
        }
        match &mut self.source {
            ArgSource::Expressions { exprs, next, .. } => {
                let expr = exprs.get(*next)?.clone();
                *next += 1;
                Some(Ok(expr))
            }
            ArgSource::Values(values) => {
                Some(values.next()?.and_then(|value| Expression::try_from(&value)))
            }
        }
    }

    /// Advances past the next argument without evaluating it
    ///
    /// Returns false if there was nothing to skip.
    pub fn skip_next(&mut self) -> bool {
        if self.pending.pop_front().is_some() {
            return true;
        }
        match &mut self.source {
            ArgSource::Expressions { exprs, next, .. } => {
                if *next < exprs.len() {
                    *next += 1;
                    true
                } else {
                    false
                }
            }
            ArgSource::Values(values) => values.next().is_some(),
        }
    }

    /// Next argument, or an arity error naming `function` and the missing `what`
    pub fn require(&mut self, function: &str, what: &str) -> Result<Value> {
        match self.next() {
            Some(value) => value,
            None => Err(Error::arity(function, format!("missing {}", what))),
        }
    }

    /// Next argument if any, propagating evaluation errors
    pub fn optional(&mut self) -> Result<Option<Value>> {
        self.next().transpose()
    }

    /// Evaluates and collects every remaining argument
    pub fn collect_values(self) -> Result<Vec<Value>> {
        self.collect()
    }
}

impl Iterator for Args {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.pending.pop_front() {
            return Some(Ok(value));
        }
        match &mut self.source {
            ArgSource::Expressions {
                context,
                exprs,
                next,
            } => {
                let expr = exprs.get(*next)?;
                *next += 1;
                Some(evaluate(expr, context))
            }
            ArgSource::Values(values) => values.next(),
        }
    }
}
