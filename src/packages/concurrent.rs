//! Background evaluation and concurrent iterators
//!
//! Everything here runs on the session's worker pool.

use tracing::trace;

use crate::error::{Error, Result};
use crate::iterators::{ParallelIteratorIterator, PrefetchingIterator};
use crate::packages::{iterable, Installer, Package};
use crate::parallel::TaskHandle;
use crate::parser::Expression;
use crate::runtime::{evaluate, Args, Context, Value};

/// `thread`, `join`, `prefetch`, `merge`
pub struct ConcurrentPackage;

impl Package for ConcurrentPackage {
    fn name(&self) -> &str {
        "concurrent"
    }

    fn install(&self, installer: &mut Installer) {
        installer.native("thread", THREAD_HELP, thread);
        installer.native("join", JOIN_HELP, |args, _| {
            let mut joined = args
                .map(|value| value.and_then(join_value))
                .collect::<Result<Vec<_>>>()?;
            match joined.len() {
                0 => Ok(Value::Null),
                1 => Ok(joined.remove(0)),
                _ => Ok(Value::list(joined)),
            }
        });
        installer.native(
            "prefetch",
            "[prefetch iterable lookahead] computes up to lookahead elements ahead of the consumer.",
            |mut args, ctx| {
                let source = args.require("prefetch", "iterable")?;
                let source = iterable("prefetch", &source)?;
                let lookahead = match args.optional()? {
                    Some(n) => positive("prefetch", &n)?,
                    None => ctx.session().config().lookahead,
                };
                Ok(Value::iter(PrefetchingIterator::new(
                    ctx.pool(),
                    source,
                    lookahead,
                )))
            },
        );
        installer.native(
            "merge",
            "[merge a b ...] iterates several iterables concurrently; elements arrive as they are produced.",
            |args, ctx| {
                let sources = args
                    .map(|value| value.and_then(|v| iterable("merge", &v)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::iter(ParallelIteratorIterator::new(
                    ctx.pool(),
                    ctx.session().config().lookahead,
                    sources,
                )))
            },
        );
    }
}

const THREAD_HELP: &str = "Evaluate the arguments in the background.

Each argument is evaluated on the worker pool in its own child context. One
argument returns a future, several return a list of futures; use join to wait
for the results. An iterator result keeps being produced in the background.

    [join [thread [fold add 0 [range 1000]]]]";

const JOIN_HELP: &str = "Wait for futures.

A future is replaced by its result, a list of futures by the list of results
and an iterator of futures by a lazy iterator of results. Other values are
returned unchanged.";

fn thread(mut args: Args, ctx: &Context) -> Result<Value> {
    let mut handles = Vec::new();
    while let Some(expr) = args.next_unevaluated() {
        handles.push(Value::Future(spawn(expr?, ctx)));
    }
    match handles.len() {
        0 => Err(Error::arity("thread", "requires an expression")),
        1 => Ok(handles.remove(0)),
        _ => Ok(Value::list(handles)),
    }
}

fn spawn(expr: Expression, ctx: &Context) -> TaskHandle {
    let scope = ctx.child();
    let task = TaskHandle::spawn(ctx.pool(), move || {
        match evaluate(&expr, &scope)? {
            Value::Iter(items) => {
                let lookahead = scope.session().config().lookahead;
                Ok(Value::iter(PrefetchingIterator::new(
                    scope.pool(),
                    items,
                    lookahead,
                )))
            }
            other => Ok(other),
        }
    });
    trace!(task = task.id(), "thread scheduled");
    task
}

fn join_value(value: Value) -> Result<Value> {
    match value {
        Value::Future(handle) => handle.join(),
        Value::List(items) => items
            .iter()
            .cloned()
            .map(join_one)
            .collect::<Result<Vec<_>>>()
            .map(Value::list),
        Value::Iter(items) => Ok(Value::iter(items.map(|item| item.and_then(join_one)))),
        other => Ok(other),
    }
}

fn join_one(value: Value) -> Result<Value> {
    match value {
        Value::Future(handle) => handle.join(),
        other => Ok(other),
    }
}

fn positive(function: &str, value: &Value) -> Result<usize> {
    match value.as_int()? {
        n if n > 0 => usize::try_from(n).map_err(|e| Error::arity(function, e.to_string())),
        n => Err(Error::arity(
            function,
            format!("lookahead must be positive, got {}", n),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::runtime::{Evaluator, Value};

    fn drain(value: Value) -> Vec<Value> {
        match value {
            Value::Iter(it) => it.drain().unwrap(),
            Value::List(items) => items.as_ref().clone(),
            other => panic!("expected a sequence, got {}", other),
        }
    }

    #[test]
    fn test_thread_and_join() {
        let evaluator = Evaluator::new();
        assert_eq!(
            evaluator.evaluate_str("[join [thread [add 1 2]]]").unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            evaluator
                .evaluate_str("[join [thread [add 1 2] [mul 2 3]]]")
                .unwrap(),
            vec![Value::Int(3), Value::Int(6)]
        );
        // Non-futures pass through
        assert_eq!(evaluator.evaluate_str("[join 5]").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_thread_sees_enclosing_bindings() {
        let evaluator = Evaluator::new();
        evaluator.evaluate_str("[set q 42]").unwrap();
        assert_eq!(
            evaluator.evaluate_str("[join [thread [get q]]]").unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn test_thread_failure_is_raised_by_join() {
        let evaluator = Evaluator::new();
        let future = evaluator.evaluate_str("[thread [div 1 0]]").unwrap();
        assert!(matches!(future, Value::Future(_)));
        evaluator.context().set("f", future);
        assert!(matches!(
            evaluator.evaluate_str("[join [get f]]"),
            Err(Error::DivisionByZero)
        ));
        // The failure is observed again on a second join
        assert!(evaluator.evaluate_str("[join [get f]]").is_err());
    }

    #[test]
    fn test_thread_iterator_result_is_prefetched() {
        let evaluator = Evaluator::new();
        let result = evaluator
            .evaluate_str("[join [thread [map [curry mul 2] [range 5]]]]")
            .unwrap();
        assert_eq!(
            drain(result),
            vec![
                Value::Int(0),
                Value::Int(2),
                Value::Int(4),
                Value::Int(6),
                Value::Int(8)
            ]
        );
    }

    #[test]
    fn test_prefetch_keeps_order() {
        let evaluator = Evaluator::new();
        let result = evaluator.evaluate_str("[prefetch [range 100] 4]").unwrap();
        let expected: Vec<Value> = (0..100).map(Value::Int).collect();
        assert_eq!(drain(result), expected);
        assert!(evaluator.evaluate_str("[prefetch [range 3] 0]").is_err());
    }

    #[test]
    fn test_merge_yields_every_element() {
        let evaluator = Evaluator::new();
        let result = evaluator
            .evaluate_str("[merge [range 10] [list a b] [range 100 105]]")
            .unwrap();
        let mut ints = Vec::new();
        let mut words = Vec::new();
        for value in drain(result) {
            match value {
                Value::Int(n) => ints.push(n),
                Value::String(s) => words.push(s),
                other => panic!("unexpected {}", other),
            }
        }
        ints.sort_unstable();
        let expected: Vec<i64> = (0..10).chain(100..105).collect();
        assert_eq!(ints, expected);
        assert_eq!(words, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_join_iterator_of_futures() {
        let evaluator = Evaluator::new();
        let result = evaluator
            .evaluate_str("[join [flatten [thread 1 2]]]")
            .unwrap();
        assert_eq!(drain(result), vec![Value::Int(1), Value::Int(2)]);
    }
}
