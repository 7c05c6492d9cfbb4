//! Worker pool, futures and the concurrent iterators

use itrex::iterators::NextOrExhausted;
use itrex::{
    Error, Evaluator, EvaluatorConfig, ParallelIteratorIterator, PrefetchingIterator,
    TaskHandle, Value, WorkerPool,
};
use pretty_assertions::assert_eq;

fn drain(value: Value) -> Vec<Value> {
    match value {
        Value::Iter(items) => items.drain().unwrap(),
        Value::List(items) => items.as_ref().clone(),
        other => panic!("expected a sequence, got {}", other),
    }
}

fn small_evaluator(workers: usize) -> Evaluator {
    Evaluator::with_config(EvaluatorConfig {
        worker_threads: workers,
        lookahead: 4,
    })
    .unwrap()
}

// ====================
// Iterators
// ====================

#[test]
fn test_prefetch_drains_in_order_then_exhausts() {
    let pool = WorkerPool::new(2).unwrap();
    let source = (0..100).map(|i| Ok(Value::Int(i)));
    let mut it = PrefetchingIterator::new(&pool, source, 8);

    for i in 0..100 {
        assert_eq!(it.next_or_exhausted().unwrap(), Value::Int(i));
    }
    assert!(matches!(it.next_or_exhausted(), Err(Error::NoMoreElements)));
}

#[test]
fn test_prefetch_reports_source_error_in_place() {
    let pool = WorkerPool::new(2).unwrap();
    let source = (0..5).map(|i| {
        if i == 3 {
            Err(Error::runtime("bad element"))
        } else {
            Ok(i)
        }
    });
    let results: Vec<_> = PrefetchingIterator::new(&pool, source, 2).collect();

    assert_eq!(results.len(), 5);
    assert_eq!(*results[2].as_ref().unwrap(), 2);
    assert!(results[3].is_err());
    assert_eq!(*results[4].as_ref().unwrap(), 4);
}

#[test]
fn test_merge_of_five_sources_is_total_and_ordered_per_source() {
    let pool = WorkerPool::new(4).unwrap();
    let sources: Vec<_> = (0..5usize)
        .map(|source| (0..100i64).map(move |i| Ok((source, i))))
        .collect();

    let merged: Vec<(usize, i64)> = ParallelIteratorIterator::new(&pool, 8, sources)
        .collect::<itrex::Result<_>>()
        .unwrap();
    assert_eq!(merged.len(), 500);

    for source in 0..5 {
        let own: Vec<i64> = merged
            .iter()
            .filter(|(s, _)| *s == source)
            .map(|(_, i)| *i)
            .collect();
        assert_eq!(own, (0..100).collect::<Vec<_>>());
    }
}

#[test]
fn test_merge_with_single_worker() {
    let pool = WorkerPool::new(1).unwrap();
    let sources = vec![(0..50).map(Ok), (50..100).map(Ok)];
    let mut merged: Vec<i64> = ParallelIteratorIterator::new(&pool, 1, sources)
        .collect::<itrex::Result<_>>()
        .unwrap();
    merged.sort_unstable();
    assert_eq!(merged, (0..100).collect::<Vec<_>>());
}

// ====================
// thread / join
// ====================

#[test]
fn test_join_thread_of_list() {
    let evaluator = Evaluator::new();
    let result = evaluator
        .evaluate_str("[join [thread [list 1 2 3 4 5 6 7 8 9 10]]]")
        .unwrap();
    assert_eq!(drain(result), (1..=10).map(Value::Int).collect::<Vec<_>>());
}

#[test]
fn test_join_thread_reads_variable() {
    let evaluator = Evaluator::new();
    evaluator.evaluate_str("[set q [list a b]]").unwrap();
    assert_eq!(
        evaluator.evaluate_str("[join [thread [get q]]]").unwrap(),
        vec![Value::from("a"), Value::from("b")]
    );
}

#[test]
fn test_threads_do_not_share_bindings() {
    let evaluator = Evaluator::new();
    let results = evaluator
        .evaluate_str("[join [thread [let [set x 1] [get x]] [let [set x 2] [get x]]]]")
        .unwrap();
    assert_eq!(results, vec![Value::Int(1), Value::Int(2)]);
    assert!(evaluator.evaluate_str("[get x]").is_err());
}

#[test]
fn test_nested_thread_join_on_one_worker() {
    let evaluator = small_evaluator(1);
    let result = evaluator
        .evaluate_str("[join [thread [add 1 [join [thread [add 2 [join [thread 3]]]]]]]]")
        .unwrap();
    assert_eq!(result, Value::Int(6));
}

#[test]
fn test_prefetch_inside_thread_on_one_worker() {
    let evaluator = small_evaluator(1);
    let result = evaluator
        .evaluate_str("[join [thread [fold add 0 [prefetch [range 200] 2]]]]")
        .unwrap();
    assert_eq!(result, Value::Int(19900));
}

#[test]
fn test_merge_function_totality() {
    let evaluator = small_evaluator(2);
    let merged = evaluator
        .evaluate_str("[merge [range 100] [range 100] [range 100] [range 100] [range 100]]")
        .unwrap();
    let values = drain(merged);
    assert_eq!(values.len(), 500);
    let total: i64 = values.iter().map(|v| v.as_int().unwrap()).sum();
    assert_eq!(total, 5 * 4950);
}

#[test]
fn test_thread_finishes_after_evaluator_is_dropped() {
    let future = small_evaluator(1)
        .evaluate_str("[thread [fold add 0 [map [curry add 1] [range 1000]]]]")
        .unwrap();
    match future {
        Value::Future(handle) => assert_eq!(handle.join().unwrap(), Value::Int(500500)),
        other => panic!("expected a future, got {}", other),
    }
}

#[test]
fn test_panicking_task_reaches_joiner() {
    let pool = WorkerPool::new(1).unwrap();
    let handle = TaskHandle::spawn(&pool, || panic!("boom"));
    assert!(matches!(handle.join(), Err(Error::BackgroundTask { .. })));
    // The pool survives
    let handle = TaskHandle::spawn(&pool, || Ok(Value::Int(1)));
    assert_eq!(handle.join().unwrap(), Value::Int(1));
}
