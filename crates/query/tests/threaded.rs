//! One immutable operator tree executed from several threads at once, each
//! thread with its own cursor tree.

mod common;

use common::*;
use cinder_core::schema::Schema;
use cinder_core::Value;
use cinder_query::context::{ExecutionConfig, ExecutionContext};
use cinder_query::executor::{
    column_filter, Bindings, CompareOp, Execution, InMemoryAdapter, Limit, Operand, OperatorRef, UnionAll,
};
use std::sync::Arc;
use std::thread;

const THREADS: i64 = 8;

fn adapter() -> InMemoryAdapter {
    let mut adapter = InMemoryAdapter::new();
    adapter.add_table("a", ints(&(0..100).collect::<Vec<_>>()));
    adapter.add_table("b", ints(&(100..150).collect::<Vec<_>>()));
    adapter
}

#[test]
fn test_shared_operator_tree() {
    init_tracing();
    let schema = Schema::new();
    let adapter = adapter();
    let union: OperatorRef = Arc::new(UnionAll::new(&schema, vec![scan(&schema, "a"), scan(&schema, "b")]).unwrap());
    // Each thread binds its own threshold.
    let plan: OperatorRef = Arc::new(column_filter(union, 0, CompareOp::Ge, Operand::Binding(0)));

    let results: Vec<(i64, Vec<Vec<Value>>)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let plan = Arc::clone(&plan);
                let adapter = &adapter;
                scope.spawn(move || {
                    let config = ExecutionConfig::default().with_row_reuse(t % 2 == 0);
                    let threshold = t * 20;
                    let values = Execution::run(
                        plan.as_ref(),
                        ExecutionContext::new(adapter, &config),
                        Bindings::from_values(vec![Value::Int64(threshold)]),
                    )
                    .unwrap()
                    .collect_values()
                    .unwrap();
                    (threshold, values)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (threshold, values) in results {
        let expected = ints(&(threshold..150).collect::<Vec<_>>());
        assert_eq!(values, expected, "threshold {}", threshold);
    }
}

#[test]
fn test_interleaved_cursors_on_one_thread() {
    let schema = Schema::new();
    let adapter = adapter();
    let config = ExecutionConfig::default();
    let plan = Limit::new(scan(&schema, "a"), 3, 5);

    let mut first = Execution::run(&plan, ExecutionContext::new(&adapter, &config), Bindings::new()).unwrap();
    let mut second = Execution::run(&plan, ExecutionContext::new(&adapter, &config), Bindings::new()).unwrap();
    let mut a = Vec::new();
    let mut b = Vec::new();
    for _ in 0..3 {
        a.push(first.next().unwrap().unwrap().values().to_vec());
        b.push(second.next().unwrap().unwrap().values().to_vec());
    }
    assert!(first.next().is_none());
    assert!(second.next().is_none());
    assert_eq!(a, ints(&[5, 6, 7]));
    assert_eq!(a, b);
}
