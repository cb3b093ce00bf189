//! Contract violations inside a cursor tree surface as invariant errors and
//! are never coerced away.

mod common;

use common::*;
use cinder_core::schema::{RowTypeRef, Schema};
use cinder_core::{DataType, RowRef, Value};
use cinder_query::context::ExecutionContext;
use cinder_query::executor::{
    Bindings, BoxedCursor, Cursor, ExecutionError, ExecutionResult, InMemoryAdapter, Operator, OperatorRef,
    UnionAll,
};
use std::rc::Rc;
use std::sync::Arc;

/// Declares one row type but passes through rows of its input's type.
#[derive(Debug)]
struct Mislabeled {
    input: OperatorRef,
    declared: RowTypeRef,
}

impl Operator for Mislabeled {
    fn name(&self) -> &'static str {
        "Mislabeled"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        &self.declared
    }

    fn children(&self) -> Vec<&OperatorRef> {
        vec![&self.input]
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(Passthrough(self.input.cursor(ctx)))
    }

    fn describe_plan(&self) -> String {
        self.input.describe_plan()
    }
}

struct Passthrough<'a>(BoxedCursor<'a>);

impl Cursor for Passthrough<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.0.open(bindings)
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        self.0.next()
    }

    fn close(&mut self) {
        self.0.close()
    }

    fn is_open(&self) -> bool {
        self.0.is_open()
    }
}

#[test]
fn test_union_rejects_rows_of_undeclared_type() {
    init_tracing();
    let schema = Schema::new();
    let mut adapter = InMemoryAdapter::new();
    adapter.add_table("a", ints(&[1]));
    adapter.add_table("b", ints(&[2]));
    let config = default_config();

    let mislabeled: OperatorRef = Arc::new(Mislabeled {
        input: scan(&schema, "b"),
        declared: schema.values_type_of(&[DataType::Int64]),
    });
    let union = UnionAll::new(&schema, vec![scan(&schema, "a"), mislabeled]).unwrap();

    let mut cursor = union.cursor(ExecutionContext::new(&adapter, &config));
    open(cursor.as_mut()).unwrap();
    assert_eq!(cursor.next().unwrap().unwrap().values(), &[Value::Int64(1)]);

    let err = cursor.next().unwrap_err();
    assert!(matches!(err, ExecutionError::Invariant { operator: "UnionAll", .. }));
    assert!(!err.is_usage());
    assert!(!cursor.is_open());
    cursor.close();
}

#[test]
fn test_scan_rejects_records_of_wrong_arity() {
    let schema = Schema::new();
    let mut adapter = InMemoryAdapter::new();
    adapter.add_table("wide", vec![vec![Value::Int64(1), Value::Int64(2)]]);
    let config = default_config();
    let plan = scan(&schema, "wide");

    let mut cursor = plan.cursor(ExecutionContext::new(&adapter, &config));
    open(cursor.as_mut()).unwrap();
    let err = cursor.next().unwrap_err();
    assert!(matches!(err, ExecutionError::Invariant { operator: "TableScan", .. }));
    assert!(!cursor.is_open());
}

#[test]
fn test_union_rejects_scanned_values_of_wrong_type() {
    let schema = Schema::new();
    let mut adapter = InMemoryAdapter::new();
    adapter.add_table("a", ints(&[1]));
    adapter.add_table("s", vec![vec![Value::String("not an int".into())]]);
    let config = default_config();
    let union = UnionAll::new(&schema, vec![scan(&schema, "a"), scan(&schema, "s")]).unwrap();

    let mut cursor = union.cursor(ExecutionContext::new(&adapter, &config));
    open(cursor.as_mut()).unwrap();
    assert_eq!(cursor.next().unwrap().unwrap().values(), &[Value::Int64(1)]);

    let err = cursor.next().unwrap_err();
    match &err {
        ExecutionError::Invariant { operator, message } => {
            assert_eq!(*operator, "TableScan");
            assert!(message.contains("type mismatch: expected BIGINT, got VARCHAR"), "{}", message);
        }
        other => panic!("expected an invariant violation, got {:?}", other),
    }
    assert!(!cursor.is_open());
}
