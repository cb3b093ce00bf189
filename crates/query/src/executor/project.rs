//! Project operator.

use super::bindings::Bindings;
use super::error::{ExecutionError, ExecutionResult};
use super::operator::{describe_unary, BoxedCursor, Cursor, Operator, OperatorRef};
use crate::context::ExecutionContext;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use cinder_core::schema::{RowType, RowTypeRef, Schema};
use cinder_core::{Result, RowRef, SharedRowSlot, Value, ValuesRow};
use tracing::debug;

/// Projects specific columns of each input row into a new row.
#[derive(Debug)]
pub struct Project {
    input: OperatorRef,
    /// Column indices to project.
    column_indices: Vec<usize>,
    row_type: RowTypeRef,
}

impl Project {
    /// Creates a new projection. Fails if a column index is outside the
    /// input's row type.
    pub fn new(schema: &Schema, input: OperatorRef, column_indices: Vec<usize>) -> Result<Self> {
        let row_type = RowType::project(schema, input.output_row_type(), &column_indices)?;
        Ok(Self {
            input,
            column_indices,
            row_type,
        })
    }
}

impl Operator for Project {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn children(&self) -> Vec<&OperatorRef> {
        vec![&self.input]
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(ProjectCursor {
            op: self,
            input: self.input.cursor(ctx),
            open: false,
            slot: SharedRowSlot::new().with_reuse(ctx.config().row_reuse),
        })
    }

    fn describe_plan(&self) -> String {
        describe_unary(&self.input, format_args!("Project({:?})", self.column_indices))
    }
}

struct ProjectCursor<'a> {
    op: &'a Project,
    input: BoxedCursor<'a>,
    open: bool,
    slot: SharedRowSlot<ValuesRow>,
}

impl ProjectCursor<'_> {
    fn pull(&mut self) -> ExecutionResult<Option<RowRef>> {
        let source = match self.input.next()? {
            Some(row) => row,
            None => return Ok(None),
        };
        let arity = self.op.input.output_row_type().arity();
        if source.len() != arity {
            return Err(ExecutionError::invariant(
                "Project",
                format!("input row has {} values, expected {}", source.len(), arity),
            ));
        }
        let op = self.op;
        let row: RowRef = self.slot.produce(
            || ValuesRow::empty(op.row_type.clone()),
            |row| {
                let values = row.values_mut();
                values.clear();
                values.extend(
                    op.column_indices
                        .iter()
                        .map(|&i| source.value(i).cloned().unwrap_or(Value::Null)),
                );
                row.set_hkey(source.hkey());
            },
        );
        Ok(Some(row))
    }
}

impl Cursor for ProjectCursor<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.close();
        self.input.open(bindings)?;
        self.open = true;
        debug!(operator = "Project", "cursor opened");
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        if !self.open {
            return Err(ExecutionError::not_open("Project"));
        }
        let result = self.pull();
        if result.is_err() {
            self.close();
        }
        result
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            debug!(operator = "Project", "cursor closed");
        }
        self.input.close();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionConfig;
    use crate::executor::{InMemoryAdapter, TableScan};
    use alloc::sync::Arc;
    use cinder_core::schema::Column;
    use cinder_core::{DataType, Error};

    fn setup(schema: &Schema) -> (InMemoryAdapter, OperatorRef) {
        let row_type = schema
            .table_type(
                "users",
                vec![
                    Column::new("id", DataType::Int64),
                    Column::new("name", DataType::String),
                    Column::new("age", DataType::Int64),
                ],
            )
            .unwrap();
        let mut adapter = InMemoryAdapter::new();
        adapter.add_table(
            "users",
            vec![
                vec![Value::Int64(1), Value::String("Alice".into()), Value::Int64(25)],
                vec![Value::Int64(2), Value::String("Bob".into()), Value::Int64(30)],
            ],
        );
        (adapter, Arc::new(TableScan::new("users", row_type)))
    }

    #[test]
    fn test_project() {
        let schema = Schema::new();
        let (adapter, scan) = setup(&schema);
        let config = ExecutionConfig::default();
        let project = Project::new(&schema, scan, vec![2, 1]).unwrap();
        assert_eq!(project.output_row_type().types(), &[DataType::Int64, DataType::String]);

        let mut cursor = project.cursor(ExecutionContext::new(&adapter, &config));
        cursor.open(&Rc::new(Bindings::new())).unwrap();
        let first = cursor.next().unwrap().unwrap();
        assert_eq!(first.values(), &[Value::Int64(25), Value::String("Alice".into())]);
        assert_eq!(first.row_type().id(), project.output_row_type().id());
        let second = cursor.next().unwrap().unwrap();
        assert_eq!(second.values(), &[Value::Int64(30), Value::String("Bob".into())]);
        assert_eq!(first.value(0), Some(&Value::Int64(25)));
        assert!(cursor.next().unwrap().is_none());
    }

    #[test]
    fn test_project_out_of_range() {
        let schema = Schema::new();
        let (_, scan) = setup(&schema);
        let err = Project::new(&schema, scan, vec![3]).unwrap_err();
        assert!(matches!(err, Error::ColumnOutOfRange { index: 3, .. }));
    }

    #[test]
    fn test_describe_plan() {
        let schema = Schema::new();
        let (_, scan) = setup(&schema);
        let project = Project::new(&schema, scan, vec![0, 2]).unwrap();
        assert_eq!(project.describe_plan(), "TableScan(users)\nProject([0, 2])");
    }
}
