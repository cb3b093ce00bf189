//! Correlated nested loop join.

use crate::context::ExecutionContext;
use crate::executor::bindings::Bindings;
use crate::executor::error::{ExecutionError, ExecutionResult};
use crate::executor::operator::{BoxedCursor, Cursor, Operator, OperatorRef};
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use cinder_core::schema::{RowType, RowTypeRef, Schema};
use cinder_core::{Error, Result, Row, RowRef, SharedRowSlot, Value, ValuesRow};
use tracing::debug;

/// Join type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinType {
    /// Emit only outer rows with at least one inner match.
    Inner,
    /// Also emit unmatched outer rows, padded with NULLs.
    LeftOuter,
}

/// Nested loop join that re-executes its inner input once per outer row.
///
/// For each outer row, the value of `outer_column` is bound at
/// `binding_position` in a copy of the join's own bindings, and the inner
/// cursor is reopened with those bindings. Inner operators read the value
/// through [`crate::executor::Operand::Binding`], which is how a correlated
/// lookup or filter sees the current outer row. Output rows are the outer
/// row's values followed by the inner row's values.
#[derive(Debug)]
pub struct NestedLoopJoin {
    outer: OperatorRef,
    inner: OperatorRef,
    outer_column: usize,
    binding_position: usize,
    join_type: JoinType,
    row_type: RowTypeRef,
}

impl NestedLoopJoin {
    /// Creates a new nested loop join.
    pub fn new(
        schema: &Schema,
        outer: OperatorRef,
        inner: OperatorRef,
        outer_column: usize,
        binding_position: usize,
        join_type: JoinType,
    ) -> Result<Self> {
        let outer_type = outer.output_row_type();
        if outer_column >= outer_type.arity() {
            return Err(Error::column_out_of_range(
                format!("{}", outer_type),
                outer_column,
                outer_type.arity(),
            ));
        }
        let row_type = RowType::concat(
            schema,
            outer_type,
            inner.output_row_type(),
            join_type == JoinType::LeftOuter,
        );
        Ok(Self {
            outer,
            inner,
            outer_column,
            binding_position,
            join_type,
            row_type,
        })
    }

    /// Creates an inner nested loop join.
    pub fn inner(
        schema: &Schema,
        outer: OperatorRef,
        inner: OperatorRef,
        outer_column: usize,
        binding_position: usize,
    ) -> Result<Self> {
        Self::new(schema, outer, inner, outer_column, binding_position, JoinType::Inner)
    }

    /// Creates a left outer nested loop join.
    pub fn left_outer(
        schema: &Schema,
        outer: OperatorRef,
        inner: OperatorRef,
        outer_column: usize,
        binding_position: usize,
    ) -> Result<Self> {
        Self::new(schema, outer, inner, outer_column, binding_position, JoinType::LeftOuter)
    }
}

impl Operator for NestedLoopJoin {
    fn name(&self) -> &'static str {
        "NestedLoopJoin"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn children(&self) -> Vec<&OperatorRef> {
        vec![&self.outer, &self.inner]
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(NestedLoopCursor {
            op: self,
            outer: self.outer.cursor(ctx),
            inner: self.inner.cursor(ctx),
            bindings: None,
            current: None,
            matched: false,
            outer_done: false,
            slot: SharedRowSlot::new().with_reuse(ctx.config().row_reuse),
        })
    }

    fn describe_plan(&self) -> String {
        format!(
            "{}\nNestedLoopJoin({:?}, #{} -> ${})\n  {}",
            self.outer.describe_plan(),
            self.join_type,
            self.outer_column,
            self.binding_position,
            self.inner.describe_plan().replace('\n', "\n  ")
        )
    }
}

struct NestedLoopCursor<'a> {
    op: &'a NestedLoopJoin,
    outer: BoxedCursor<'a>,
    inner: BoxedCursor<'a>,
    /// `Some` while open.
    bindings: Option<Rc<Bindings>>,
    /// Outer row the inner cursor is currently open for.
    current: Option<RowRef>,
    matched: bool,
    outer_done: bool,
    slot: SharedRowSlot<ValuesRow>,
}

impl NestedLoopCursor<'_> {
    fn pull(&mut self, bindings: &Bindings) -> ExecutionResult<Option<RowRef>> {
        loop {
            let outer_row = match &self.current {
                Some(row) => Rc::clone(row),
                None => {
                    if self.outer_done {
                        return Ok(None);
                    }
                    let Some(row) = self.outer.next()? else {
                        self.outer_done = true;
                        self.outer.close();
                        return Ok(None);
                    };
                    let key = row.value(self.op.outer_column).cloned().unwrap_or(Value::Null);
                    let derived = Rc::new(bindings.with(self.op.binding_position, key)?);
                    self.current = Some(Rc::clone(&row));
                    self.matched = false;
                    self.inner.open(&derived)?;
                    row
                }
            };

            match self.inner.next()? {
                Some(inner_row) => {
                    self.matched = true;
                    return Ok(Some(self.combine(&*outer_row, Some(&*inner_row))));
                }
                None => {
                    self.inner.close();
                    self.current = None;
                    if self.op.join_type == JoinType::LeftOuter && !self.matched {
                        return Ok(Some(self.combine(&*outer_row, None)));
                    }
                }
            }
        }
    }

    fn combine(&mut self, outer: &dyn Row, inner: Option<&dyn Row>) -> RowRef {
        let op = self.op;
        let inner_arity = op.inner.output_row_type().arity();
        self.slot.produce(
            || ValuesRow::empty(op.row_type.clone()),
            |row| {
                let values = row.values_mut();
                values.clear();
                values.extend_from_slice(outer.values());
                match inner {
                    Some(inner) => values.extend_from_slice(inner.values()),
                    None => values.resize(values.len() + inner_arity, Value::Null),
                }
                row.set_hkey(inner.and_then(|r| r.hkey()).or(outer.hkey()));
            },
        )
    }
}

impl Cursor for NestedLoopCursor<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.close();
        self.outer.open(bindings)?;
        self.bindings = Some(Rc::clone(bindings));
        self.outer_done = false;
        debug!(operator = "NestedLoopJoin", "cursor opened");
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        let bindings = self
            .bindings
            .clone()
            .ok_or_else(|| ExecutionError::not_open("NestedLoopJoin"))?;
        let result = self.pull(&bindings);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn close(&mut self) {
        self.inner.close();
        self.outer.close();
        self.current = None;
        if self.bindings.take().is_some() {
            debug!(operator = "NestedLoopJoin", "cursor closed");
        }
    }

    fn is_open(&self) -> bool {
        self.bindings.is_some()
    }
}
