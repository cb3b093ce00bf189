//! Filter operator.

use super::bindings::{Bindings, Operand};
use super::error::{ExecutionError, ExecutionResult};
use super::operator::{describe_unary, BoxedCursor, Cursor, Operator, OperatorRef};
use crate::context::ExecutionContext;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use cinder_core::schema::RowTypeRef;
use cinder_core::{Row, RowRef};
use core::cmp::Ordering;
use core::fmt;
use tracing::debug;

/// A condition evaluated against one row.
pub trait RowPredicate: Send + Sync + fmt::Debug {
    /// Returns true if `row` passes.
    fn eval(&self, row: &dyn Row, bindings: &Bindings) -> ExecutionResult<bool>;

    /// Text shown for this predicate in plan descriptions.
    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Compares one column of the row to an operand. A NULL on either side never
/// matches.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnPredicate {
    pub column: usize,
    pub op: CompareOp,
    pub operand: Operand,
}

impl ColumnPredicate {
    /// Creates a new column predicate.
    pub fn new(column: usize, op: CompareOp, operand: impl Into<Operand>) -> Self {
        Self {
            column,
            op,
            operand: operand.into(),
        }
    }
}

impl RowPredicate for ColumnPredicate {
    fn eval(&self, row: &dyn Row, bindings: &Bindings) -> ExecutionResult<bool> {
        let value = match row.value(self.column) {
            Some(value) => value,
            None => return Ok(false),
        };
        let operand = self.operand.resolve(bindings)?;
        if value.is_null() || operand.is_null() {
            return Ok(false);
        }
        Ok(self.op.matches(value.cmp(operand)))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColumnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.column, self.op.symbol(), self.operand)
    }
}

/// Adapts a closure into a [`RowPredicate`].
pub struct PredicateFn<F>(pub F);

impl<F> RowPredicate for PredicateFn<F>
where
    F: Fn(&dyn Row, &Bindings) -> ExecutionResult<bool> + Send + Sync,
{
    fn eval(&self, row: &dyn Row, bindings: &Bindings) -> ExecutionResult<bool> {
        (self.0)(row, bindings)
    }
}

impl<F> fmt::Debug for PredicateFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateFn")
    }
}

/// Passes through the input rows that satisfy a predicate, unchanged and in
/// input order.
#[derive(Debug)]
pub struct Filter {
    input: OperatorRef,
    predicate: Arc<dyn RowPredicate>,
}

impl Filter {
    /// Creates a new filter.
    pub fn new(input: OperatorRef, predicate: Arc<dyn RowPredicate>) -> Self {
        Self { input, predicate }
    }

    /// Creates a filter from a closure.
    pub fn with_fn<F>(input: OperatorRef, predicate: F) -> Self
    where
        F: Fn(&dyn Row, &Bindings) -> ExecutionResult<bool> + Send + Sync + 'static,
    {
        Self::new(input, Arc::new(PredicateFn(predicate)))
    }
}

impl Operator for Filter {
    fn name(&self) -> &'static str {
        "Filter"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        self.input.output_row_type()
    }

    fn children(&self) -> Vec<&OperatorRef> {
        vec![&self.input]
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(FilterCursor {
            predicate: self.predicate.as_ref(),
            input: self.input.cursor(ctx),
            bindings: None,
        })
    }

    fn describe_plan(&self) -> String {
        describe_unary(&self.input, format_args!("Filter({})", self.predicate.describe()))
    }
}

struct FilterCursor<'a> {
    predicate: &'a dyn RowPredicate,
    input: BoxedCursor<'a>,
    bindings: Option<Rc<Bindings>>,
}

impl FilterCursor<'_> {
    fn pull(&mut self, bindings: &Bindings) -> ExecutionResult<Option<RowRef>> {
        while let Some(row) = self.input.next()? {
            if self.predicate.eval(&*row, bindings)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

impl Cursor for FilterCursor<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.close();
        self.input.open(bindings)?;
        self.bindings = Some(Rc::clone(bindings));
        debug!(operator = "Filter", "cursor opened");
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        let bindings = self
            .bindings
            .clone()
            .ok_or_else(|| ExecutionError::not_open("Filter"))?;
        let result = self.pull(&bindings);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn close(&mut self) {
        if self.bindings.take().is_some() {
            debug!(operator = "Filter", "cursor closed");
        }
        self.input.close();
    }

    fn is_open(&self) -> bool {
        self.bindings.is_some()
    }
}

/// Convenience constructor for a filter over a single column comparison.
pub fn column_filter(input: OperatorRef, column: usize, op: CompareOp, operand: impl Into<Operand>) -> Filter {
    Filter::new(input, Arc::new(ColumnPredicate::new(column, op, operand)))
}
