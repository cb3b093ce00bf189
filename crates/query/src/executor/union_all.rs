//! Ordered concatenation of two or more inputs.
//!
//! The output row type is the column-by-column unification of every input's
//! row type, computed once when the operator is built. Input rows are not
//! copied: each one is wrapped in a [`MasqueradingRow`] that reports the
//! unified type and delegates everything else to the input row.
//!
//! Inputs are opened lazily, one at a time, left to right. An input that is
//! exhausted is closed before the next one is opened; an input that yields
//! nothing is still opened and closed exactly once. After the last input the
//! cursor closes itself.

use super::bindings::Bindings;
use super::error::{ExecutionError, ExecutionResult};
use super::operator::{BoxedCursor, Cursor, Operator, OperatorRef};
use crate::context::ExecutionContext;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use cinder_core::schema::{RowType, RowTypeRef, Schema};
use cinder_core::{Error, HKey, Result, Row, RowRef, SharedRowSlot, Value};
use core::fmt;
use tracing::{debug, warn};

/// A row that reports a fixed row type while delegating value access, key
/// access and ancestry checks to an underlying row.
#[derive(Clone)]
pub struct MasqueradingRow {
    row_type: RowTypeRef,
    delegate: Option<RowRef>,
}

impl MasqueradingRow {
    /// Creates a wrapper reporting `row_type`, with no delegate yet.
    pub fn new(row_type: RowTypeRef) -> Self {
        Self {
            row_type,
            delegate: None,
        }
    }

    /// Returns the wrapped row.
    pub fn delegate(&self) -> Option<&RowRef> {
        self.delegate.as_ref()
    }

    /// Replaces the wrapped row. The previous delegate is released.
    pub fn set_delegate(&mut self, row: RowRef) {
        self.delegate = Some(row);
    }

    /// Releases the wrapped row.
    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }
}

impl Row for MasqueradingRow {
    fn row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn values(&self) -> &[Value] {
        match &self.delegate {
            Some(row) => row.values(),
            None => &[],
        }
    }

    fn hkey(&self) -> Option<&HKey> {
        self.delegate.as_ref().and_then(|row| row.hkey())
    }

    fn ancestor_of(&self, other: &dyn Row) -> bool {
        self.delegate
            .as_ref()
            .is_some_and(|row| row.ancestor_of(other))
    }
}

impl fmt::Debug for MasqueradingRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasqueradingRow")
            .field("row_type", &format_args!("{}", self.row_type))
            .field("delegate", &self.delegate)
            .finish()
    }
}

/// Concatenates the rows of its inputs, in input order.
#[derive(Debug)]
pub struct UnionAll {
    inputs: Vec<OperatorRef>,
    /// Declared row type of each input, in input order.
    input_types: Vec<RowTypeRef>,
    row_type: RowTypeRef,
}

impl UnionAll {
    /// Creates a union of `inputs`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the input row types cannot be
    /// unified, and with [`Error::InvalidPlan`] if fewer than two inputs are
    /// given.
    pub fn new(schema: &Schema, inputs: Vec<OperatorRef>) -> Result<Self> {
        if inputs.len() < 2 {
            return Err(Error::invalid_plan(format!(
                "UNION ALL needs at least two inputs, got {}",
                inputs.len()
            )));
        }
        let input_types: Vec<RowTypeRef> = inputs
            .iter()
            .map(|input| input.output_row_type().clone())
            .collect();
        let mut row_type = RowType::unify(schema, &input_types[0], &input_types[1])?;
        for input_type in &input_types[2..] {
            row_type = RowType::unify(schema, &row_type, input_type)?;
        }
        Ok(Self {
            inputs,
            input_types,
            row_type,
        })
    }

    /// Returns the inputs.
    pub fn inputs(&self) -> &[OperatorRef] {
        &self.inputs
    }
}

impl Operator for UnionAll {
    fn name(&self) -> &'static str {
        "UnionAll"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn children(&self) -> Vec<&OperatorRef> {
        self.inputs.iter().collect()
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(UnionAllCursor {
            op: self,
            inputs: self.inputs.iter().map(|input| input.cursor(ctx)).collect(),
            active: None,
            next_input: 0,
            bindings: None,
            slot: SharedRowSlot::new().with_reuse(ctx.config().row_reuse),
        })
    }

    fn describe_plan(&self) -> String {
        let mut plan = String::new();
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                plan.push_str("\nUNION ALL\n");
            }
            plan.push_str(&input.describe_plan());
        }
        plan
    }
}

struct UnionAllCursor<'a> {
    op: &'a UnionAll,
    inputs: Vec<BoxedCursor<'a>>,
    /// Position of the open input, if any.
    active: Option<usize>,
    /// Position of the next input to open.
    next_input: usize,
    /// `Some` while open.
    bindings: Option<Rc<Bindings>>,
    slot: SharedRowSlot<MasqueradingRow>,
}

impl UnionAllCursor<'_> {
    fn pull(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<Option<RowRef>> {
        loop {
            let index = match self.active {
                Some(index) => index,
                None => {
                    let index = self.next_input;
                    if index >= self.inputs.len() {
                        self.close();
                        return Ok(None);
                    }
                    self.next_input += 1;
                    self.active = Some(index);
                    self.inputs[index].open(bindings)?;
                    debug!(operator = "UnionAll", input = index, "switched to next input");
                    index
                }
            };

            // Let go of the previous input row so the input can recycle it.
            if let Some(wrapper) = self.slot.get_mut_if_unique() {
                wrapper.clear_delegate();
            }

            match self.inputs[index].next()? {
                Some(row) => return self.wrap(index, row).map(Some),
                None => {
                    self.inputs[index].close();
                    self.active = None;
                }
            }
        }
    }

    fn wrap(&mut self, index: usize, row: RowRef) -> ExecutionResult<RowRef> {
        let expected = &self.op.input_types[index];
        if row.row_type().id() != expected.id() {
            return Err(ExecutionError::invariant(
                "UnionAll",
                format!(
                    "input {} produced a row of type {}, declared {}",
                    index,
                    row.row_type(),
                    expected
                ),
            ));
        }
        let row_type = &self.op.row_type;
        let wrapper: RowRef = self
            .slot
            .produce(|| MasqueradingRow::new(row_type.clone()), |w| w.set_delegate(row));
        Ok(wrapper)
    }
}

impl Cursor for UnionAllCursor<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.close();
        self.next_input = 0;
        self.bindings = Some(Rc::clone(bindings));
        debug!(operator = "UnionAll", inputs = self.inputs.len(), "cursor opened");
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        let bindings = self
            .bindings
            .clone()
            .ok_or_else(|| ExecutionError::not_open("UnionAll"))?;
        let result = self.pull(&bindings);
        if let Err(e) = &result {
            warn!(operator = "UnionAll", input = ?self.active, error = %e, "iteration aborted");
            self.close();
        }
        result
    }

    fn close(&mut self) {
        if let Some(index) = self.active.take() {
            self.inputs[index].close();
        }
        if let Some(wrapper) = self.slot.get_mut_if_unique() {
            wrapper.clear_delegate();
        }
        if self.bindings.take().is_some() {
            debug!(operator = "UnionAll", "cursor closed");
        }
    }

    fn is_open(&self) -> bool {
        self.bindings.is_some()
    }
}
