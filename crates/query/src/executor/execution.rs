//! Driving a cursor tree to completion.

use super::bindings::Bindings;
use super::error::ExecutionResult;
use super::operator::{BoxedCursor, Operator};
use crate::context::ExecutionContext;
use alloc::rc::Rc;
use alloc::vec::Vec;
use cinder_core::{RowRef, Value};
use tracing::debug;

/// One execution of an operator tree, consumed as an iterator of rows.
///
/// The root cursor is closed when the rows run out, when an error is
/// returned, and when the execution is dropped early.
pub struct Execution<'a> {
    cursor: BoxedCursor<'a>,
    finished: bool,
}

impl<'a> Execution<'a> {
    /// Creates the cursor tree for `operator` and opens it with `bindings`.
    pub fn run(
        operator: &'a dyn Operator,
        ctx: ExecutionContext<'a>,
        bindings: Bindings,
    ) -> ExecutionResult<Self> {
        debug!(operator = operator.name(), row_type = %operator.output_row_type(), "execution started");
        let mut cursor = operator.cursor(ctx);
        cursor.open(&Rc::new(bindings))?;
        Ok(Self {
            cursor,
            finished: false,
        })
    }

    /// Collects the values of every remaining row.
    pub fn collect_values(self) -> ExecutionResult<Vec<Vec<Value>>> {
        self.map(|row| row.map(|row| row.values().to_vec())).collect()
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.cursor.close();
        }
    }
}

impl Iterator for Execution<'_> {
    type Item = ExecutionResult<RowRef>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.cursor.next() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl Drop for Execution<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
