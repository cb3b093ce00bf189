//! Limit operator.

use super::bindings::Bindings;
use super::error::{ExecutionError, ExecutionResult};
use super::operator::{describe_unary, BoxedCursor, Cursor, Operator, OperatorRef};
use crate::context::ExecutionContext;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use cinder_core::schema::RowTypeRef;
use cinder_core::RowRef;
use tracing::debug;

/// Skips `offset` input rows, then passes through at most `limit` rows.
///
/// The input is closed as soon as the limit is reached, so upstream
/// operators stop pulling from storage early.
#[derive(Debug)]
pub struct Limit {
    input: OperatorRef,
    limit: usize,
    offset: usize,
}

impl Limit {
    /// Creates a new limit.
    pub fn new(input: OperatorRef, limit: usize, offset: usize) -> Self {
        Self { input, limit, offset }
    }

    /// Creates a limit with only a limit (no offset).
    pub fn limit_only(input: OperatorRef, limit: usize) -> Self {
        Self::new(input, limit, 0)
    }
}

impl Operator for Limit {
    fn name(&self) -> &'static str {
        "Limit"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        self.input.output_row_type()
    }

    fn children(&self) -> Vec<&OperatorRef> {
        vec![&self.input]
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(LimitCursor {
            limit: self.limit,
            offset: self.offset,
            input: self.input.cursor(ctx),
            state: None,
        })
    }

    fn describe_plan(&self) -> String {
        describe_unary(
            &self.input,
            format_args!("Limit(limit={}, offset={})", self.limit, self.offset),
        )
    }
}

#[derive(Clone, Copy)]
struct Progress {
    skipped: usize,
    returned: usize,
    /// Set once the input is exhausted or the limit is reached; the input is
    /// closed at that point and never pulled again.
    done: bool,
}

struct LimitCursor<'a> {
    limit: usize,
    offset: usize,
    input: BoxedCursor<'a>,
    /// `Some` while open.
    state: Option<Progress>,
}

impl LimitCursor<'_> {
    fn pull(&mut self, progress: &mut Progress) -> ExecutionResult<Option<RowRef>> {
        if progress.done {
            return Ok(None);
        }
        if progress.returned >= self.limit {
            return Ok(self.finish(progress));
        }
        while progress.skipped < self.offset {
            if self.input.next()?.is_none() {
                return Ok(self.finish(progress));
            }
            progress.skipped += 1;
        }
        match self.input.next()? {
            Some(row) => {
                progress.returned += 1;
                Ok(Some(row))
            }
            None => Ok(self.finish(progress)),
        }
    }

    fn finish(&mut self, progress: &mut Progress) -> Option<RowRef> {
        progress.done = true;
        self.input.close();
        None
    }
}

impl Cursor for LimitCursor<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.close();
        self.input.open(bindings)?;
        self.state = Some(Progress {
            skipped: 0,
            returned: 0,
            done: false,
        });
        debug!(operator = "Limit", "cursor opened");
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        let mut progress = self.state.ok_or_else(|| ExecutionError::not_open("Limit"))?;
        match self.pull(&mut progress) {
            Ok(row) => {
                self.state = Some(progress);
                Ok(row)
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            debug!(operator = "Limit", "cursor closed");
        }
        self.input.close();
    }

    fn is_open(&self) -> bool {
        self.state.is_some()
    }
}
