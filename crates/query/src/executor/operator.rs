//! Operator and cursor traits for query execution.
//!
//! An [`Operator`] is an immutable node of a physical plan. It can be shared
//! between threads and executed any number of times; each execution asks it
//! for a fresh [`Cursor`], which is the mutable, single-threaded iteration
//! state. Cursors move through two states:
//!
//! ```text
//!   Closed --open--> Open --close--> Closed
//!                     |  ^
//!                     +--+ open (resets)
//! ```
//!
//! `next` is only valid while open. `close` is valid in any state and never
//! fails.

use super::bindings::Bindings;
use super::error::ExecutionResult;
use crate::context::ExecutionContext;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use cinder_core::schema::RowTypeRef;
use cinder_core::RowRef;
use core::fmt;

/// Shared handle to an operator.
pub type OperatorRef = Arc<dyn Operator>;

/// A cursor borrowed from the operator tree that created it.
pub type BoxedCursor<'a> = Box<dyn Cursor + 'a>;

/// A node of a physical plan.
pub trait Operator: Send + Sync + fmt::Debug {
    /// Short operator name used in errors and log events.
    fn name(&self) -> &'static str;

    /// The row type of every row this operator's cursors produce.
    fn output_row_type(&self) -> &RowTypeRef;

    /// Direct inputs, for plan traversal and printing.
    fn children(&self) -> Vec<&OperatorRef>;

    /// Creates an unopened cursor, creating the children's cursors on the way.
    /// Performs no I/O and produces no rows.
    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a>;

    /// Renders the operator tree rooted here, one operator per line.
    fn describe_plan(&self) -> String;
}

/// Iteration state of one execution of an operator.
pub trait Cursor {
    /// Starts (or restarts) iteration with the given bindings. Any iteration
    /// state from a previous open is discarded and active children are closed
    /// first.
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()>;

    /// Returns the next row, or `None` at end of stream.
    fn next(&mut self) -> ExecutionResult<Option<RowRef>>;

    /// Stops iteration and releases children and storage streams.
    fn close(&mut self);

    /// Returns true between a successful `open` and the next `close`.
    fn is_open(&self) -> bool;
}

/// Renders a single-input operator: the input's plan, then this operator's line.
pub(crate) fn describe_unary(input: &OperatorRef, line: fmt::Arguments<'_>) -> String {
    format!("{}\n{}", input.describe_plan(), line)
}
