//! Table and index scan operators.
//!
//! All three leaves wrap a storage [`RecordStream`] and copy each record into
//! a pooled [`ValuesRow`]. The pooled row is overwritten in place when the
//! consumer has dropped the previous one.

use super::bindings::{Bindings, Operand};
use super::error::{ExecutionError, ExecutionResult};
use super::operator::{BoxedCursor, Cursor, Operator, OperatorRef};
use super::store::{KeyRange, RecordStream, StoreAdapter};
use crate::context::ExecutionContext;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use cinder_core::schema::RowTypeRef;
use cinder_core::{RowRef, SharedRowSlot, ValuesRow};
use tracing::{debug, trace, warn};

/// Full table scan in storage order.
#[derive(Debug)]
pub struct TableScan {
    table: String,
    row_type: RowTypeRef,
}

impl TableScan {
    /// Creates a scan of `table`, whose records have shape `row_type`.
    pub fn new(table: impl Into<String>, row_type: RowTypeRef) -> Self {
        Self {
            table: table.into(),
            row_type,
        }
    }

    /// Returns the scanned table.
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Operator for TableScan {
    fn name(&self) -> &'static str {
        "TableScan"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn children(&self) -> Vec<&OperatorRef> {
        Vec::new()
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(LeafCursor::new(self.name(), &self.row_type, Access::Table(&self.table), ctx))
    }

    fn describe_plan(&self) -> String {
        format!("TableScan({})", self.table)
    }
}

/// Ordered scan of the records whose index key lies in a fixed range.
#[derive(Debug)]
pub struct IndexScan {
    table: String,
    index: String,
    range: KeyRange,
    row_type: RowTypeRef,
}

impl IndexScan {
    /// Creates an index range scan.
    pub fn new(table: impl Into<String>, index: impl Into<String>, range: KeyRange, row_type: RowTypeRef) -> Self {
        Self {
            table: table.into(),
            index: index.into(),
            range,
            row_type,
        }
    }
}

impl Operator for IndexScan {
    fn name(&self) -> &'static str {
        "IndexScan"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn children(&self) -> Vec<&OperatorRef> {
        Vec::new()
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        let access = Access::Range {
            table: &self.table,
            index: &self.index,
            range: &self.range,
        };
        Box::new(LeafCursor::new(self.name(), &self.row_type, access, ctx))
    }

    fn describe_plan(&self) -> String {
        format!("IndexScan({}.{} {})", self.table, self.index, self.range)
    }
}

/// Index point lookup.
///
/// The key is either fixed or read from the bindings at open time, so a
/// lookup under a correlated join re-executes against each outer row.
#[derive(Debug)]
pub struct IndexLookup {
    table: String,
    index: String,
    key: Operand,
    row_type: RowTypeRef,
}

impl IndexLookup {
    /// Creates an index point lookup.
    pub fn new(table: impl Into<String>, index: impl Into<String>, key: Operand, row_type: RowTypeRef) -> Self {
        Self {
            table: table.into(),
            index: index.into(),
            key,
            row_type,
        }
    }
}

impl Operator for IndexLookup {
    fn name(&self) -> &'static str {
        "IndexLookup"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn children(&self) -> Vec<&OperatorRef> {
        Vec::new()
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        let access = Access::Lookup {
            table: &self.table,
            index: &self.index,
            key: &self.key,
        };
        Box::new(LeafCursor::new(self.name(), &self.row_type, access, ctx))
    }

    fn describe_plan(&self) -> String {
        format!("IndexLookup({}.{} = {})", self.table, self.index, self.key)
    }
}

#[derive(Clone, Copy)]
enum Access<'a> {
    Table(&'a str),
    Range {
        table: &'a str,
        index: &'a str,
        range: &'a KeyRange,
    },
    Lookup {
        table: &'a str,
        index: &'a str,
        key: &'a Operand,
    },
}

impl<'a> Access<'a> {
    fn open(self, adapter: &'a dyn StoreAdapter, bindings: &Bindings) -> ExecutionResult<Box<dyn RecordStream + 'a>> {
        let stream = match self {
            Access::Table(table) => adapter.scan(table)?,
            Access::Range { table, index, range } => adapter.seek(table, index, range)?,
            Access::Lookup { table, index, key } => adapter.fetch(table, index, key.resolve(bindings)?)?,
        };
        Ok(stream)
    }
}

struct LeafCursor<'a> {
    operator: &'static str,
    row_type: &'a RowTypeRef,
    access: Access<'a>,
    ctx: ExecutionContext<'a>,
    stream: Option<Box<dyn RecordStream + 'a>>,
    slot: SharedRowSlot<ValuesRow>,
}

impl<'a> LeafCursor<'a> {
    fn new(operator: &'static str, row_type: &'a RowTypeRef, access: Access<'a>, ctx: ExecutionContext<'a>) -> Self {
        Self {
            operator,
            row_type,
            access,
            ctx,
            stream: None,
            slot: SharedRowSlot::new().with_reuse(ctx.config().row_reuse),
        }
    }

    fn pull(&mut self) -> ExecutionResult<Option<RowRef>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ExecutionError::not_open(self.operator))?;
        let record = match stream.next_record()? {
            Some(record) => record,
            None => return Ok(None),
        };
        if let Err(e) = self.row_type.check_values(&record.values) {
            return Err(ExecutionError::invariant(
                self.operator,
                format!("record {} is not a row of {}: {}", record.key, self.row_type, e),
            ));
        }
        if self.ctx.config().trace_rows {
            trace!(operator = self.operator, key = %record.key, "row");
        }
        let row_type = self.row_type;
        let row: RowRef = self.slot.produce(
            || ValuesRow::empty(row_type.clone()),
            |row| {
                row.set_values(&record.values);
                row.set_hkey(Some(&record.key));
            },
        );
        Ok(Some(row))
    }
}

impl Cursor for LeafCursor<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.close();
        let stream = self.access.open(self.ctx.adapter(), bindings)?;
        self.stream = Some(stream);
        debug!(operator = self.operator, row_type = %self.row_type, "cursor opened");
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        if self.stream.is_none() {
            return Err(ExecutionError::not_open(self.operator));
        }
        match self.pull() {
            Ok(row) => Ok(row),
            Err(e) => {
                warn!(operator = self.operator, error = %e, "scan aborted");
                self.close();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!(operator = self.operator, "cursor closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}
