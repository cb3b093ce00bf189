//! Query executor module.
//!
//! Operators form an immutable tree; every execution builds a parallel tree
//! of cursors and pulls rows from its root one at a time.

mod bindings;
mod error;
mod execution;
mod filter;
pub mod join;
mod limit;
mod operator;
mod project;
mod scan;
pub mod store;
mod union_all;

pub use bindings::{Bindings, Operand};
pub use error::{ExecutionError, ExecutionResult, StorageError, StorageResult, UsageError};
pub use execution::Execution;
pub use filter::{column_filter, ColumnPredicate, CompareOp, Filter, PredicateFn, RowPredicate};
pub use join::{JoinType, NestedLoopJoin};
pub use limit::Limit;
pub use operator::{BoxedCursor, Cursor, Operator, OperatorRef};
pub use project::Project;
pub use scan::{IndexLookup, IndexScan, TableScan};
pub use store::{InMemoryAdapter, KeyRange, RecordStream, StoreAdapter, StoredRecord};
pub use union_all::{MasqueradingRow, UnionAll};
