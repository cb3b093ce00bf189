//! Schema module for Cinder.
//!
//! This module contains row shape definitions: columns, row types and the
//! schema that allocates them.

mod catalog;
mod column;
mod row_type;

pub use catalog::Schema;
pub use column::Column;
pub use row_type::{RowType, RowTypeId, RowTypeRef};
