//! Row type allocation.

use super::{Column, RowType, RowTypeId, RowTypeRef};
use crate::error::{Error, Result};
use crate::types::DataType;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

/// Allocates row types with ids unique to this schema.
///
/// A schema is shared by every operator of a plan (and usually by every plan
/// of a database); it is passed explicitly rather than reached through global
/// state, so two schemas never share an id sequence.
#[derive(Debug, Default)]
pub struct Schema {
    next_id: AtomicU32,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(0),
        }
    }

    /// Creates the row type of a stored table.
    ///
    /// Column names must be non-empty and unique.
    pub fn table_type(&self, name: impl Into<String>, columns: Vec<Column>) -> Result<RowTypeRef> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_schema("table name must not be empty"));
        }
        for (i, column) in columns.iter().enumerate() {
            if column.name().is_empty() {
                return Err(Error::invalid_schema(format!(
                    "column {} of {} has an empty name",
                    i, name
                )));
            }
            if columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(Error::invalid_schema(format!(
                    "duplicate column {} in {}",
                    column.name(),
                    name
                )));
            }
        }
        Ok(self.allocate(name, columns))
    }

    /// Creates an anonymous row type for derived rows (projections, unions, joins).
    pub fn values_type(&self, columns: Vec<Column>) -> RowTypeRef {
        self.allocate(String::from("values"), columns)
    }

    /// Creates an anonymous row type from bare column types; columns are named
    /// `c0`, `c1`, ...
    pub fn values_type_of(&self, types: &[DataType]) -> RowTypeRef {
        let columns = types
            .iter()
            .enumerate()
            .map(|(i, &ty)| Column::new(format!("c{}", i), ty))
            .collect();
        self.values_type(columns)
    }

    fn allocate(&self, name: String, columns: Vec<Column>) -> RowTypeRef {
        Arc::new(RowType::new(self.next_id(), name, columns))
    }

    fn next_id(&self) -> RowTypeId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}
