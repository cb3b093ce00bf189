//! Row types: the ordered column shape a producer emits.
//!
//! Row types are immutable once built and are always allocated through a
//! [`Schema`], which gives each one a unique id. Operators hold them through
//! [`RowTypeRef`] handles.

use super::{Column, Schema};
use crate::error::{Error, Result};
use crate::types::{DataType, TypeList};
use crate::value::Value;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

/// Identifier of a row type, unique within its schema.
pub type RowTypeId = u32;

/// Shared handle to an immutable row type.
pub type RowTypeRef = Arc<RowType>;

/// The shape of a row: an ordered list of typed columns.
#[derive(Debug)]
pub struct RowType {
    id: RowTypeId,
    name: String,
    columns: Vec<Column>,
    types: Vec<DataType>,
}

impl RowType {
    pub(crate) fn new(id: RowTypeId, name: String, columns: Vec<Column>) -> Self {
        let types = columns.iter().map(Column::data_type).collect();
        Self {
            id,
            name,
            columns,
            types,
        }
    }

    /// Returns the row type id.
    #[inline]
    pub fn id(&self) -> RowTypeId {
        self.id
    }

    /// Returns the name (table name, or `values` for derived shapes).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of columns.
    #[inline]
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Gets the column at the given position.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Gets the declared type at the given position.
    pub fn type_at(&self, index: usize) -> Option<DataType> {
        self.types.get(index).copied()
    }

    /// Returns the per-column type vector.
    #[inline]
    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    /// Returns the per-column type vector as a displayable list.
    pub fn type_list(&self) -> TypeList {
        TypeList::from(self.types.as_slice())
    }

    /// Returns the position of the first column with the given name.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Checks that `values` could be a row of this type.
    ///
    /// A wrong arity is a [`Error::ShapeMismatch`]; a value its column's type
    /// does not accept is a [`Error::TypeMismatch`] for the first such column.
    pub fn check_values(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.types.len() {
            let value_types: Vec<DataType> = values.iter().map(Value::data_type).collect();
            return Err(Error::shape_mismatch(
                self.to_string(),
                &self.types,
                "values",
                &value_types,
            ));
        }
        match self.types.iter().zip(values).find(|(ty, value)| !ty.accepts(value)) {
            Some((&expected, value)) => Err(Error::type_mismatch(expected, value.data_type())),
            None => Ok(()),
        }
    }

    /// Merges two row types of equal arity column by column.
    ///
    /// Equal declared types are kept; the untyped-NULL marker takes the other
    /// side's type; anything else is a [`Error::ShapeMismatch`] that carries
    /// both row types and their full column type vectors. Column names come
    /// from the left side and a column is nullable if either side is.
    pub fn unify(schema: &Schema, left: &RowType, right: &RowType) -> Result<RowTypeRef> {
        if left.arity() != right.arity() {
            return Err(left.not_same_shape(right));
        }
        let mut columns = Vec::with_capacity(left.arity());
        for (l, r) in left.columns.iter().zip(&right.columns) {
            let data_type = match (l.data_type(), r.data_type()) {
                (a, b) if a == b => a,
                (DataType::Null, b) => b,
                (a, DataType::Null) => a,
                _ => return Err(left.not_same_shape(right)),
            };
            let nullable = l.is_nullable() || r.is_nullable();
            columns.push(Column::new(l.name(), data_type).nullable(nullable));
        }
        Ok(schema.values_type(columns))
    }

    /// Builds the row type of a projection onto the given column positions.
    pub fn project(schema: &Schema, source: &RowType, indices: &[usize]) -> Result<RowTypeRef> {
        let columns = indices
            .iter()
            .map(|&index| {
                source
                    .column(index)
                    .cloned()
                    .ok_or_else(|| Error::column_out_of_range(source.to_string(), index, source.arity()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(schema.values_type(columns))
    }

    /// Builds the row type of `left` columns followed by `right` columns.
    ///
    /// When `right_nullable` is set every right-side column becomes nullable,
    /// as in the output of an outer join.
    pub fn concat(schema: &Schema, left: &RowType, right: &RowType, right_nullable: bool) -> RowTypeRef {
        let mut columns = Vec::with_capacity(left.arity() + right.arity());
        columns.extend(left.columns.iter().cloned());
        columns.extend(right.columns.iter().map(|c| {
            let nullable = c.is_nullable() || right_nullable;
            c.clone().nullable(nullable)
        }));
        schema.values_type(columns)
    }

    fn not_same_shape(&self, other: &RowType) -> Error {
        Error::shape_mismatch(self.to_string(), &self.types, other.to_string(), &other.types)
    }
}

impl PartialEq for RowType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.types == other.types
    }
}

impl Eq for RowType {}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}
