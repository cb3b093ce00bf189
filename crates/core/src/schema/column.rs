//! Column definition for Cinder row types.

use crate::types::DataType;
use alloc::string::String;

/// A column of a row type.
#[derive(Clone, Debug)]
pub struct Column {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
    /// Whether this column allows null values.
    nullable: bool,
}

impl Column {
    /// Creates a new column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: data_type.is_nullable_by_default(),
        }
    }

    /// Sets whether this column is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns whether this column is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data_type == other.data_type
    }
}
