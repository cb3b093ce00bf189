//! Data type definitions for Cinder.
//!
//! This module defines the column types a row type can declare.

use crate::value::Value;
use alloc::vec::Vec;
use core::fmt;

/// Column data types.
///
/// `Null` is the untyped-NULL marker: the declared type of a column that only
/// ever produces NULL (e.g. a bare `NULL` literal in a select list). It unifies
/// with every other type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Untyped NULL
    Null,
    /// Boolean type (true/false)
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
    /// Binary data
    Bytes,
}

impl DataType {
    /// Returns the short name used in plan descriptions and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "NULL",
            DataType::Boolean => "BOOL",
            DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::Float64 => "DOUBLE",
            DataType::String => "VARCHAR",
            DataType::DateTime => "DATETIME",
            DataType::Bytes => "VARBINARY",
        }
    }

    /// Returns true if this is the untyped-NULL marker.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, DataType::Null)
    }

    /// Returns whether this type is nullable by default.
    pub fn is_nullable_by_default(&self) -> bool {
        matches!(self, DataType::Null | DataType::Bytes)
    }

    /// Returns true if a value can be stored in a column of this type.
    ///
    /// NULL is accepted by every type; only NULL is accepted by `Null`.
    pub fn accepts(&self, value: &Value) -> bool {
        match value.data_type() {
            DataType::Null => true,
            other => other == *self,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered list of column types, rendered as `[BIGINT, NULL, ...]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeList(pub Vec<DataType>);

impl TypeList {
    /// Returns the types as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[DataType] {
        &self.0
    }
}

impl From<&[DataType]> for TypeList {
    fn from(types: &[DataType]) -> Self {
        Self(types.to_vec())
    }
}

impl fmt::Display for TypeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
        }
        f.write_str("]")
    }
}
