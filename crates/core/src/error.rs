//! Error types for Cinder core.
//!
//! These errors describe row shapes and schema definitions that cannot be
//! executed. Most surface while a plan is being assembled; a value that does
//! not conform to its row type is found while rows are read.

use crate::types::{DataType, TypeList};
use alloc::string::String;
use thiserror::Error;

/// Result type alias for Cinder core operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Schema and plan-assembly errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two row types cannot be unified column by column.
    #[error("row types not of same shape: {left} ({left_types}), {right} ({right_types})")]
    ShapeMismatch {
        left: String,
        left_types: TypeList,
        right: String,
        right_types: TypeList,
    },
    /// A value whose type its column does not accept.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: DataType, got: DataType },
    /// Invalid schema definition.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
    /// Column position outside a row type.
    #[error("column {index} out of range for {row_type} (arity {arity})")]
    ColumnOutOfRange {
        row_type: String,
        index: usize,
        arity: usize,
    },
    /// A plan that cannot be turned into operators.
    #[error("invalid plan: {message}")]
    InvalidPlan { message: String },
}

impl Error {
    /// Creates a shape mismatch error from both sides' names and column types.
    pub fn shape_mismatch(
        left: impl Into<String>,
        left_types: &[DataType],
        right: impl Into<String>,
        right_types: &[DataType],
    ) -> Self {
        Error::ShapeMismatch {
            left: left.into(),
            left_types: left_types.into(),
            right: right.into(),
            right_types: right_types.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch { expected, got }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a column out of range error.
    pub fn column_out_of_range(row_type: impl Into<String>, index: usize, arity: usize) -> Self {
        Error::ColumnOutOfRange {
            row_type: row_type.into(),
            index,
            arity,
        }
    }

    /// Creates an invalid plan error.
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Error::InvalidPlan {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::type_mismatch(DataType::Int32, DataType::String);
        assert_eq!(err.to_string(), "type mismatch: expected INT, got VARCHAR");

        let err = Error::invalid_schema("duplicate column id");
        assert!(err.to_string().contains("duplicate column id"));

        let err = Error::column_out_of_range("orders#3", 5, 2);
        assert_eq!(err.to_string(), "column 5 out of range for orders#3 (arity 2)");
    }

    #[test]
    fn test_shape_mismatch_carries_both_type_vectors() {
        let err = Error::shape_mismatch(
            "a#1",
            &[DataType::Int64, DataType::String],
            "b#2",
            &[DataType::Int64],
        );
        assert_eq!(
            err.to_string(),
            "row types not of same shape: a#1 ([BIGINT, VARCHAR]), b#2 ([BIGINT])"
        );
        match err {
            Error::ShapeMismatch {
                left_types,
                right_types,
                ..
            } => {
                assert_eq!(left_types.as_slice().len(), 2);
                assert_eq!(right_types.as_slice(), &[DataType::Int64]);
            }
            _ => panic!("Wrong error type"),
        }
    }
}
