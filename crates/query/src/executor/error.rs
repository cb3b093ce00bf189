//! Execution errors.

use alloc::string::String;
use thiserror::Error;

/// Result type for cursor and storage operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Result type for storage adapter calls.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised while a plan is executing.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExecutionError {
    /// The caller broke the cursor protocol.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// A plan-assembly error surfaced during execution setup.
    #[error(transparent)]
    Plan(#[from] cinder_core::Error),

    /// An internal contract between operators was broken. Never recoverable.
    #[error("{operator}: invariant violated: {message}")]
    Invariant {
        operator: &'static str,
        message: String,
    },

    /// The storage layer failed. Propagated unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ExecutionError {
    /// Creates an invariant violation error.
    pub fn invariant(operator: &'static str, message: impl Into<String>) -> Self {
        ExecutionError::Invariant {
            operator,
            message: message.into(),
        }
    }

    /// Creates a not-open usage error.
    pub fn not_open(operator: &'static str) -> Self {
        ExecutionError::Usage(UsageError::NotOpen { operator })
    }

    /// Returns true for errors caused by the caller rather than the plan or storage.
    pub fn is_usage(&self) -> bool {
        matches!(self, ExecutionError::Usage(_))
    }
}

/// Misuse of the cursor protocol.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    /// `next` was called on a cursor that was never opened, or was closed.
    #[error("{operator} cursor is not open")]
    NotOpen { operator: &'static str },

    /// A bindings position was read before anything was bound to it.
    #[error("no value bound at position {position}")]
    Unbound { position: usize },

    /// A value was bound at a position no bindings vector can hold.
    #[error("binding position {position} out of range")]
    BindingOutOfRange { position: usize },
}

/// Error reported by a store adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("table not found: {table}")]
    TableNotFound { table: String },

    #[error("index {index} not found on table {table}")]
    IndexNotFound { table: String, index: String },

    #[error("storage I/O error: {message}")]
    Io { message: String },

    #[error("storage operation timed out: {operation}")]
    Timeout { operation: String },
}

impl StorageError {
    pub fn table_not_found(table: impl Into<String>) -> Self {
        StorageError::TableNotFound { table: table.into() }
    }

    pub fn index_not_found(table: impl Into<String>, index: impl Into<String>) -> Self {
        StorageError::IndexNotFound {
            table: table.into(),
            index: index.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        StorageError::Io {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        StorageError::Timeout {
            operation: operation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ExecutionError::not_open("UnionAll").to_string(),
            "UnionAll cursor is not open"
        );
        assert_eq!(
            ExecutionError::invariant("UnionAll", "bad row").to_string(),
            "UnionAll: invariant violated: bad row"
        );
        assert_eq!(
            ExecutionError::from(StorageError::index_not_found("t", "idx")).to_string(),
            "index idx not found on table t"
        );
    }

    #[test]
    fn test_plan_error_conversion() {
        let err: ExecutionError = cinder_core::Error::invalid_plan("no root").into();
        assert!(matches!(err, ExecutionError::Plan(_)));
        assert!(!err.is_usage());
        assert!(ExecutionError::not_open("Filter").is_usage());
    }
}
