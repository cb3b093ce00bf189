//! Cinder Core - Core types for the Cinder query execution core.
//!
//! This crate provides the foundational types shared by every operator:
//!
//! - `DataType`: Column types, including the untyped-NULL marker
//! - `Value`: Runtime values carried by rows
//! - `schema`: Columns, row types (with shape unification) and the schema that allocates them
//! - `Row`: Value access to one tuple, plus the owned `ValuesRow`
//! - `SharedRowSlot`: Pooled row storage that never overwrites a shared row
//! - `Error`: Plan-assembly-time errors
//!
//! # Example
//!
//! ```rust
//! use cinder_core::schema::{Column, RowType, Schema};
//! use cinder_core::DataType;
//!
//! let schema = Schema::new();
//! let orders = schema
//!     .table_type("orders", vec![
//!         Column::new("id", DataType::Int64),
//!         Column::new("note", DataType::String),
//!     ])
//!     .unwrap();
//! let literals = schema.values_type_of(&[DataType::Int64, DataType::Null]);
//!
//! let merged = RowType::unify(&schema, &orders, &literals).unwrap();
//! assert_eq!(merged.types(), &[DataType::Int64, DataType::String]);
//! ```

#![no_std]

extern crate alloc;

mod error;
mod row;
pub mod schema;
mod slot;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::{HKey, Row, RowRef, ValuesRow};
pub use slot::SharedRowSlot;
pub use types::{DataType, TypeList};
pub use value::Value;
