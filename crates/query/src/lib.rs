//! Cinder Query - Pull-based physical execution for Cinder.
//!
//! This crate provides the operator and cursor runtime:
//!
//! - `executor`: Operators (scans, filter, project, limit, union all, correlated join),
//!   their cursors, bindings and the storage adapter seam
//! - `plan`: Arena-allocated physical plans and their assembly into operators
//! - `context`: Execution context and configuration
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cinder_core::schema::{Column, Schema};
//! use cinder_core::{DataType, Value};
//! use cinder_query::context::{ExecutionConfig, ExecutionContext};
//! use cinder_query::executor::{Bindings, Execution, InMemoryAdapter, OperatorRef, TableScan, UnionAll};
//!
//! let schema = Schema::new();
//! let mut adapter = InMemoryAdapter::new();
//! adapter.add_table("a", vec![vec![Value::Int64(1)]]);
//! adapter.add_table("b", vec![vec![Value::Int64(2)]]);
//!
//! let scan = |table: &str| -> OperatorRef {
//!     let row_type = schema.table_type(table, vec![Column::new("id", DataType::Int64)]).unwrap();
//!     Arc::new(TableScan::new(table, row_type))
//! };
//! let union = UnionAll::new(&schema, vec![scan("a"), scan("b")]).unwrap();
//!
//! let config = ExecutionConfig::default();
//! let ctx = ExecutionContext::new(&adapter, &config);
//! let values = Execution::run(&union, ctx, Bindings::new()).unwrap().collect_values().unwrap();
//! assert_eq!(values, vec![vec![Value::Int64(1)], vec![Value::Int64(2)]]);
//! ```

#![no_std]

extern crate alloc;

pub mod context;
pub mod executor;
pub mod plan;
