//! JOIN algorithm implementations.

mod nested;

pub use nested::{JoinType, NestedLoopJoin};
