//! Physical plan arena and operator assembly.

mod arena;
mod builder;

pub use arena::{PlanArena, PlanEntry, PlanNode, PlanNodeId};
pub use builder::PlanBuilder;
