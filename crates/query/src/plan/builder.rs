//! Turns arena plans into operator trees.

use super::arena::{PlanArena, PlanNode, PlanNodeId};
use crate::context::ExecutionConfig;
use crate::executor::{
    Filter, IndexLookup, IndexScan, Limit, NestedLoopJoin, OperatorRef, Project, TableScan, UnionAll,
};
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use cinder_core::schema::Schema;
use cinder_core::{Error, Result};
use tracing::debug;

/// Assembles operators from a [`PlanArena`].
///
/// Row types of composite operators are derived (and checked) while the tree
/// is assembled, so any shape error surfaces here rather than during
/// execution.
pub struct PlanBuilder<'a> {
    schema: &'a Schema,
    max_depth: usize,
}

impl<'a> PlanBuilder<'a> {
    /// Creates a builder allocating derived row types from `schema`.
    pub fn new(schema: &'a Schema, config: &ExecutionConfig) -> Self {
        Self {
            schema,
            max_depth: config.max_plan_depth,
        }
    }

    /// Builds the operator tree rooted at `root`.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %root))]
    pub fn assemble(&self, arena: &PlanArena, root: PlanNodeId) -> Result<OperatorRef> {
        let operator = self.build(arena, root, 1)?;
        debug!(row_type = %operator.output_row_type(), "plan assembled");
        Ok(operator)
    }

    fn build(&self, arena: &PlanArena, id: PlanNodeId, depth: usize) -> Result<OperatorRef> {
        if depth > self.max_depth {
            return Err(Error::invalid_plan(format!(
                "plan deeper than {} operators",
                self.max_depth
            )));
        }
        let node = arena
            .get(id)
            .ok_or_else(|| Error::invalid_plan(format!("unknown plan node {}", id)))?;
        let input = |input: PlanNodeId| self.build(arena, input, depth + 1);

        let operator: OperatorRef = match node {
            PlanNode::TableScan { table, row_type } => Arc::new(TableScan::new(table.clone(), row_type.clone())),
            PlanNode::IndexScan {
                table,
                index,
                range,
                row_type,
            } => Arc::new(IndexScan::new(
                table.clone(),
                index.clone(),
                range.clone(),
                row_type.clone(),
            )),
            PlanNode::IndexLookup {
                table,
                index,
                key,
                row_type,
            } => Arc::new(IndexLookup::new(
                table.clone(),
                index.clone(),
                key.clone(),
                row_type.clone(),
            )),
            PlanNode::Filter { input: source, predicate } => {
                Arc::new(Filter::new(input(*source)?, Arc::clone(predicate)))
            }
            PlanNode::Project { input: source, columns } => {
                Arc::new(Project::new(self.schema, input(*source)?, columns.clone())?)
            }
            PlanNode::Limit {
                input: source,
                limit,
                offset,
            } => Arc::new(Limit::new(input(*source)?, *limit, *offset)),
            PlanNode::Union { all: false, .. } => {
                return Err(Error::invalid_plan(
                    "UNION without ALL needs duplicate elimination, which is not supported",
                ));
            }
            PlanNode::Union { inputs, all: true } => {
                let inputs = inputs.iter().map(|&i| input(i)).collect::<Result<Vec<_>>>()?;
                Arc::new(UnionAll::new(self.schema, inputs)?)
            }
            PlanNode::NestedLoopJoin {
                outer,
                inner,
                outer_column,
                binding_position,
                join_type,
            } => Arc::new(NestedLoopJoin::new(
                self.schema,
                input(*outer)?,
                input(*inner)?,
                *outer_column,
                *binding_position,
                *join_type,
            )?),
        };
        Ok(operator)
    }
}
