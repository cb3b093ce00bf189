//! Arena-allocated physical plan trees.
//!
//! Nodes live in a flat vector and refer to their inputs by [`PlanNodeId`].
//! Each node records its parent, and the arena keeps the plan tree-shaped: a
//! node can be the input of at most one other node.

use crate::executor::{JoinType, KeyRange, Operand, RowPredicate};
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use cinder_core::schema::RowTypeRef;
use cinder_core::{Error, Result};
use core::fmt;
use hashbrown::HashMap;

/// Identifier of a node within its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanNodeId(u32);

impl PlanNodeId {
    /// Returns the position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlanNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Physical plan node.
#[derive(Clone, Debug)]
pub enum PlanNode {
    /// Full table scan.
    TableScan { table: String, row_type: RowTypeRef },

    /// Index scan with a key range.
    IndexScan {
        table: String,
        index: String,
        range: KeyRange,
        row_type: RowTypeRef,
    },

    /// Index point lookup.
    IndexLookup {
        table: String,
        index: String,
        key: Operand,
        row_type: RowTypeRef,
    },

    /// Filter operator.
    Filter {
        input: PlanNodeId,
        predicate: Arc<dyn RowPredicate>,
    },

    /// Projection operator.
    Project { input: PlanNodeId, columns: Vec<usize> },

    /// Limit operator.
    Limit {
        input: PlanNodeId,
        limit: usize,
        offset: usize,
    },

    /// Set union. Only `all == true` can be executed.
    Union { inputs: Vec<PlanNodeId>, all: bool },

    /// Correlated nested loop join.
    NestedLoopJoin {
        outer: PlanNodeId,
        inner: PlanNodeId,
        outer_column: usize,
        binding_position: usize,
        join_type: JoinType,
    },
}

impl PlanNode {
    /// Creates a table scan node.
    pub fn table_scan(table: impl Into<String>, row_type: RowTypeRef) -> Self {
        PlanNode::TableScan {
            table: table.into(),
            row_type,
        }
    }

    /// Creates a UNION ALL node.
    pub fn union_all(inputs: Vec<PlanNodeId>) -> Self {
        PlanNode::Union { inputs, all: true }
    }

    /// Returns the input node ids, in input order.
    pub fn inputs(&self) -> Vec<PlanNodeId> {
        match self {
            PlanNode::TableScan { .. } | PlanNode::IndexScan { .. } | PlanNode::IndexLookup { .. } => {
                Vec::new()
            }
            PlanNode::Filter { input, .. }
            | PlanNode::Project { input, .. }
            | PlanNode::Limit { input, .. } => vec![*input],
            PlanNode::Union { inputs, .. } => inputs.clone(),
            PlanNode::NestedLoopJoin { outer, inner, .. } => vec![*outer, *inner],
        }
    }

    fn inputs_mut(&mut self) -> Vec<&mut PlanNodeId> {
        match self {
            PlanNode::TableScan { .. } | PlanNode::IndexScan { .. } | PlanNode::IndexLookup { .. } => {
                Vec::new()
            }
            PlanNode::Filter { input, .. }
            | PlanNode::Project { input, .. }
            | PlanNode::Limit { input, .. } => vec![input],
            PlanNode::Union { inputs, .. } => inputs.iter_mut().collect(),
            PlanNode::NestedLoopJoin { outer, inner, .. } => vec![outer, inner],
        }
    }

    /// One-line summary of the node, without its inputs.
    pub fn summary(&self) -> String {
        match self {
            PlanNode::TableScan { table, .. } => format!("TableScan({})", table),
            PlanNode::IndexScan { table, index, range, .. } => {
                format!("IndexScan({}.{} {})", table, index, range)
            }
            PlanNode::IndexLookup { table, index, key, .. } => {
                format!("IndexLookup({}.{} = {})", table, index, key)
            }
            PlanNode::Filter { predicate, .. } => format!("Filter({})", predicate.describe()),
            PlanNode::Project { columns, .. } => format!("Project({:?})", columns),
            PlanNode::Limit { limit, offset, .. } => format!("Limit(limit={}, offset={})", limit, offset),
            PlanNode::Union { inputs, all } => format!(
                "Union(all={}, inputs={})",
                all,
                inputs.len()
            ),
            PlanNode::NestedLoopJoin {
                outer_column,
                binding_position,
                join_type,
                ..
            } => format!("NestedLoopJoin({:?}, #{} -> ${})", join_type, outer_column, binding_position),
        }
    }
}

/// A node together with its parent link.
#[derive(Clone, Debug)]
pub struct PlanEntry {
    pub node: PlanNode,
    pub parent: Option<PlanNodeId>,
}

/// Owns the nodes of one or more plan trees.
#[derive(Clone, Debug, Default)]
pub struct PlanArena {
    entries: Vec<PlanEntry>,
}

impl PlanArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a node and makes it the parent of its inputs.
    ///
    /// Fails if an input does not exist or already has a parent.
    pub fn add(&mut self, node: PlanNode) -> Result<PlanNodeId> {
        let id = PlanNodeId(self.entries.len() as u32);
        let inputs = node.inputs();
        for (i, input) in inputs.iter().enumerate() {
            self.check_orphan(*input)?;
            if inputs[..i].contains(input) {
                return Err(Error::invalid_plan(format!("{} used twice as input of {}", input, id)));
            }
        }
        for input in &inputs {
            self.entries[input.index()].parent = Some(id);
        }
        self.entries.push(PlanEntry { node, parent: None });
        Ok(id)
    }

    /// Returns the node with the given id.
    pub fn get(&self, id: PlanNodeId) -> Option<&PlanNode> {
        self.entries.get(id.index()).map(|entry| &entry.node)
    }

    /// Returns the parent of the given node.
    pub fn parent(&self, id: PlanNodeId) -> Option<PlanNodeId> {
        self.entries.get(id.index()).and_then(|entry| entry.parent)
    }

    /// Returns the inputs of the given node.
    pub fn children(&self, id: PlanNodeId) -> Vec<PlanNodeId> {
        self.get(id).map(PlanNode::inputs).unwrap_or_default()
    }

    /// Replaces the input `old` of `parent` with `new`.
    ///
    /// `old` is detached (its parent link cleared) and `new`, which must not
    /// already have a parent, becomes the input in the same position.
    pub fn replace_input(&mut self, parent: PlanNodeId, old: PlanNodeId, new: PlanNodeId) -> Result<()> {
        self.check_orphan(new)?;
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == new {
                return Err(Error::invalid_plan(format!("{} is an ancestor of {}", new, parent)));
            }
            ancestor = self.parent(id);
        }
        let entry = self
            .entries
            .get_mut(parent.index())
            .ok_or_else(|| Error::invalid_plan(format!("unknown plan node {}", parent)))?;
        let slot = entry
            .node
            .inputs_mut()
            .into_iter()
            .find(|input| **input == old)
            .ok_or_else(|| Error::invalid_plan(format!("{} is not an input of {}", old, parent)))?;
        *slot = new;
        self.entries[old.index()].parent = None;
        self.entries[new.index()].parent = Some(parent);
        Ok(())
    }

    /// Deep-copies the subtree rooted at `root`. The copy has no parent.
    pub fn duplicate(&mut self, root: PlanNodeId) -> Result<PlanNodeId> {
        self.duplicate_with_map(root).map(|(copy, _)| copy)
    }

    /// Deep-copies the subtree rooted at `root` and returns, along with the
    /// new root, the mapping from every original node to its copy.
    pub fn duplicate_with_map(
        &mut self,
        root: PlanNodeId,
    ) -> Result<(PlanNodeId, HashMap<PlanNodeId, PlanNodeId>)> {
        let mut remap = HashMap::new();
        let copy = self.copy_subtree(root, &mut remap)?;
        Ok((copy, remap))
    }

    fn copy_subtree(
        &mut self,
        id: PlanNodeId,
        remap: &mut HashMap<PlanNodeId, PlanNodeId>,
    ) -> Result<PlanNodeId> {
        if let Some(&copy) = remap.get(&id) {
            return Ok(copy);
        }
        let mut node = self
            .get(id)
            .cloned()
            .ok_or_else(|| Error::invalid_plan(format!("unknown plan node {}", id)))?;
        for input in node.inputs_mut() {
            *input = self.copy_subtree(*input, remap)?;
        }
        let copy = self.add(node)?;
        remap.insert(id, copy);
        Ok(copy)
    }

    fn check_orphan(&self, id: PlanNodeId) -> Result<()> {
        match self.entries.get(id.index()) {
            None => Err(Error::invalid_plan(format!("unknown plan node {}", id))),
            Some(PlanEntry { parent: Some(parent), .. }) => Err(Error::invalid_plan(format!(
                "{} is already an input of {}",
                id, parent
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Renders the tree rooted at `root`, one node per line, inputs indented.
    pub fn explain(&self, root: PlanNodeId) -> String {
        let mut out = String::new();
        self.explain_into(root, 0, &mut out);
        out
    }

    fn explain_into(&self, id: PlanNodeId, depth: usize, out: &mut String) {
        if !out.is_empty() {
            out.push('\n');
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        match self.get(id) {
            Some(node) => {
                out.push_str(&node.summary());
                for input in node.inputs() {
                    self.explain_into(input, depth + 1, out);
                }
            }
            None => out.push_str(&format!("<missing {}>", id)),
        }
    }
}
