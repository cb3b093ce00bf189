//! Execution context for query execution.

use crate::executor::StoreAdapter;
use core::fmt;

/// Tunables for plan assembly and execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Reuse pooled rows in place when no consumer still holds them. Turning
    /// this off makes every produced row a fresh allocation.
    pub row_reuse: bool,
    /// Deepest operator tree plan assembly accepts.
    pub max_plan_depth: usize,
    /// Emit a `trace` event for every row a leaf produces.
    pub trace_rows: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            row_reuse: true,
            max_plan_depth: 64,
            trace_rows: false,
        }
    }
}

impl ExecutionConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether pooled rows are reused.
    pub fn with_row_reuse(mut self, row_reuse: bool) -> Self {
        self.row_reuse = row_reuse;
        self
    }

    /// Sets the maximum plan depth.
    pub fn with_max_plan_depth(mut self, max_plan_depth: usize) -> Self {
        self.max_plan_depth = max_plan_depth;
        self
    }

    /// Sets whether per-row trace events are emitted.
    pub fn with_trace_rows(mut self, trace_rows: bool) -> Self {
        self.trace_rows = trace_rows;
        self
    }
}

/// Everything a cursor tree needs from its environment for one execution.
///
/// Passed by value to every [`crate::executor::Operator::cursor`] call; child
/// cursors receive the same context as their parent.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    adapter: &'a dyn StoreAdapter,
    config: &'a ExecutionConfig,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a new execution context.
    pub fn new(adapter: &'a dyn StoreAdapter, config: &'a ExecutionConfig) -> Self {
        Self { adapter, config }
    }

    /// Returns the storage adapter.
    #[inline]
    pub fn adapter(&self) -> &'a dyn StoreAdapter {
        self.adapter
    }

    /// Returns the execution configuration.
    #[inline]
    pub fn config(&self) -> &'a ExecutionConfig {
        self.config
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
