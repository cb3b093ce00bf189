//! Positional parameter bindings.

use super::error::{ExecutionResult, UsageError};
use alloc::vec::Vec;
use cinder_core::Value;
use core::fmt;

/// Read-only positional parameters for one open/close cycle of a cursor tree.
///
/// Correlated operators never mutate the bindings they were opened with; they
/// derive a new set with [`Bindings::with`] and open their inner input with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    values: Vec<Option<Value>>,
}

impl Bindings {
    /// Creates an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates bindings with `values` bound at positions `0..values.len()`.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Returns a copy of these bindings with `value` bound at `position`.
    ///
    /// Fails with [`UsageError::BindingOutOfRange`] when `position` cannot be
    /// addressed by a bindings vector.
    pub fn with(&self, position: usize, value: Value) -> ExecutionResult<Self> {
        let out_of_range = || UsageError::BindingOutOfRange { position };
        let len = position.checked_add(1).ok_or_else(out_of_range)?;
        let mut values = self.values.clone();
        if values.len() < len {
            values
                .try_reserve_exact(len - values.len())
                .map_err(|_| out_of_range())?;
            values.resize(len, None);
        }
        values[position] = Some(value);
        Ok(Self { values })
    }

    /// Gets the value bound at `position`.
    pub fn get(&self, position: usize) -> ExecutionResult<&Value> {
        self.values
            .get(position)
            .and_then(Option::as_ref)
            .ok_or_else(|| UsageError::Unbound { position }.into())
    }

    /// Returns true if a value is bound at `position`.
    pub fn is_bound(&self, position: usize) -> bool {
        matches!(self.values.get(position), Some(Some(_)))
    }

    /// Returns the number of positions, bound or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// A value an operator reads at run time: either fixed in the plan or taken
/// from the bindings it was opened with.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Literal(Value),
    Binding(usize),
}

impl Operand {
    /// Resolves the operand against `bindings`.
    pub fn resolve<'b>(&'b self, bindings: &'b Bindings) -> ExecutionResult<&'b Value> {
        match self {
            Operand::Literal(value) => Ok(value),
            Operand::Binding(position) => bindings.get(*position),
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Binding(position) => write!(f, "${}", position),
        }
    }
}
