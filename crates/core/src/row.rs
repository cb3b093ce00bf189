//! Row structures for Cinder.
//!
//! A row is one tuple's values tagged with the row type it conforms to. Rows
//! move between cursors as [`RowRef`] handles; the number of live handles is
//! the number of holders, which is what [`crate::SharedRowSlot`] inspects to
//! decide whether a pooled row may be overwritten.

use crate::schema::RowTypeRef;
use crate::value::Value;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

/// Shared handle to a row. Cloning acquires, dropping releases.
pub type RowRef = Rc<dyn Row>;

/// Hierarchical storage key of a row.
///
/// A row whose key is a strict prefix of another row's key is that row's
/// ancestor (e.g. a customer row and its order rows in a grouped table layout).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HKey {
    segments: Vec<Value>,
}

impl HKey {
    /// Creates a key from its segments.
    pub fn new(segments: Vec<Value>) -> Self {
        Self { segments }
    }

    /// Returns the key segments.
    #[inline]
    pub fn segments(&self) -> &[Value] {
        &self.segments
    }

    /// Returns the number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the key has no segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true if this key is a strict prefix of `other`.
    pub fn is_ancestor_of(&self, other: &HKey) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for HKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", segment)?;
        }
        f.write_str("}")
    }
}

/// Value access to one tuple.
pub trait Row: fmt::Debug {
    /// The row type this row reports. Never changes for the life of the row.
    fn row_type(&self) -> &RowTypeRef;

    /// All column values in row type order.
    fn values(&self) -> &[Value];

    /// The storage key, for rows that came from storage.
    fn hkey(&self) -> Option<&HKey>;

    /// Gets a value at the given column index.
    fn value(&self, index: usize) -> Option<&Value> {
        self.values().get(index)
    }

    /// Returns the number of values in this row.
    fn len(&self) -> usize {
        self.values().len()
    }

    /// Returns true if this row has no values.
    fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Returns true if this row's key is a strict prefix of `other`'s key.
    fn ancestor_of(&self, other: &dyn Row) -> bool {
        match (self.hkey(), other.hkey()) {
            (Some(mine), Some(theirs)) => mine.is_ancestor_of(theirs),
            _ => false,
        }
    }
}

/// A row that owns its values.
///
/// Leaf scans and value-producing operators (projections, joins) pool these in
/// a [`crate::SharedRowSlot`] and overwrite them in place between calls.
#[derive(Clone, Debug)]
pub struct ValuesRow {
    row_type: RowTypeRef,
    values: Vec<Value>,
    hkey: Option<HKey>,
}

impl ValuesRow {
    /// Creates a new row of the given type.
    pub fn new(row_type: RowTypeRef, values: Vec<Value>) -> Self {
        Self {
            row_type,
            values,
            hkey: None,
        }
    }

    /// Creates an empty row with capacity for the row type's arity.
    pub fn empty(row_type: RowTypeRef) -> Self {
        let values = Vec::with_capacity(row_type.arity());
        Self::new(row_type, values)
    }

    /// Sets the storage key.
    pub fn with_hkey(mut self, hkey: HKey) -> Self {
        self.hkey = Some(hkey);
        self
    }

    /// Returns a mutable reference to the values.
    #[inline]
    pub fn values_mut(&mut self) -> &mut Vec<Value> {
        &mut self.values
    }

    /// Overwrites the values, reusing the existing allocation.
    pub fn set_values(&mut self, values: &[Value]) {
        self.values.truncate(values.len());
        let (head, tail) = values.split_at(self.values.len());
        self.values.clone_from_slice(head);
        self.values.extend_from_slice(tail);
    }

    /// Sets or clears the storage key, reusing the existing allocation.
    pub fn set_hkey(&mut self, hkey: Option<&HKey>) {
        match (hkey, &mut self.hkey) {
            (Some(src), Some(dst)) => dst.clone_from(src),
            (src, dst) => *dst = src.cloned(),
        }
    }

    /// Sets a value at the given column index.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl Row for ValuesRow {
    fn row_type(&self) -> &RowTypeRef {
        &self.row_type
    }

    fn values(&self) -> &[Value] {
        &self.values
    }

    fn hkey(&self) -> Option<&HKey> {
        self.hkey.as_ref()
    }
}

impl PartialEq for ValuesRow {
    fn eq(&self, other: &Self) -> bool {
        self.row_type.id() == other.row_type.id() && self.values == other.values
    }
}
