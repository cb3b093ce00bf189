//! Storage seam consumed by leaf operators.
//!
//! A [`StoreAdapter`] hands out [`RecordStream`]s over stored records. Streams
//! are pulled one record at a time, and the record reference returned by
//! [`RecordStream::next_record`] is only valid until the next call, so leaf
//! cursors copy what they need into their own pooled rows.

use super::error::{StorageError, StorageResult};
use alloc::boxed::Box;
use alloc::collections::btree_map;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use cinder_core::{HKey, Value};
use core::fmt;
use core::ops::Bound;

/// A record as stored: its hierarchical key and its column values.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredRecord {
    pub key: HKey,
    pub values: Vec<Value>,
}

impl StoredRecord {
    /// Creates a new stored record.
    pub fn new(key: HKey, values: Vec<Value>) -> Self {
        Self { key, values }
    }
}

/// A range of index keys.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyRange {
    pub lower: Bound<Value>,
    pub upper: Bound<Value>,
}

impl KeyRange {
    /// Creates a range from its bounds.
    pub fn new(lower: Bound<Value>, upper: Bound<Value>) -> Self {
        Self { lower, upper }
    }

    /// The range holding exactly `key`.
    pub fn point(key: Value) -> Self {
        Self::new(Bound::Included(key.clone()), Bound::Included(key))
    }

    /// The unbounded range.
    pub fn all() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// Returns true if `key` lies inside the range.
    pub fn contains(&self, key: &Value) -> bool {
        let above = match &self.lower {
            Bound::Included(lower) => key >= lower,
            Bound::Excluded(lower) => key > lower,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(upper) => key <= upper,
            Bound::Excluded(upper) => key < upper,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// Returns true if no key can lie inside the range.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(lower), Bound::Included(upper)) => lower > upper,
            (Bound::Included(lower), Bound::Excluded(upper))
            | (Bound::Excluded(lower), Bound::Included(upper))
            | (Bound::Excluded(lower), Bound::Excluded(upper)) => lower >= upper,
            _ => false,
        }
    }

    fn bounds(&self) -> (Bound<&Value>, Bound<&Value>) {
        (self.lower.as_ref(), self.upper.as_ref())
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Bound::Included(v) => write!(f, "[{}", v)?,
            Bound::Excluded(v) => write!(f, "({}", v)?,
            Bound::Unbounded => f.write_str("(-inf")?,
        }
        f.write_str(", ")?;
        match &self.upper {
            Bound::Included(v) => write!(f, "{}]", v),
            Bound::Excluded(v) => write!(f, "{})", v),
            Bound::Unbounded => f.write_str("+inf)"),
        }
    }
}

/// A pull stream of stored records.
pub trait RecordStream {
    /// Returns the next record, or `None` once the stream is exhausted.
    fn next_record(&mut self) -> StorageResult<Option<&StoredRecord>>;
}

/// Access to stored tables and their indexes.
///
/// One adapter is shared read-only by every cursor of an execution.
pub trait StoreAdapter {
    /// Streams every record of `table` in storage order.
    fn scan(&self, table: &str) -> StorageResult<Box<dyn RecordStream + '_>>;

    /// Streams the records of `table` whose `index` key lies in `range`, in
    /// index order.
    fn seek(&self, table: &str, index: &str, range: &KeyRange) -> StorageResult<Box<dyn RecordStream + '_>>;

    /// Streams the records of `table` whose `index` key equals `key`.
    fn fetch(&self, table: &str, index: &str, key: &Value) -> StorageResult<Box<dyn RecordStream + '_>> {
        self.seek(table, index, &KeyRange::point(key.clone()))
    }
}

/// In-memory adapter with ordered single-column indexes.
#[derive(Debug, Default)]
pub struct InMemoryAdapter {
    tables: BTreeMap<String, TableData>,
}

#[derive(Debug, Default)]
struct TableData {
    records: Vec<StoredRecord>,
    indexes: BTreeMap<String, IndexData>,
}

#[derive(Debug)]
struct IndexData {
    /// Maps key values to record positions. NULL keys are not indexed.
    key_to_rows: BTreeMap<Value, Vec<usize>>,
}

impl InMemoryAdapter {
    /// Creates a new empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table. Each row is keyed by its ordinal position.
    pub fn add_table(&mut self, name: impl Into<String>, rows: Vec<Vec<Value>>) {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| StoredRecord::new(HKey::new(alloc::vec![Value::Int64(i as i64)]), values))
            .collect();
        self.add_records(name, records);
    }

    /// Adds (or replaces) a table with explicitly keyed records.
    pub fn add_records(&mut self, name: impl Into<String>, records: Vec<StoredRecord>) {
        self.tables.insert(
            name.into(),
            TableData {
                records,
                indexes: BTreeMap::new(),
            },
        );
    }

    /// Creates an index on a table column.
    pub fn create_index(
        &mut self,
        table: &str,
        index_name: impl Into<String>,
        column_index: usize,
    ) -> StorageResult<()> {
        let table_data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StorageError::table_not_found(table))?;

        let mut key_to_rows: BTreeMap<Value, Vec<usize>> = BTreeMap::new();
        for (row_idx, record) in table_data.records.iter().enumerate() {
            match record.values.get(column_index) {
                Some(key) if !key.is_null() => key_to_rows.entry(key.clone()).or_default().push(row_idx),
                _ => {}
            }
        }

        table_data
            .indexes
            .insert(index_name.into(), IndexData { key_to_rows });
        Ok(())
    }

    /// Returns the number of records in `table`.
    pub fn row_count(&self, table: &str) -> StorageResult<usize> {
        self.table(table).map(|t| t.records.len())
    }

    fn table(&self, table: &str) -> StorageResult<&TableData> {
        self.tables
            .get(table)
            .ok_or_else(|| StorageError::table_not_found(table))
    }
}

impl StoreAdapter for InMemoryAdapter {
    fn scan(&self, table: &str) -> StorageResult<Box<dyn RecordStream + '_>> {
        let table_data = self.table(table)?;
        Ok(Box::new(TableStream {
            records: table_data.records.iter(),
        }))
    }

    fn seek(&self, table: &str, index: &str, range: &KeyRange) -> StorageResult<Box<dyn RecordStream + '_>> {
        let table_data = self.table(table)?;
        let index_data = table_data
            .indexes
            .get(index)
            .ok_or_else(|| StorageError::index_not_found(table, index))?;

        // BTreeMap::range panics on inverted bounds
        let entries = if range.is_empty() {
            None
        } else {
            Some(index_data.key_to_rows.range::<Value, _>(range.bounds()))
        };
        Ok(Box::new(IndexStream {
            records: &table_data.records,
            entries,
            postings: Default::default(),
        }))
    }
}

struct TableStream<'a> {
    records: core::slice::Iter<'a, StoredRecord>,
}

impl RecordStream for TableStream<'_> {
    fn next_record(&mut self) -> StorageResult<Option<&StoredRecord>> {
        Ok(self.records.next())
    }
}

struct IndexStream<'a> {
    records: &'a [StoredRecord],
    entries: Option<btree_map::Range<'a, Value, Vec<usize>>>,
    postings: core::slice::Iter<'a, usize>,
}

impl RecordStream for IndexStream<'_> {
    fn next_record(&mut self) -> StorageResult<Option<&StoredRecord>> {
        loop {
            if let Some(&position) = self.postings.next() {
                return Ok(self.records.get(position));
            }
            match self.entries.as_mut().and_then(|entries| entries.next()) {
                Some((_, postings)) => self.postings = postings.iter(),
                None => return Ok(None),
            }
        }
    }
}
