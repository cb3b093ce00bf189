//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use cinder_core::schema::{Column, RowTypeRef, Schema};
use cinder_core::{DataType, HKey, RowRef, Value};
use cinder_query::context::{ExecutionConfig, ExecutionContext};
use cinder_query::executor::{
    Bindings, BoxedCursor, Cursor, ExecutionResult, InMemoryAdapter, KeyRange, Operator, OperatorRef, RecordStream,
    StorageError, StorageResult, StoreAdapter, StoredRecord, TableScan,
};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Routes tracing events to the test output. Run with `RUST_LOG`-style
/// filtering disabled; everything at debug and above is printed.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn int_type(schema: &Schema, table: &str) -> RowTypeRef {
    schema
        .table_type(table, vec![Column::new("id", DataType::Int64)])
        .unwrap()
}

pub fn ints(values: &[i64]) -> Vec<Vec<Value>> {
    values.iter().map(|&v| vec![Value::Int64(v)]).collect()
}

pub fn scan(schema: &Schema, table: &str) -> OperatorRef {
    Arc::new(TableScan::new(table, int_type(schema, table)))
}

/// Drains an open cursor, returning the first column of every row.
pub fn drain_ints(cursor: &mut dyn Cursor) -> ExecutionResult<Vec<i64>> {
    let mut out = Vec::new();
    while let Some(row) = cursor.next()? {
        out.push(row.value(0).and_then(Value::as_i64).unwrap());
    }
    Ok(out)
}

pub fn open(cursor: &mut dyn Cursor) -> ExecutionResult<()> {
    cursor.open(&Rc::new(Bindings::new()))
}

/// Counts how often cursors of the wrapped operator are opened and closed.
///
/// A close is counted only when it follows an open of the same cursor, so
/// repeated closes do not inflate the count.
#[derive(Debug)]
pub struct Counting {
    inner: OperatorRef,
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub rows: Arc<AtomicUsize>,
}

impl Counting {
    pub fn new(inner: OperatorRef) -> Self {
        Self {
            inner,
            opens: Arc::default(),
            closes: Arc::default(),
            rows: Arc::default(),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> usize {
        self.rows.load(Ordering::SeqCst)
    }
}

impl Operator for Counting {
    fn name(&self) -> &'static str {
        "Counting"
    }

    fn output_row_type(&self) -> &RowTypeRef {
        self.inner.output_row_type()
    }

    fn children(&self) -> Vec<&OperatorRef> {
        vec![&self.inner]
    }

    fn cursor<'a>(&'a self, ctx: ExecutionContext<'a>) -> BoxedCursor<'a> {
        Box::new(CountingCursor {
            owner: self,
            inner: self.inner.cursor(ctx),
            opened: false,
        })
    }

    fn describe_plan(&self) -> String {
        self.inner.describe_plan()
    }
}

struct CountingCursor<'a> {
    owner: &'a Counting,
    inner: BoxedCursor<'a>,
    opened: bool,
}

impl Cursor for CountingCursor<'_> {
    fn open(&mut self, bindings: &Rc<Bindings>) -> ExecutionResult<()> {
        self.close();
        self.owner.opens.fetch_add(1, Ordering::SeqCst);
        self.opened = true;
        self.inner.open(bindings)
    }

    fn next(&mut self) -> ExecutionResult<Option<RowRef>> {
        let row = self.inner.next()?;
        if row.is_some() {
            self.owner.rows.fetch_add(1, Ordering::SeqCst);
        }
        Ok(row)
    }

    fn close(&mut self) {
        if std::mem::take(&mut self.opened) {
            self.owner.closes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.close();
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

/// How a [`FailingAdapter`] table breaks.
#[derive(Clone, Debug)]
pub enum Failure {
    /// The stream fails with an I/O error after yielding this many records.
    IoAfter(usize),
    /// The stream times out after yielding this many records.
    TimeoutAfter(usize),
}

/// Adapter over an [`InMemoryAdapter`] whose `broken` table fails mid-scan.
pub struct FailingAdapter {
    pub inner: InMemoryAdapter,
    pub broken: String,
    pub failure: Failure,
}

impl FailingAdapter {
    pub fn new(inner: InMemoryAdapter, broken: impl Into<String>, failure: Failure) -> Self {
        Self {
            inner,
            broken: broken.into(),
            failure,
        }
    }

    fn wrap<'a>(&'a self, table: &str, stream: Box<dyn RecordStream + 'a>) -> Box<dyn RecordStream + 'a> {
        if table != self.broken {
            return stream;
        }
        let (budget, error) = match &self.failure {
            Failure::IoAfter(n) => (*n, StorageError::io("disk read failed")),
            Failure::TimeoutAfter(n) => (*n, StorageError::timeout(format!("scan {}", table))),
        };
        Box::new(FailingStream {
            inner: stream,
            budget,
            error,
        })
    }
}

impl StoreAdapter for FailingAdapter {
    fn scan(&self, table: &str) -> StorageResult<Box<dyn RecordStream + '_>> {
        let stream = self.inner.scan(table)?;
        Ok(self.wrap(table, stream))
    }

    fn seek(&self, table: &str, index: &str, range: &KeyRange) -> StorageResult<Box<dyn RecordStream + '_>> {
        let stream = self.inner.seek(table, index, range)?;
        Ok(self.wrap(table, stream))
    }
}

struct FailingStream<'a> {
    inner: Box<dyn RecordStream + 'a>,
    budget: usize,
    error: StorageError,
}

impl RecordStream for FailingStream<'_> {
    fn next_record(&mut self) -> StorageResult<Option<&StoredRecord>> {
        if self.budget == 0 {
            return Err(self.error.clone());
        }
        self.budget -= 1;
        self.inner.next_record()
    }
}

pub fn keyed(key: i64, values: Vec<Value>) -> StoredRecord {
    StoredRecord::new(HKey::new(vec![Value::Int64(key)]), values)
}

pub fn default_config() -> ExecutionConfig {
    ExecutionConfig::default()
}
