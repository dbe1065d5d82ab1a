#![allow(dead_code)]

use ml_chain::dataset::{DataView, InMemoryData, RowIter, Value};
use ml_chain::schema::{ColumnType, Schema};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Passenger-like sample with one missing age.
pub fn passengers() -> InMemoryData {
    let schema = Schema::from_pairs([
        ("age", ColumnType::Float),
        ("fare", ColumnType::Float),
        ("class", ColumnType::Int),
        ("name", ColumnType::Text),
    ]);
    let rows = vec![
        vec![
            Value::Float(22.0),
            Value::Float(7.25),
            Value::Int(3),
            Value::Text("Braund".into()),
        ],
        vec![
            Value::Float(38.0),
            Value::Float(71.28),
            Value::Int(1),
            Value::Text("Cumings".into()),
        ],
        vec![
            Value::Missing,
            Value::Float(8.05),
            Value::Int(3),
            Value::Text("Allen".into()),
        ],
        vec![
            Value::Float(35.0),
            Value::Float(53.1),
            Value::Int(1),
            Value::Text("Futrelle".into()),
        ],
    ];
    InMemoryData::new(schema, rows).expect("valid sample")
}

pub fn passengers_view() -> Arc<dyn DataView> {
    Arc::new(passengers())
}

/// Wraps a view and counts opened cursors and pulled rows.
pub struct CountingView {
    inner: Arc<dyn DataView>,
    pub cursors: AtomicUsize,
    pub rows: Arc<AtomicUsize>,
}

impl CountingView {
    pub fn new(inner: Arc<dyn DataView>) -> Self {
        Self {
            inner,
            cursors: AtomicUsize::new(0),
            rows: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn cursors(&self) -> usize {
        self.cursors.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> usize {
        self.rows.load(Ordering::SeqCst)
    }
}

impl DataView for CountingView {
    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    fn row_count(&self) -> Option<usize> {
        self.inner.row_count()
    }

    fn cursor(&self, active: &[bool]) -> RowIter<'_> {
        self.cursors.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.clone();
        Box::new(self.inner.cursor(active).inspect(move |_| {
            rows.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

pub fn same_allocation<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
