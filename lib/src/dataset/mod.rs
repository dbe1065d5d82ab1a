//! Dataset views: the pull-model data contract chains are applied to.
//!
//! This module provides a [`DataView`] trait for lazy, schema-carrying access
//! to rows, an in-memory implementation, and [`MappedView`], which applies a
//! single [`RowMapper`](crate::transform::RowMapper) on top of another view.
//!
//! # Core Concepts
//!
//! - **View**: a value with a [`Schema`] and a row-cursor factory. Views are
//!   immutable; every cursor is independent, so several threads may each pull
//!   rows from their own cursor over the same view.
//! - **Active columns**: a cursor is opened with a mask of the columns the
//!   consumer will read. Inactive columns may come back as [`Value::Missing`],
//!   which lets mapped views skip computing them.
//!
//! # Example
//!
//! ```rust
//! use ml_chain::dataset::{DataView, InMemoryData, Value};
//! use ml_chain::schema::{ColumnType, Schema};
//!
//! let schema = Schema::from_pairs([("x", ColumnType::Float)]);
//! let data = InMemoryData::new(schema, vec![vec![Value::Float(1.0)]]).unwrap();
//!
//! for row in data.rows() {
//!     let row = row.unwrap();
//!     assert_eq!(row[0], Value::Float(1.0));
//! }
//! ```

use crate::error::Result;
use crate::schema::{ColumnType, Schema};
use serde::{Deserialize, Serialize};

pub mod mapped;
pub mod memory;

pub use self::mapped::MappedView;
pub use self::memory::InMemoryData;

/// A single cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value. Also what inactive columns read as.
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector(Vec<f32>),
}

impl Value {
    /// `Missing`, or a float that is NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Read a scalar numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this value may be stored in a column of type `ty`.
    ///
    /// `Missing` conforms to every type.
    pub fn conforms_to(&self, ty: &ColumnType) -> bool {
        match (self, ty) {
            (Value::Missing, _) => true,
            (Value::Bool(_), ColumnType::Bool) => true,
            (Value::Int(_), ColumnType::Int) => true,
            (Value::Float(_), ColumnType::Float) => true,
            (Value::Text(_), ColumnType::Text) => true,
            (Value::Vector(v), ColumnType::Vector { len }) => v.len() == *len,
            _ => false,
        }
    }
}

/// One row: a value per schema column, in schema order.
pub type Row = Vec<Value>;

/// Iterator over the rows of a cursor.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// Opaque pull-model tabular data.
///
/// Implementations must not hold per-cursor state in `self`: each call to
/// [`cursor`](DataView::cursor) returns an independent iterator.
pub trait DataView: Send + Sync {
    /// Schema of every row this view yields.
    fn schema(&self) -> &Schema;

    /// Number of rows, when known without pulling them.
    fn row_count(&self) -> Option<usize> {
        None
    }

    /// Open a cursor reading the columns marked in `active`.
    ///
    /// Rows always have full schema width; inactive columns may be
    /// [`Value::Missing`].
    fn cursor(&self, active: &[bool]) -> RowIter<'_>;

    /// Open a cursor over all columns.
    fn rows(&self) -> RowIter<'_> {
        self.cursor(&all_active(self.schema().len()))
    }
}

/// Mask activating `n` columns.
pub fn all_active(n: usize) -> Vec<bool> {
    vec![true; n]
}

/// Pull every row of `view` into memory.
pub fn materialize(view: &dyn DataView) -> Result<InMemoryData> {
    let rows = view.rows().collect::<Result<Vec<_>>>()?;
    InMemoryData::new(view.schema().clone(), rows)
}
