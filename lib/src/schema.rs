//! Tabular schemas: named, typed columns with optional annotation schemas.
//!
//! A [`Schema`] is what flows between chain stages during propagation. Each
//! stage maps an input schema to an output schema without touching rows, so
//! the full output shape of a chain is known (and validated) before any data
//! is read.

use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    Text,
    /// Fixed-length vector of `f32`.
    Vector { len: usize },
}

impl ColumnType {
    /// Whether values of this type can be read as numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Int | ColumnType::Float | ColumnType::Vector { .. }
        )
    }

    /// Whether this is a single numeric value.
    pub fn is_scalar_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }

    /// Number of `f32` slots this type occupies when flattened.
    pub fn width(&self) -> usize {
        match self {
            ColumnType::Vector { len } => *len,
            _ => 1,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Bool => write!(f, "Bool"),
            ColumnType::Int => write!(f, "Int"),
            ColumnType::Float => write!(f, "Float"),
            ColumnType::Text => write!(f, "Text"),
            ColumnType::Vector { len } => write!(f, "Vector<{len}>"),
        }
    }
}

/// A named, typed column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    /// Nested schema describing annotations (e.g. slot names) on this column.
    pub annotations: Option<Schema>,
}

impl Column {
    /// Create a column without annotations.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: None,
        }
    }

    /// Attach an annotation schema.
    pub fn with_annotations(mut self, annotations: Schema) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// Ordered list of columns.
///
/// Column names are unique: adding a column whose name already exists
/// replaces the earlier one in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from `(name, type)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Schema::new(), |schema, (name, ty)| schema.with_column(Column::new(name, ty)))
    }

    /// Return a schema with `column` added (or replacing a same-named column).
    pub fn with_column(mut self, column: Column) -> Self {
        self.upsert(column);
        self
    }

    /// Add a column, replacing a same-named column in place.
    ///
    /// Returns the index the column ends up at.
    pub fn upsert(&mut self, column: Column) -> usize {
        match self.index_of(&column.name) {
            Some(i) => {
                self.columns[i] = column;
                i
            }
            None => {
                self.columns.push(column);
                self.columns.len() - 1
            }
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column by name, failing with [`ChainError::MissingColumn`].
    pub fn require(&self, name: &str) -> Result<(usize, &Column)> {
        self.index_of(name)
            .map(|i| (i, &self.columns[i]))
            .ok_or_else(|| ChainError::missing_column(name))
    }

    /// Look up a column and check that `accept` holds for its type.
    ///
    /// `expected` describes the accepted types in the error message.
    pub fn require_type(
        &self,
        name: &str,
        expected: &str,
        accept: impl Fn(&ColumnType) -> bool,
    ) -> Result<(usize, &Column)> {
        let (i, column) = self.require(name)?;
        if !accept(&column.ty) {
            return Err(ChainError::schema_mismatch(name, expected, &column.ty));
        }
        Ok((i, column))
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", c.name, c.ty)?;
        }
        write!(f, "}}")
    }
}
