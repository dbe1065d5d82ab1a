use crate::dataset::{DataView, Row, RowIter, Value};
use crate::error::{ChainError, Result};
use crate::schema::Schema;

/// Rows held in memory, validated against their schema on construction.
#[derive(Clone, Debug)]
pub struct InMemoryData {
    schema: Schema,
    rows: Vec<Row>,
}

impl InMemoryData {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        for (r, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(ChainError::InvalidData(format!(
                    "row {r} has {} values, schema has {} columns",
                    row.len(),
                    schema.len()
                )));
            }
            for (value, column) in row.iter().zip(schema.columns()) {
                if !value.conforms_to(&column.ty) {
                    return Err(ChainError::InvalidData(format!(
                        "row {r}: value {value:?} does not fit column '{}' of type {}",
                        column.name, column.ty
                    )));
                }
            }
        }
        Ok(Self { schema, rows })
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }
}

impl DataView for InMemoryData {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn row_count(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn cursor(&self, active: &[bool]) -> RowIter<'_> {
        let active = active.to_vec();
        Box::new(self.rows.iter().map(move |row| {
            Ok(row
                .iter()
                .zip(active.iter().chain(std::iter::repeat(&false)))
                .map(|(value, &on)| if on { value.clone() } else { Value::Missing })
                .collect())
        }))
    }
}
