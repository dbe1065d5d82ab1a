//! Shared column bookkeeping for the built-in row mappers.

use crate::dataset::{Row, Value};
use crate::error::{ChainError, Result};
use crate::schema::{Column, Schema};
use crate::transform::RowMapper;

/// Where one output column comes from.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Slot {
    /// Copied unchanged from this input position.
    Pass(usize),
    /// Computed by the mapper's [`Derive`] from these input positions.
    Derived { id: usize, inputs: Vec<usize> },
}

/// Output layout of a mapper in terms of its input columns.
#[derive(Clone, Debug)]
pub(crate) struct ColumnPlan {
    input: Schema,
    output: Schema,
    slots: Vec<Slot>,
}

impl ColumnPlan {
    /// Every input column passes through unchanged.
    pub(crate) fn passthrough(input: &Schema) -> Self {
        Self {
            input: input.clone(),
            output: input.clone(),
            slots: (0..input.len()).map(Slot::Pass).collect(),
        }
    }

    /// Output is exactly the given input positions, in that order.
    pub(crate) fn select(input: &Schema, indices: &[usize]) -> Self {
        let output = indices.iter().fold(Schema::new(), |schema, &i| {
            schema.with_column(input.columns()[i].clone())
        });
        Self {
            input: input.clone(),
            output,
            slots: indices.iter().copied().map(Slot::Pass).collect(),
        }
    }

    /// Add (or replace by name) a computed column.
    pub(crate) fn derive(&mut self, column: Column, id: usize, inputs: Vec<usize>) {
        let at = self.output.upsert(column);
        let slot = Slot::Derived { id, inputs };
        if at < self.slots.len() {
            self.slots[at] = slot;
        } else {
            self.slots.push(slot);
        }
    }

    pub(crate) fn output(&self) -> &Schema {
        &self.output
    }

    pub(crate) fn into_mapper<D: Derive>(self, derive: D) -> PlannedMapper<D> {
        PlannedMapper { plan: self, derive }
    }
}

/// Computes the derived columns of a [`ColumnPlan`].
pub(crate) trait Derive: Send + Sync {
    fn derive(&self, id: usize, row: &[Value]) -> Result<Value>;
}

/// For plans without derived columns.
pub(crate) struct NoDerive;

impl Derive for NoDerive {
    fn derive(&self, id: usize, _row: &[Value]) -> Result<Value> {
        Err(ChainError::InvariantViolation(format!(
            "no derived column {id} in a pass-only plan"
        )))
    }
}

/// A [`RowMapper`] driven by a [`ColumnPlan`].
pub(crate) struct PlannedMapper<D> {
    plan: ColumnPlan,
    derive: D,
}

impl<D: Derive> RowMapper for PlannedMapper<D> {
    fn input_schema(&self) -> &Schema {
        &self.plan.input
    }

    fn output_schema(&self) -> &Schema {
        &self.plan.output
    }

    fn dependencies(&self, active_outputs: &[bool]) -> Vec<bool> {
        let mut needed = vec![false; self.plan.input.len()];
        for (slot, _) in self
            .plan
            .slots
            .iter()
            .zip(active_outputs)
            .filter(|(_, on)| **on)
        {
            match slot {
                Slot::Pass(i) => needed[*i] = true,
                Slot::Derived { inputs, .. } => {
                    for &i in inputs {
                        needed[i] = true;
                    }
                }
            }
        }
        needed
    }

    fn map_row(&self, input: &[Value], active_outputs: &[bool]) -> Result<Row> {
        if input.len() != self.plan.input.len() {
            return Err(ChainError::InvalidData(format!(
                "row has {} values, mapper expects {}",
                input.len(),
                self.plan.input.len()
            )));
        }
        self.plan
            .slots
            .iter()
            .zip(active_outputs.iter().chain(std::iter::repeat(&false)))
            .map(|(slot, &on)| match (slot, on) {
                (_, false) => Ok(Value::Missing),
                (Slot::Pass(i), true) => Ok(input[*i].clone()),
                (Slot::Derived { id, .. }, true) => self.derive.derive(*id, input),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    struct Double;

    impl Derive for Double {
        fn derive(&self, _id: usize, row: &[Value]) -> Result<Value> {
            Ok(match row[0] {
                Value::Int(v) => Value::Int(v * 2),
                _ => Value::Missing,
            })
        }
    }

    fn input() -> Schema {
        Schema::from_pairs([("a", ColumnType::Int), ("b", ColumnType::Text)])
    }

    #[test]
    fn test_derived_column_appends() {
        let mut plan = ColumnPlan::passthrough(&input());
        plan.derive(Column::new("c", ColumnType::Int), 0, vec![0]);
        assert_eq!(plan.output().names(), vec!["a", "b", "c"]);

        let mapper = plan.into_mapper(Double);
        assert_eq!(mapper.dependencies(&[false, false, true]), vec![true, false]);
        let row = mapper
            .map_row(&[Value::Int(4), Value::Missing], &[false, false, true])
            .unwrap();
        assert_eq!(row, vec![Value::Missing, Value::Missing, Value::Int(8)]);
    }

    #[test]
    fn test_derived_column_replaces_in_place() {
        let mut plan = ColumnPlan::passthrough(&input());
        plan.derive(Column::new("a", ColumnType::Int), 0, vec![0]);
        assert_eq!(plan.output().names(), vec!["a", "b"]);
        let mapper = plan.into_mapper(Double);
        let row = mapper
            .map_row(&[Value::Int(1), Value::Text("t".into())], &[true, true])
            .unwrap();
        assert_eq!(row, vec![Value::Int(2), Value::Text("t".into())]);
    }

    #[test]
    fn test_select_reorders() {
        let plan = ColumnPlan::select(&input(), &[1, 0]);
        assert_eq!(plan.output().names(), vec!["b", "a"]);
        let mapper = plan.into_mapper(NoDerive);
        assert_eq!(mapper.dependencies(&[true, false]), vec![false, true]);
    }

    #[test]
    fn test_wrong_row_width() {
        let mapper = ColumnPlan::passthrough(&input()).into_mapper(NoDerive);
        assert!(matches!(
            mapper.map_row(&[Value::Int(1)], &[true, true]),
            Err(ChainError::InvalidData(_))
        ));
    }
}
