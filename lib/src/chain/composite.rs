//! Fused row mapping across every stage of a chain.

use crate::dataset::{Row, Value};
use crate::error::{ChainError, Result};
use crate::schema::Schema;
use crate::transform::RowMapper;
use std::fmt;
use std::sync::Arc;

/// One mapper standing in for a whole sequence of row mappers.
///
/// A row read through the composite goes stage by stage without building an
/// intermediate view per stage. Before mapping, the requested output columns
/// are walked backward through every stage's dependencies, so each stage only
/// computes the columns some later stage (or the caller) actually reads.
pub struct CompositeRowMapper {
    input: Schema,
    output: Schema,
    mappers: Vec<Arc<dyn RowMapper>>,
}

impl CompositeRowMapper {
    /// Compose `mappers` over rows of `input`.
    ///
    /// # Errors
    /// [`ChainError::InvariantViolation`] if a mapper's input schema is not
    /// the previous mapper's output schema.
    pub fn new(input: Schema, mappers: Vec<Arc<dyn RowMapper>>) -> Result<Self> {
        let mut current = &input;
        for (i, mapper) in mappers.iter().enumerate() {
            if mapper.input_schema() != current {
                return Err(ChainError::InvariantViolation(format!(
                    "mapper {i} expects {} but receives {}",
                    mapper.input_schema(),
                    current
                )));
            }
            current = mapper.output_schema();
        }
        let output = current.clone();
        Ok(Self {
            input,
            output,
            mappers,
        })
    }

    /// Number of fused stages.
    pub fn stages(&self) -> usize {
        self.mappers.len()
    }

    /// Input mask, and the output mask each stage has to fill.
    fn stage_masks(&self, active_outputs: &[bool]) -> (Vec<bool>, Vec<Vec<bool>>) {
        let mut masks = vec![Vec::new(); self.mappers.len()];
        let mut mask = active_outputs.to_vec();
        for (k, mapper) in self.mappers.iter().enumerate().rev() {
            let needed = mapper.dependencies(&mask);
            masks[k] = mask;
            mask = needed;
        }
        (mask, masks)
    }
}

impl fmt::Debug for CompositeRowMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeRowMapper")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("stages", &self.mappers.len())
            .finish()
    }
}

impl RowMapper for CompositeRowMapper {
    fn input_schema(&self) -> &Schema {
        &self.input
    }

    fn output_schema(&self) -> &Schema {
        &self.output
    }

    fn dependencies(&self, active_outputs: &[bool]) -> Vec<bool> {
        self.stage_masks(active_outputs).0
    }

    fn map_row(&self, input: &[Value], active_outputs: &[bool]) -> Result<Row> {
        let (_, masks) = self.stage_masks(active_outputs);
        let mut current: Option<Row> = None;
        for (mapper, mask) in self.mappers.iter().zip(&masks) {
            let next = mapper.map_row(current.as_deref().unwrap_or(input), mask)?;
            current = Some(next);
        }
        Ok(current.unwrap_or_else(|| input.to_vec()))
    }
}
