use crate::dataset::Value;
use crate::error::{ChainError, Result};
use crate::persist::{LoadContext, SaveContext, VersionInfo};
use crate::schema::{Column, ColumnType, Schema};
use crate::transform::{LoadableTransform, RowMapper, Transform};
use crate::transforms::plan::{ColumnPlan, Derive};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Concatenates numeric columns into one `Vector` column.
///
/// Scalars take one slot and vectors their full length. The output column
/// is annotated with a schema naming each slot (`name` for scalars,
/// `name[j]` for vector slots). Missing inputs become `NaN` slots.
#[derive(Clone, Debug, PartialEq)]
pub struct Concat {
    output: String,
    inputs: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct ConcatParams {
    output: String,
    inputs: Vec<String>,
}

/// Annotation schema naming every output slot.
///
/// Every slot gets its own entry, so two inputs that would produce the same
/// slot name are rejected.
fn slot_names(output: &str, input: &Schema, indices: &[usize]) -> Result<Schema> {
    let mut names = Schema::new();
    let mut add = |name: String| {
        if names.index_of(&name).is_some() {
            return Err(ChainError::schema_mismatch(
                output,
                "distinct slot names",
                format!("slot '{name}' twice"),
            ));
        }
        names.upsert(Column::new(name, ColumnType::Float));
        Ok(())
    };
    for &i in indices {
        let column = &input.columns()[i];
        match column.ty {
            ColumnType::Vector { len } => {
                for j in 0..len {
                    add(format!("{}[{j}]", column.name))?;
                }
            }
            _ => add(column.name.clone())?,
        }
    }
    Ok(names)
}

impl Concat {
    pub fn new<O, I, S>(output: O, inputs: I) -> Self
    where
        O: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: output.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn plan(&self, input: &Schema) -> Result<(ColumnPlan, Vec<(usize, usize)>)> {
        if self.inputs.is_empty() {
            return Err(ChainError::schema_mismatch(
                &self.output,
                "at least one input column",
                "none",
            ));
        }
        let mut indices = Vec::with_capacity(self.inputs.len());
        let mut layout = Vec::with_capacity(self.inputs.len());
        for name in &self.inputs {
            let (index, column) =
                input.require_type(name, "Int, Float or Vector", ColumnType::is_numeric)?;
            if indices.contains(&index) {
                return Err(ChainError::schema_mismatch(
                    name,
                    "a column concatenated once",
                    "listed twice",
                ));
            }
            indices.push(index);
            layout.push((index, column.ty.width()));
        }
        let len = layout.iter().map(|(_, width)| width).sum();
        let column = Column::new(self.output.clone(), ColumnType::Vector { len })
            .with_annotations(slot_names(&self.output, input, &indices)?);
        let mut plan = ColumnPlan::passthrough(input);
        plan.derive(column, 0, indices);
        Ok((plan, layout))
    }
}

struct ConcatValues {
    layout: Vec<(usize, usize)>,
    len: usize,
}

impl Derive for ConcatValues {
    fn derive(&self, _id: usize, row: &[Value]) -> Result<Value> {
        let mut out = Vec::with_capacity(self.len);
        for &(index, width) in &self.layout {
            match &row[index] {
                Value::Int(v) => out.push(*v as f32),
                Value::Float(v) => out.push(*v as f32),
                Value::Vector(v) if v.len() == width => out.extend_from_slice(v),
                Value::Missing => out.extend(std::iter::repeat(f32::NAN).take(width)),
                other => {
                    return Err(ChainError::InvalidData(format!(
                        "cannot concatenate {other:?} into {width} slots"
                    )))
                }
            }
        }
        Ok(Value::Vector(out))
    }
}

impl Transform for Concat {
    fn version_info(&self) -> VersionInfo {
        Self::VERSION
    }

    fn output_schema(&self, input: &Schema) -> Result<Schema> {
        Ok(self.plan(input)?.0.output().clone())
    }

    fn is_row_to_row_mapper(&self) -> bool {
        true
    }

    fn row_mapper(&self, input: &Schema) -> Result<Arc<dyn RowMapper>> {
        let (plan, layout) = self.plan(input)?;
        let len = layout.iter().map(|(_, width)| width).sum();
        Ok(Arc::new(plan.into_mapper(ConcatValues { layout, len })))
    }

    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<()> {
        ctx.write(&ConcatParams {
            output: self.output.clone(),
            inputs: self.inputs.clone(),
        })
    }
}

impl LoadableTransform for Concat {
    const VERSION: VersionInfo =
        VersionInfo::new("CONCATCO", 0x0001_0001, 0x0001_0001, 0x0001_0001, "Concat");

    fn load(ctx: &mut LoadContext<'_>) -> Result<Self> {
        let params: ConcatParams = ctx.read()?;
        Ok(Self {
            output: params.output,
            inputs: params.inputs,
        })
    }
}
