use crate::dataset::Value;
use crate::error::Result;
use crate::persist::{LoadContext, SaveContext, VersionInfo};
use crate::schema::{Column, Schema};
use crate::transform::{LoadableTransform, RowMapper, Transform};
use crate::transforms::plan::{ColumnPlan, Derive};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Copies columns under new names.
///
/// Each `(source, target)` pair adds `target` with the type, annotations and
/// values of `source`. A target that already exists is replaced in place.
/// Sources are resolved against the input schema, not against earlier pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct CopyColumns {
    pairs: Vec<(String, String)>,
}

/// Persisted payload of [`CopyColumns`].
#[derive(Serialize, Deserialize)]
struct CopyColumnsParams {
    pairs: Vec<(String, String)>,
}

impl CopyColumns {
    pub fn new<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    fn plan(&self, input: &Schema) -> Result<(ColumnPlan, Vec<usize>)> {
        let mut plan = ColumnPlan::passthrough(input);
        let mut sources = Vec::with_capacity(self.pairs.len());
        for (id, (source, target)) in self.pairs.iter().enumerate() {
            let (index, column) = input.require(source)?;
            let copy = Column {
                name: target.clone(),
                ..column.clone()
            };
            plan.derive(copy, id, vec![index]);
            sources.push(index);
        }
        Ok((plan, sources))
    }
}

struct CopyValues {
    sources: Vec<usize>,
}

impl Derive for CopyValues {
    fn derive(&self, id: usize, row: &[Value]) -> Result<Value> {
        Ok(row[self.sources[id]].clone())
    }
}

impl Transform for CopyColumns {
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
        let (plan, sources) = self.plan(input)?;
        Ok(Arc::new(plan.into_mapper(CopyValues { sources })))
    }

    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<()> {
        ctx.write(&CopyColumnsParams {
            pairs: self.pairs.clone(),
        })
    }
}

impl LoadableTransform for CopyColumns {
    const VERSION: VersionInfo =
        VersionInfo::new("COPYCOLS", 0x0001_0001, 0x0001_0001, 0x0001_0001, "CopyColumns");

    fn load(ctx: &mut LoadContext<'_>) -> Result<Self> {
        let params: CopyColumnsParams = ctx.read()?;
        Ok(Self {
            pairs: params.pairs,
        })
    }
}
