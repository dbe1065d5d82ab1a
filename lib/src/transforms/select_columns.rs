use crate::error::{ChainError, Result};
use crate::persist::{LoadContext, SaveContext, VersionInfo};
use crate::schema::Schema;
use crate::transform::{LoadableTransform, RowMapper, Transform};
use crate::transforms::plan::{ColumnPlan, NoDerive};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Keeps only the named columns, in the given order.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectColumns {
    columns: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct SelectColumnsParams {
    columns: Vec<String>,
}

impl SelectColumns {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn plan(&self, input: &Schema) -> Result<ColumnPlan> {
        let mut indices = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let (index, _) = input.require(name)?;
            if indices.contains(&index) {
                return Err(ChainError::schema_mismatch(
                    name,
                    "a column selected once",
                    "selected twice",
                ));
            }
            indices.push(index);
        }
        Ok(ColumnPlan::select(input, &indices))
    }
}

impl Transform for SelectColumns {
    fn version_info(&self) -> VersionInfo {
        Self::VERSION
    }

    fn output_schema(&self, input: &Schema) -> Result<Schema> {
        Ok(self.plan(input)?.output().clone())
    }

    fn is_row_to_row_mapper(&self) -> bool {
        true
    }

    fn row_mapper(&self, input: &Schema) -> Result<Arc<dyn RowMapper>> {
        Ok(Arc::new(self.plan(input)?.into_mapper(NoDerive)))
    }

    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<()> {
        ctx.write(&SelectColumnsParams {
            columns: self.columns.clone(),
        })
    }
}

impl LoadableTransform for SelectColumns {
    const VERSION: VersionInfo =
        VersionInfo::new("SELECTCO", 0x0001_0001, 0x0001_0001, 0x0001_0001, "SelectColumns");

    fn load(ctx: &mut LoadContext<'_>) -> Result<Self> {
        let params: SelectColumnsParams = ctx.read()?;
        Ok(Self {
            columns: params.columns,
        })
    }
}
