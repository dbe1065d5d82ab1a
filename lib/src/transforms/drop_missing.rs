use crate::dataset::{DataView, RowIter};
use crate::error::Result;
use crate::persist::{LoadContext, SaveContext, VersionInfo};
use crate::schema::Schema;
use crate::transform::{LoadableTransform, Transform};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Drops every row with a missing value in one of the given columns.
///
/// With no columns given, every column is checked. The schema is unchanged,
/// but the row count is not, so this transform has no row mapper.
#[derive(Clone, Debug, PartialEq)]
pub struct DropMissing {
    columns: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct DropMissingParams {
    columns: Vec<String>,
}

impl DropMissing {
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

    fn checked_indices(&self, input: &Schema) -> Result<Vec<usize>> {
        if self.columns.is_empty() {
            return Ok((0..input.len()).collect());
        }
        self.columns
            .iter()
            .map(|name| input.require(name).map(|(i, _)| i))
            .collect()
    }
}

/// Lazy filtered view produced by [`DropMissing`].
struct DropMissingView {
    input: Arc<dyn DataView>,
    checked: Vec<usize>,
}

impl DataView for DropMissingView {
    fn schema(&self) -> &Schema {
        self.input.schema()
    }

    fn cursor(&self, active: &[bool]) -> RowIter<'_> {
        let mut needed = active.to_vec();
        needed.resize(self.input.schema().len(), false);
        for &i in &self.checked {
            needed[i] = true;
        }
        let checked = &self.checked;
        Box::new(self.input.cursor(&needed).filter(move |row| match row {
            Ok(row) => !checked.iter().any(|&i| row[i].is_missing()),
            Err(_) => true,
        }))
    }
}

impl Transform for DropMissing {
    fn version_info(&self) -> VersionInfo {
        Self::VERSION
    }

    fn output_schema(&self, input: &Schema) -> Result<Schema> {
        self.checked_indices(input)?;
        Ok(input.clone())
    }

    fn is_row_to_row_mapper(&self) -> bool {
        false
    }

    fn apply(&self, input: Arc<dyn DataView>) -> Result<Arc<dyn DataView>> {
        let checked = self.checked_indices(input.schema())?;
        Ok(Arc::new(DropMissingView { input, checked }))
    }

    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<()> {
        ctx.write(&DropMissingParams {
            columns: self.columns.clone(),
        })
    }
}

impl LoadableTransform for DropMissing {
    const VERSION: VersionInfo =
        VersionInfo::new("DROPMISS", 0x0001_0001, 0x0001_0001, 0x0001_0001, "DropMissing");

    fn load(ctx: &mut LoadContext<'_>) -> Result<Self> {
        let params: DropMissingParams = ctx.read()?;
        Ok(Self {
            columns: params.columns,
        })
    }
}
