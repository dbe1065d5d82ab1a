//! The capability contract every chain stage implements.
//!
//! This module defines the central traits:
//! - [`Transform`]: schema propagation, lazy application, optional row mapping
//!   and persistence of its own state.
//! - [`RowMapper`]: one output row from one input row, with per-column
//!   dependency information so unread columns are never computed.
//! - [`LoadableTransform`]: the static half of persistence; a version identity
//!   and a constructor from a container section. Registering a type in a
//!   [`TransformRegistry`](crate::persist::TransformRegistry) makes it
//!   loadable by its loader key.

use crate::dataset::{DataView, MappedView, Row, Value};
use crate::error::{ChainError, Result};
use crate::persist::{LoadContext, SaveContext, VersionInfo};
use crate::schema::Schema;
use std::fmt;
use std::sync::Arc;

/// A stage of a transform chain.
///
/// Implementations are immutable once built. Any per-row state lives in the
/// views and mappers they hand out, never in `self`.
pub trait Transform: Send + Sync + fmt::Debug {
    /// Persisted identity of this transform's format.
    fn version_info(&self) -> VersionInfo;

    /// Short name used in errors and logs.
    fn name(&self) -> &'static str {
        self.version_info().loader_key
    }

    /// Map an input schema to the schema this transform produces.
    ///
    /// # Errors
    /// [`ChainError::SchemaMismatch`] or [`ChainError::MissingColumn`] when
    /// the input does not carry what the transform needs.
    fn output_schema(&self, input: &Schema) -> Result<Schema>;

    /// Whether [`row_mapper`](Transform::row_mapper) is supported.
    fn is_row_to_row_mapper(&self) -> bool;

    /// Build a mapper for rows of `input`.
    fn row_mapper(&self, _input: &Schema) -> Result<Arc<dyn RowMapper>> {
        Err(ChainError::CapabilityViolation(format!(
            "{} is not a row-to-row mapper",
            self.name()
        )))
    }

    /// Wrap `input` in a view that applies this transform lazily.
    ///
    /// The default wraps the row mapper; transforms that change the number
    /// of rows override this.
    fn apply(&self, input: Arc<dyn DataView>) -> Result<Arc<dyn DataView>> {
        let mapper = self.row_mapper(input.schema())?;
        Ok(Arc::new(MappedView::new(input, mapper)))
    }

    /// Write this transform's payload. The header is already written.
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<()>;
}

/// Row-to-row mapping with lazy column activation.
pub trait RowMapper: Send + Sync {
    fn input_schema(&self) -> &Schema;

    fn output_schema(&self) -> &Schema;

    /// Input columns needed to produce the output columns marked in
    /// `active_outputs`.
    fn dependencies(&self, active_outputs: &[bool]) -> Vec<bool>;

    /// Compute the active output columns of one row.
    ///
    /// `input` only has to be populated at the positions returned by
    /// [`dependencies`](RowMapper::dependencies). Inactive outputs may be
    /// [`Value::Missing`].
    fn map_row(&self, input: &[Value], active_outputs: &[bool]) -> Result<Row>;
}

/// A transform that can be reconstructed from a container section.
pub trait LoadableTransform: Transform + Sized + 'static {
    /// Signature, versions and loader key written in this type's header.
    const VERSION: VersionInfo;

    /// Read the payload written by [`Transform::save`].
    ///
    /// Must consume the payload exactly; leftover bytes fail the load.
    fn load(ctx: &mut LoadContext<'_>) -> Result<Self>;
}
