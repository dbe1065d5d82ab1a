//! Versioned persistence of transforms and chains.
//!
//! A [`ModelContainer`] is an ordered list of named byte sections. Every
//! persisted entity (a chain, or one transform) owns one section laid out as
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ModelHeader                                  │
//! │   signature, version_written,                │
//! │   version_readable, version_we_can_read_back,│
//! │   loader_key                                 │
//! ├──────────────────────────────────────────────┤
//! │ Payload (owned by the entity)                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Loading reads the header, finds the loader by key in a caller-built
//! [`TransformRegistry`], checks versions, and only then hands the payload to
//! the loader, which must consume it exactly.
//!
//! Writers always emit the current build's versions: loading an older model
//! and saving it again migrates it to the current format.
//!
//! # Example
//! ```rust
//! use ml_chain::chain::TransformerChain;
//! use ml_chain::persist::{ModelContainer, TransformRegistry};
//! use ml_chain::transforms::SelectColumns;
//!
//! let chain = TransformerChain::empty().append(SelectColumns::new(["x"]));
//!
//! let mut container = ModelContainer::new();
//! chain.save(&mut container).unwrap();
//!
//! let registry = TransformRegistry::with_builtins();
//! let loaded = TransformerChain::load(&container, &registry).unwrap();
//! assert_eq!(loaded.len(), 1);
//! ```

pub mod container;
pub mod context;
pub mod registry;
pub mod version;

pub use container::{ContainerConfig, ModelContainer, DEFAULT_MODEL_NAME, FILE_MAGIC};
pub use context::{LoadContext, SaveContext};
pub use registry::{Registration, TransformFactory, TransformRegistry};
pub use version::{ModelHeader, VersionInfo};

use crate::error::Result;
use crate::transform::{LoadableTransform, Transform};
use std::sync::Arc;

/// Save `model` as the top-level entity `name`.
pub fn save_model(container: &mut ModelContainer, name: &str, model: &dyn Transform) -> Result<()> {
    context::save_entity(container, name, model)
}

/// Load the entity `name`, whatever registered kind it is.
pub fn load_model(
    container: &ModelContainer,
    registry: &TransformRegistry,
    name: &str,
) -> Result<Arc<dyn Transform>> {
    context::load_entity(container, registry, name)
}

/// Load the entity `name` as a `T`.
///
/// # Errors
/// [`ChainError::WrongEntityKind`](crate::error::ChainError::WrongEntityKind)
/// if the section holds another kind of entity.
pub fn load_typed<T: LoadableTransform>(
    container: &ModelContainer,
    registry: &TransformRegistry,
    name: &str,
) -> Result<T> {
    context::load_typed(container, registry, name)
}
