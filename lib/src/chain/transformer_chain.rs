//! Ordered, scope-tagged composition of transforms.
//!
//! # Example
//! ```rust
//! use ml_chain::chain::TransformerChain;
//! use ml_chain::schema::{ColumnType, Schema};
//! use ml_chain::scope::Scope;
//! use ml_chain::transforms::{CopyColumns, StandardScale};
//!
//! let chain = TransformerChain::empty()
//!     .append_scoped(CopyColumns::new([("age", "age_raw")]), Scope::TRAINING)
//!     .append(StandardScale::new("age", 40.0, 12.0));
//!
//! // The last stage keeps its concrete type.
//! assert_eq!(chain.last_transform().unwrap().mean(), 40.0);
//!
//! let input = Schema::from_pairs([("age", ColumnType::Int)]);
//! let output = chain.output_schema(&input).unwrap();
//! assert_eq!(output.names(), vec!["age", "age_raw"]);
//!
//! // Serving only needs the scaler.
//! let serving = chain.model_for(Scope::SCORING);
//! assert_eq!(serving.len(), 1);
//! ```

use crate::chain::composite::CompositeRowMapper;
use crate::dataset::DataView;
use crate::error::{ChainError, Result};
use crate::persist::context::{load_typed, save_entity};
use crate::persist::{
    ContainerConfig, LoadContext, ModelContainer, SaveContext, TransformRegistry, VersionInfo,
    DEFAULT_MODEL_NAME,
};
use crate::schema::Schema;
use crate::scope::{keep, Scope};
use crate::transform::{LoadableTransform, RowMapper, Transform};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Width of the position number in nested section names.
const TRANSFORM_DIR_WIDTH: usize = 3;

fn transform_section(position: usize) -> String {
    format!("Transform_{position:0width$}", width = TRANSFORM_DIR_WIDTH)
}

/// An immutable sequence of `(transform, scope)` pairs.
///
/// The type parameter `L` is the concrete type of the last stage, so a chain
/// built with [`append`](TransformerChain::append) gives typed access to what
/// it ends with. Chains that lose that knowledge (empty, filtered, loaded)
/// use the default `L = dyn Transform`.
///
/// Every operation that changes the sequence returns a new chain; the
/// receiver is never modified. Transforms are shared between chains by `Arc`
/// and are themselves immutable.
pub struct TransformerChain<L: ?Sized + Transform = dyn Transform> {
    transforms: Vec<Arc<dyn Transform>>,
    scopes: Vec<Scope>,
    last: Option<Arc<L>>,
}

impl TransformerChain {
    /// The chain with no stages; it maps every schema and view to itself.
    pub fn empty() -> Self {
        Self {
            transforms: Vec::new(),
            scopes: Vec::new(),
            last: None,
        }
    }

    /// Build a chain from parallel transform and scope lists.
    ///
    /// # Errors
    /// [`ChainError::InvariantViolation`] if the lists differ in length.
    pub fn new(transforms: Vec<Arc<dyn Transform>>, scopes: Vec<Scope>) -> Result<Self> {
        if transforms.len() != scopes.len() {
            return Err(ChainError::InvariantViolation(format!(
                "{} transforms but {} scopes",
                transforms.len(),
                scopes.len()
            )));
        }
        let last = transforms.last().cloned();
        debug!(stages = transforms.len(), "built transformer chain");
        Ok(Self {
            transforms,
            scopes,
            last,
        })
    }

    /// Build a chain whose stages all have [`Scope::EVERYTHING`].
    pub fn from_transforms(transforms: Vec<Arc<dyn Transform>>) -> Self {
        let scopes = vec![Scope::EVERYTHING; transforms.len()];
        let last = transforms.last().cloned();
        Self {
            transforms,
            scopes,
            last,
        }
    }

    /// Load the chain saved under [`DEFAULT_MODEL_NAME`].
    pub fn load(container: &ModelContainer, registry: &TransformRegistry) -> Result<Self> {
        Self::load_named(container, registry, DEFAULT_MODEL_NAME)
    }

    /// Load the chain saved under `name`.
    ///
    /// # Errors
    /// [`ChainError::WrongEntityKind`] if `name` holds something other than
    /// a chain, plus any error raised while loading a stage.
    pub fn load_named(
        container: &ModelContainer,
        registry: &TransformRegistry,
        name: &str,
    ) -> Result<Self> {
        load_typed::<TransformerChain>(container, registry, name)
    }

    /// Read a container file and load the chain named by `config.model_name`.
    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        registry: &TransformRegistry,
        config: &ContainerConfig,
    ) -> Result<Self> {
        let container = ModelContainer::load_from_file(path, config)?;
        Self::load_named(&container, registry, &config.model_name)
    }
}

impl<L: ?Sized + Transform> TransformerChain<L> {
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn transforms(&self) -> &[Arc<dyn Transform>] {
        &self.transforms
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Iterate over `(transform, scope)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<dyn Transform>, Scope)> + '_ {
        self.transforms.iter().zip(self.scopes.iter().copied())
    }

    /// The final stage, typed as it was appended.
    pub fn last_transform(&self) -> Option<&Arc<L>> {
        self.last.as_ref()
    }

    /// Forget the concrete type of the last stage.
    pub fn into_generic(self) -> TransformerChain {
        let last = self.transforms.last().cloned();
        TransformerChain {
            transforms: self.transforms,
            scopes: self.scopes,
            last,
        }
    }

    /// Append `transform` with [`Scope::EVERYTHING`].
    pub fn append<T: Transform + 'static>(&self, transform: T) -> TransformerChain<T> {
        self.append_scoped(transform, Scope::EVERYTHING)
    }

    /// Append `transform` tagged with `scope`.
    pub fn append_scoped<T: Transform + 'static>(
        &self,
        transform: T,
        scope: Scope,
    ) -> TransformerChain<T> {
        self.append_shared(Arc::new(transform), scope)
    }

    /// Append an already shared transform tagged with `scope`.
    ///
    /// The new chain's last transform is `transform` itself, not a copy.
    pub fn append_shared<T: Transform + 'static>(
        &self,
        transform: Arc<T>,
        scope: Scope,
    ) -> TransformerChain<T> {
        let mut transforms = Vec::with_capacity(self.transforms.len() + 1);
        transforms.extend(self.transforms.iter().cloned());
        transforms.push(transform.clone() as Arc<dyn Transform>);
        let mut scopes = Vec::with_capacity(self.scopes.len() + 1);
        scopes.extend_from_slice(&self.scopes);
        scopes.push(scope);
        trace!(stages = transforms.len(), %scope, name = transform.name(), "appended stage");
        TransformerChain {
            transforms,
            scopes,
            last: Some(transform),
        }
    }

    /// The sub-chain of stages whose scope intersects `filter`, in order.
    pub fn model_for(&self, filter: Scope) -> TransformerChain {
        let (transforms, scopes): (Vec<_>, Vec<_>) = self
            .iter()
            .filter(|(_, scope)| keep(*scope, filter))
            .map(|(transform, scope)| (transform.clone(), scope))
            .unzip();
        debug!(
            %filter,
            kept = transforms.len(),
            of = self.len(),
            "filtered transformer chain"
        );
        let last = transforms.last().cloned();
        TransformerChain {
            transforms,
            scopes,
            last,
        }
    }

    /// Propagate `input` through every stage.
    ///
    /// Stops at the first stage that rejects its input; the error names that
    /// stage's position and transform.
    pub fn output_schema(&self, input: &Schema) -> Result<Schema> {
        let mut schema = input.clone();
        for (i, transform) in self.transforms.iter().enumerate() {
            trace!(stage = i, name = transform.name(), "propagating schema");
            schema = transform
                .output_schema(&schema)
                .map_err(|e| e.at_stage(i, transform.name()))?;
        }
        Ok(schema)
    }

    /// Apply every stage lazily to `input`.
    ///
    /// The output schema is validated first, so a mismatch is reported before
    /// any row is read. The returned view computes rows only when pulled. An
    /// empty chain returns `input` itself.
    pub fn transform(&self, input: Arc<dyn DataView>) -> Result<Arc<dyn DataView>> {
        self.output_schema(input.schema())?;
        let mut current = input;
        for (i, transform) in self.transforms.iter().enumerate() {
            current = transform
                .apply(current)
                .map_err(|e| e.at_stage(i, transform.name()))?;
        }
        Ok(current)
    }

    /// True if every stage can map rows directly (vacuously true when empty).
    pub fn is_row_to_row_mapper(&self) -> bool {
        self.transforms.iter().all(|t| t.is_row_to_row_mapper())
    }

    /// Fuse every stage's row mapper into one.
    ///
    /// # Errors
    /// [`ChainError::CapabilityViolation`] if any stage is not a row-to-row
    /// mapper, checked before any mapper is built; schema errors from the
    /// stages otherwise.
    pub fn row_mapper(&self, input: &Schema) -> Result<CompositeRowMapper> {
        if let Some((i, transform)) = self
            .transforms
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_row_to_row_mapper())
        {
            return Err(ChainError::CapabilityViolation(format!(
                "stage {i} ({}) is not a row-to-row mapper",
                transform.name()
            )));
        }
        let mut mappers = Vec::with_capacity(self.transforms.len());
        let mut schema = input.clone();
        for (i, transform) in self.transforms.iter().enumerate() {
            trace!(stage = i, name = transform.name(), "building row mapper");
            let mapper = transform
                .row_mapper(&schema)
                .map_err(|e| e.at_stage(i, transform.name()))?;
            schema = mapper.output_schema().clone();
            mappers.push(mapper);
        }
        CompositeRowMapper::new(input.clone(), mappers)
    }

    /// Save this chain under [`DEFAULT_MODEL_NAME`].
    pub fn save(&self, container: &mut ModelContainer) -> Result<()> {
        self.save_named(container, DEFAULT_MODEL_NAME)
    }

    /// Save this chain under `name`.
    pub fn save_named(&self, container: &mut ModelContainer, name: &str) -> Result<()> {
        save_entity(container, name, self)
    }

    /// Save this chain as `config.model_name` into a new container file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, config: &ContainerConfig) -> Result<()> {
        let mut container = ModelContainer::new();
        self.save_named(&mut container, &config.model_name)?;
        container.save_to_file(path)
    }
}

const CHAIN_VERSION: VersionInfo =
    VersionInfo::new("TRANCHAI", 0x0001_0001, 0x0001_0001, 0x0001_0001, "TransformerChain");

impl<L: ?Sized + Transform> Transform for TransformerChain<L> {
    fn version_info(&self) -> VersionInfo {
        CHAIN_VERSION
    }

    fn output_schema(&self, input: &Schema) -> Result<Schema> {
        TransformerChain::output_schema(self, input)
    }

    fn is_row_to_row_mapper(&self) -> bool {
        TransformerChain::is_row_to_row_mapper(self)
    }

    fn row_mapper(&self, input: &Schema) -> Result<Arc<dyn RowMapper>> {
        Ok(Arc::new(TransformerChain::row_mapper(self, input)?))
    }

    fn apply(&self, input: Arc<dyn DataView>) -> Result<Arc<dyn DataView>> {
        self.transform(input)
    }

    /// Payload: stage count, then per stage its scope bits; each stage is
    /// stored in its own section `Transform_NNN`.
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<()> {
        ctx.write(&(self.len() as u32))?;
        for (i, (transform, scope)) in self.iter().enumerate() {
            ctx.write(&scope.bits())?;
            ctx.save_model(&transform_section(i), transform.as_ref())?;
        }
        debug!(section = ctx.section(), stages = self.len(), "saved transformer chain");
        Ok(())
    }
}

impl LoadableTransform for TransformerChain {
    const VERSION: VersionInfo = CHAIN_VERSION;

    fn load(ctx: &mut LoadContext<'_>) -> Result<Self> {
        let count: u32 = ctx.read()?;
        let mut transforms = Vec::with_capacity(count.min(1024) as usize);
        let mut scopes = Vec::with_capacity(count.min(1024) as usize);
        for i in 0..count as usize {
            let bits: u32 = ctx.read()?;
            let scope = Scope::from_bits(bits).ok_or_else(|| {
                ChainError::Serialization(format!("invalid scope bits {bits:#x} at stage {i}"))
            })?;
            scopes.push(scope);
            transforms.push(ctx.load_model(&transform_section(i))?);
        }
        debug!(section = ctx.section(), stages = transforms.len(), "loaded transformer chain");
        TransformerChain::new(transforms, scopes)
    }
}

impl<L: ?Sized + Transform> Clone for TransformerChain<L> {
    fn clone(&self) -> Self {
        Self {
            transforms: self.transforms.clone(),
            scopes: self.scopes.clone(),
            last: self.last.clone(),
        }
    }
}

impl<L: ?Sized + Transform> fmt::Debug for TransformerChain<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.iter()
                    .map(|(transform, scope)| format!("{}@{}", transform.name(), scope)),
            )
            .finish()
    }
}

impl Default for TransformerChain {
    fn default() -> Self {
        Self::empty()
    }
}
