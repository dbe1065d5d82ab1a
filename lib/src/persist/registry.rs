//! Loader-key to factory table used when reading containers.

use crate::chain::TransformerChain;
use crate::error::{ChainError, Result};
use crate::persist::context::LoadContext;
use crate::persist::version::VersionInfo;
use crate::transform::{LoadableTransform, Transform};
use crate::transforms::{Concat, CopyColumns, DropMissing, SelectColumns, StandardScale};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructor for a persisted transform, positioned after its header.
pub type TransformFactory = fn(&mut LoadContext<'_>) -> Result<Arc<dyn Transform>>;

/// One registry row.
#[derive(Clone, Copy)]
pub struct Registration {
    /// Version identity the factory understands.
    pub version: VersionInfo,
    pub factory: TransformFactory,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

fn factory_for<T: LoadableTransform>(ctx: &mut LoadContext<'_>) -> Result<Arc<dyn Transform>> {
    Ok(Arc::new(T::load(ctx)?))
}

/// Table of loaders, keyed by loader key.
///
/// Built once by the host process and then shared by reference; the
/// registration methods consume the registry, so a shared `&TransformRegistry`
/// can never change.
///
/// # Example
/// ```rust
/// use ml_chain::persist::TransformRegistry;
///
/// let registry = TransformRegistry::with_builtins();
/// assert!(registry.contains("StandardScale"));
/// assert!(registry.contains("TransformerChain"));
/// ```
#[derive(Clone, Debug)]
pub struct TransformRegistry {
    entries: HashMap<&'static str, Registration>,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformRegistry {
    /// Registry that can load chains and nothing else.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        let version = <TransformerChain as LoadableTransform>::VERSION;
        entries.insert(
            version.loader_key,
            Registration {
                version,
                factory: factory_for::<TransformerChain>,
            },
        );
        Self { entries }
    }

    /// Registry with the chain loader and every built-in transform.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for registration in [
            Self::registration::<CopyColumns>(),
            Self::registration::<SelectColumns>(),
            Self::registration::<Concat>(),
            Self::registration::<StandardScale>(),
            Self::registration::<DropMissing>(),
        ] {
            registry
                .entries
                .insert(registration.version.loader_key, registration);
        }
        registry
    }

    fn registration<T: LoadableTransform>() -> Registration {
        Registration {
            version: T::VERSION,
            factory: factory_for::<T>,
        }
    }

    /// Add a loadable transform type.
    ///
    /// # Errors
    /// [`ChainError::InvariantViolation`] if the loader key is already taken
    /// by a different format.
    pub fn register<T: LoadableTransform>(self) -> Result<Self> {
        self.register_factory(T::VERSION, factory_for::<T>)
    }

    /// Add a factory for `version.loader_key`.
    pub fn register_factory(mut self, version: VersionInfo, factory: TransformFactory) -> Result<Self> {
        if let Some(existing) = self.entries.get(version.loader_key) {
            if existing.version != version {
                return Err(ChainError::InvariantViolation(format!(
                    "loader key '{}' already registered for signature '{}'",
                    version.loader_key, existing.version.signature
                )));
            }
        }
        self.entries
            .insert(version.loader_key, Registration { version, factory });
        Ok(self)
    }

    pub fn get(&self, loader_key: &str) -> Option<&Registration> {
        self.entries.get(loader_key)
    }

    pub fn contains(&self, loader_key: &str) -> bool {
        self.entries.contains_key(loader_key)
    }

    /// Registered loader keys, sorted.
    pub fn loader_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
