//! Trainable counterparts of chains.
//!
//! An [`Estimator`] learns a [`Transform`] from data. An [`EstimatorChain`]
//! fits its estimators in order, feeding each one the lazily transformed
//! output of everything fitted before it, and yields a [`TransformerChain`]
//! with the same scopes.

use crate::chain::TransformerChain;
use crate::dataset::DataView;
use crate::error::Result;
use crate::scope::Scope;
use crate::transform::Transform;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Something that learns a transform from training data.
pub trait Estimator: Send + Sync + fmt::Debug {
    /// Learn a transform from `data`.
    ///
    /// # Errors
    /// Schema errors when `data` lacks what the estimator needs, or
    /// [`ChainError::EmptyData`](crate::error::ChainError::EmptyData) when
    /// there is nothing to learn from.
    fn fit(&self, data: &Arc<dyn DataView>) -> Result<Arc<dyn Transform>>;

    /// Short name used in errors and logs.
    fn name(&self) -> &str {
        "Estimator"
    }
}

/// An estimator that always yields the same, already built transform.
#[derive(Debug, Clone)]
pub struct TransformEstimator {
    transform: Arc<dyn Transform>,
}

impl TransformEstimator {
    pub fn new<T: Transform + 'static>(transform: T) -> Self {
        Self {
            transform: Arc::new(transform),
        }
    }

    pub fn from_shared(transform: Arc<dyn Transform>) -> Self {
        Self { transform }
    }
}

impl Estimator for TransformEstimator {
    fn fit(&self, data: &Arc<dyn DataView>) -> Result<Arc<dyn Transform>> {
        // Schema check only; the transform itself is fixed.
        self.transform.output_schema(data.schema())?;
        Ok(self.transform.clone())
    }

    fn name(&self) -> &str {
        self.transform.name()
    }
}

/// An ordered, scope-tagged list of estimators.
#[derive(Clone, Default)]
pub struct EstimatorChain {
    estimators: Vec<Arc<dyn Estimator>>,
    scopes: Vec<Scope>,
}

impl EstimatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty()
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Append `estimator` with [`Scope::EVERYTHING`].
    pub fn append<E: Estimator + 'static>(&self, estimator: E) -> Self {
        self.append_scoped(estimator, Scope::EVERYTHING)
    }

    /// Append `estimator` tagged with `scope`; the receiver is unchanged.
    pub fn append_scoped<E: Estimator + 'static>(&self, estimator: E, scope: Scope) -> Self {
        let mut next = self.clone();
        next.estimators.push(Arc::new(estimator));
        next.scopes.push(scope);
        next
    }

    /// Fit every estimator in order.
    ///
    /// Estimator `i` sees `data` transformed by the transforms fitted for
    /// estimators `0..i`. Training data is never materialized between
    /// stages.
    pub fn fit(&self, data: &Arc<dyn DataView>) -> Result<TransformerChain> {
        debug!(stages = self.len(), "fitting estimator chain");
        let mut transforms = Vec::with_capacity(self.len());
        let mut current = data.clone();
        for (i, estimator) in self.estimators.iter().enumerate() {
            trace!(stage = i, name = estimator.name(), "fitting stage");
            let transform = estimator
                .fit(&current)
                .map_err(|e| e.at_stage(i, estimator.name()))?;
            if i + 1 < self.estimators.len() {
                current = transform
                    .apply(current)
                    .map_err(|e| e.at_stage(i, transform.name()))?;
            }
            transforms.push(transform);
        }
        TransformerChain::new(transforms, self.scopes.clone())
    }
}

impl fmt::Debug for EstimatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimatorChain")
            .field("estimators", &self.estimators)
            .field("scopes", &self.scopes)
            .finish()
    }
}
