//! # ml-chain
//!
//! Composable, scope-tagged chains of data transforms with schema validation,
//! fused row mapping and versioned persistence.
//!
//! ## Core Design Principles
//!
//! - **Immutable Chains**: A [`TransformerChain`] never changes after
//!   construction. Appending or filtering returns a new chain sharing the same
//!   transforms.
//! - **Schema First**: A chain's output schema is computed and validated
//!   before any row is read, so misconfigured chains fail fast.
//! - **Lazy Data**: Applying a chain builds views; rows are computed only when
//!   a cursor pulls them, and only for the columns it asks for.
//! - **Scoped Stages**: Every stage carries a [`Scope`] (training, testing,
//!   scoring), so one chain can be trimmed to what a given phase needs.
//! - **Versioned Persistence**: Every persisted entity carries a header with
//!   its signature and versions; readers reject formats they do not know
//!   before touching the payload.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ml_chain::chain::{EstimatorChain, TransformEstimator};
//! use ml_chain::dataset::{materialize, DataView, InMemoryData, Value};
//! use ml_chain::persist::{ModelContainer, TransformRegistry};
//! use ml_chain::schema::{ColumnType, Schema};
//! use ml_chain::scope::Scope;
//! use ml_chain::transforms::{Concat, DropMissing, StandardScaler};
//! use ml_chain::TransformerChain;
//!
//! let schema = Schema::from_pairs([("age", ColumnType::Float), ("fare", ColumnType::Float)]);
//! let rows = vec![
//!     vec![Value::Float(22.0), Value::Float(7.25)],
//!     vec![Value::Missing, Value::Float(71.3)],
//!     vec![Value::Float(38.0), Value::Float(8.05)],
//! ];
//! let data: Arc<dyn DataView> = Arc::new(InMemoryData::new(schema, rows).unwrap());
//!
//! // Fit: drop incomplete rows during training only, then scale and concat.
//! let fitted = EstimatorChain::new()
//!     .append_scoped(TransformEstimator::new(DropMissing::new(["age"])), Scope::TRAINING)
//!     .append(StandardScaler::new("age"))
//!     .append(TransformEstimator::new(Concat::new("features", ["age", "fare"])))
//!     .fit(&data)
//!     .unwrap();
//!
//! // Persist, reload, and keep only what scoring needs.
//! let mut container = ModelContainer::new();
//! fitted.save(&mut container).unwrap();
//! let registry = TransformRegistry::with_builtins();
//! let loaded = TransformerChain::load(&container, &registry).unwrap();
//! let scoring = loaded.model_for(Scope::SCORING);
//! assert_eq!(scoring.len(), 2);
//! assert!(scoring.is_row_to_row_mapper());
//!
//! let scored = materialize(scoring.transform(data).unwrap().as_ref()).unwrap();
//! assert_eq!(scored.row_count(), Some(3));
//! ```
//!
//! ## Module Structure
//!
//! - `schema` — Column types and schemas
//! - `dataset` — Lazy data views and in-memory data
//! - `scope` — Stage scope flags and the filtering predicate
//! - `transform` — The `Transform` and `RowMapper` contracts
//! - `chain` — Transformer chains, fused row mappers and estimator chains
//! - `persist` — Model containers, headers, version checks and the registry
//! - `transforms` — Built-in transforms
//! - `error` — The crate error type

/// Ordered transform composition, fused row mapping and fitting.
pub mod chain;

/// Data views and in-memory data.
pub mod dataset;

pub mod error;

/// Versioned persistence of transforms and chains.
pub mod persist;

/// Column types and schemas.
pub mod schema;

/// Stage scopes.
pub mod scope;

/// The capability contract of a chain stage.
pub mod transform;

/// Built-in transforms.
pub mod transforms;

pub use chain::{CompositeRowMapper, Estimator, EstimatorChain, TransformerChain};
pub use error::{ChainError, Result};
pub use scope::Scope;
pub use transform::{LoadableTransform, RowMapper, Transform};
