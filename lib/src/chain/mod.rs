//! Transform chains: composition, scope filtering, fused row mapping and
//! fitting.

pub mod composite;
pub mod estimator;
pub mod transformer_chain;

pub use composite::CompositeRowMapper;
pub use estimator::{Estimator, EstimatorChain, TransformEstimator};
pub use transformer_chain::TransformerChain;
