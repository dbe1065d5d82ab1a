//! Reference chains over [`passenger_schema`](crate::data::passenger_schema).

use ml_chain::chain::{EstimatorChain, TransformEstimator, TransformerChain};
use ml_chain::dataset::DataView;
use ml_chain::error::Result;
use ml_chain::scope::Scope;
use ml_chain::transforms::{
    Concat, CopyColumns, DropMissing, SelectColumns, StandardScale, StandardScaler,
};
use std::sync::Arc;

/// A fixed, row-to-row feature chain.
pub fn feature_chain() -> TransformerChain {
    TransformerChain::empty()
        .append(CopyColumns::new([("age", "age_raw")]))
        .append(StandardScale::new("age", 30.0, 14.0))
        .append(StandardScale::new("fare", 32.0, 50.0))
        .append(Concat::new("features", ["age", "fare", "class", "siblings"]))
        .append(SelectColumns::new(["features", "age_raw"]))
        .into_generic()
}

/// The same features, fitted on `data`, with a training-only row filter.
pub fn fitted_feature_chain(data: &Arc<dyn DataView>) -> Result<TransformerChain> {
    EstimatorChain::new()
        .append_scoped(
            TransformEstimator::new(DropMissing::new(["age"])),
            Scope::TRAINING,
        )
        .append(TransformEstimator::new(CopyColumns::new([("age", "age_raw")])))
        .append(StandardScaler::new("age"))
        .append(StandardScaler::new("fare"))
        .append(TransformEstimator::new(Concat::new(
            "features",
            ["age", "fare", "class", "siblings"],
        )))
        .append(TransformEstimator::new(SelectColumns::new([
            "features", "age_raw",
        ])))
        .fit(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{passenger_schema, synthetic_passengers};

    #[test]
    fn test_feature_chain_is_row_to_row() {
        let chain = feature_chain();
        assert!(chain.is_row_to_row_mapper());
        let output = chain.output_schema(&passenger_schema()).unwrap();
        assert_eq!(output.names(), vec!["features", "age_raw"]);
    }

    #[test]
    fn test_fitted_chain_scores_without_filter() {
        let data: Arc<dyn DataView> = Arc::new(synthetic_passengers(100, 3).unwrap());
        let fitted = fitted_feature_chain(&data).unwrap();
        assert!(!fitted.is_row_to_row_mapper());
        assert!(fitted.model_for(Scope::SCORING).is_row_to_row_mapper());
    }
}
