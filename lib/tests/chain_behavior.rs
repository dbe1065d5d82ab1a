mod common;

use common::{passengers_view, same_allocation, CountingView};
use ml_chain::chain::{EstimatorChain, TransformEstimator};
use ml_chain::dataset::{all_active, materialize, DataView, Value};
use ml_chain::schema::ColumnType;
use ml_chain::transforms::{
    Concat, CopyColumns, DropMissing, SelectColumns, StandardScale, StandardScaler,
};
use ml_chain::{ChainError, RowMapper, Scope, TransformerChain};
use std::sync::Arc;

fn feature_chain() -> TransformerChain<SelectColumns> {
    TransformerChain::empty()
        .append(CopyColumns::new([("age", "age_raw")]))
        .append(StandardScale::new("age", 30.0, 8.0))
        .append(Concat::new("features", ["age", "fare", "class"]))
        .append(SelectColumns::new(["features", "age_raw", "name"]))
}

#[test]
fn test_schema_mismatch_reported_before_any_row_is_read() {
    let counting = Arc::new(CountingView::new(passengers_view()));
    let chain = TransformerChain::empty()
        .append(CopyColumns::new([("age", "age2")]))
        .append(StandardScale::new("name", 0.0, 1.0));

    let err = chain
        .transform(counting.clone() as Arc<dyn DataView>)
        .err()
        .expect("text column cannot be scaled");
    match err {
        ChainError::SchemaMismatch {
            stage, transform, ..
        } => {
            assert_eq!(stage, Some(1));
            assert_eq!(transform.as_deref(), Some("StandardScale"));
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
    assert_eq!(counting.cursors(), 0);
    assert_eq!(counting.rows(), 0);
}

fn rejecting_stage(chain: &TransformerChain) -> (Option<usize>, Option<String>) {
    match chain.output_schema(passengers_view().schema()) {
        Err(ChainError::SchemaMismatch {
            stage, transform, ..
        }) => (stage, transform),
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn test_configuration_rejections_name_their_stage() {
    let repeated_select = TransformerChain::empty()
        .append(CopyColumns::new([("age", "a")]))
        .append(SelectColumns::new(["a", "a"]))
        .into_generic();
    assert_eq!(
        rejecting_stage(&repeated_select),
        (Some(1), Some("SelectColumns".to_string()))
    );

    let empty_concat = TransformerChain::empty()
        .append(CopyColumns::new([("age", "a")]))
        .append(StandardScale::new("a", 0.0, 1.0))
        .append(Concat::new("f", Vec::<String>::new()))
        .into_generic();
    assert_eq!(
        rejecting_stage(&empty_concat),
        (Some(2), Some("Concat".to_string()))
    );

    let repeated_concat = TransformerChain::empty()
        .append(Concat::new("f", ["age", "age"]))
        .into_generic();
    assert_eq!(
        rejecting_stage(&repeated_concat),
        (Some(0), Some("Concat".to_string()))
    );
}

#[test]
fn test_transform_is_lazy() {
    let counting = Arc::new(CountingView::new(passengers_view()));
    let view = feature_chain()
        .transform(counting.clone() as Arc<dyn DataView>)
        .unwrap();
    assert_eq!(counting.cursors(), 0);

    let out = materialize(view.as_ref()).unwrap();
    assert_eq!(out.row_count(), Some(4));
    assert_eq!(counting.cursors(), 1);
    assert_eq!(counting.rows(), 4);
}

#[test]
fn test_composite_matches_stage_by_stage() {
    let data = passengers_view();
    let chain = feature_chain();

    let staged = materialize(chain.transform(data.clone()).unwrap().as_ref()).unwrap();

    let composite = chain.row_mapper(data.schema()).unwrap();
    assert_eq!(composite.output_schema(), staged.schema());
    let active = all_active(composite.output_schema().len());
    let fused: Vec<_> = data
        .rows()
        .map(|row| composite.map_row(&row.unwrap(), &active).unwrap())
        .collect();

    // NaN slots compare unequal, so compare renderings.
    assert_eq!(format!("{fused:?}"), format!("{:?}", staged.into_rows()));
}

#[test]
fn test_composite_only_reads_needed_inputs() {
    let data = passengers_view();
    let composite = feature_chain().row_mapper(data.schema()).unwrap();
    // features only
    assert_eq!(
        composite.dependencies(&[true, false, false]),
        vec![true, true, true, false]
    );
    // age_raw only
    assert_eq!(
        composite.dependencies(&[false, true, false]),
        vec![true, false, false, false]
    );
    assert_eq!(
        composite.dependencies(&[false, false, false]),
        vec![false, false, false, false]
    );
}

#[test]
fn test_partial_cursor_leaves_other_columns_missing() {
    let view = feature_chain().transform(passengers_view()).unwrap();
    let rows: Vec<_> = view
        .cursor(&[false, true, false])
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows[0], vec![Value::Missing, Value::Float(22.0), Value::Missing]);
}

#[test]
fn test_feature_values() {
    let out = materialize(feature_chain().transform(passengers_view()).unwrap().as_ref()).unwrap();
    assert_eq!(
        out.schema().column("features").unwrap().ty,
        ColumnType::Vector { len: 3 }
    );
    assert_eq!(out.row(0).unwrap()[0], Value::Vector(vec![-1.0, 7.25, 3.0]));
    match &out.row(2).unwrap()[0] {
        Value::Vector(v) => assert!(v[0].is_nan()),
        other => panic!("expected vector, got {other:?}"),
    }
}

#[test]
fn test_scope_scenario() {
    let chain = TransformerChain::empty()
        .append_scoped(CopyColumns::new([("age", "t1")]), Scope::TRAINING)
        .append_scoped(CopyColumns::new([("fare", "t2")]), Scope::SCORING);

    let scoring = chain.model_for(Scope::SCORING);
    assert_eq!(scoring.len(), 1);
    assert!(same_allocation(&scoring.transforms()[0], &chain.transforms()[1]));

    let train_test = chain.model_for(Scope::TRAIN_TEST);
    assert_eq!(train_test.len(), 1);
    assert!(same_allocation(&train_test.transforms()[0], &chain.transforms()[0]));

    let both = chain.model_for(Scope::TRAINING | Scope::SCORING);
    assert_eq!(both.len(), 2);

    let schema = scoring.output_schema(passengers_view().schema()).unwrap();
    assert!(schema.column("t2").is_some());
    assert!(schema.column("t1").is_none());
}

#[test]
fn test_chain_nested_as_a_stage() {
    let inner = TransformerChain::empty()
        .append(CopyColumns::new([("age", "a2")]))
        .append(StandardScale::new("a2", 30.0, 8.0));
    let outer = TransformerChain::empty()
        .append(inner)
        .append(SelectColumns::new(["a2"]));

    assert!(outer.is_row_to_row_mapper());
    assert_eq!(outer.last_transform().unwrap().columns(), &["a2".to_string()]);
    let out = materialize(outer.transform(passengers_view()).unwrap().as_ref()).unwrap();
    assert_eq!(out.row(1).unwrap(), &vec![Value::Float(1.0)]);

    // errors keep the innermost stage
    let broken = TransformerChain::empty().append(
        TransformerChain::empty()
            .append(CopyColumns::new([("age", "a2")]))
            .append(StandardScale::new("name", 0.0, 1.0)),
    );
    match broken.output_schema(passengers_view().schema()) {
        Err(ChainError::SchemaMismatch { stage, .. }) => assert_eq!(stage, Some(1)),
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn test_fit_then_score() {
    let data = passengers_view();
    let fitted = EstimatorChain::new()
        .append_scoped(
            TransformEstimator::new(DropMissing::new(["age"])),
            Scope::TRAINING,
        )
        .append(StandardScaler::new("age"))
        .append(TransformEstimator::new(Concat::new("features", ["age", "fare"])))
        .fit(&data)
        .unwrap();

    assert_eq!(fitted.scopes(), &[Scope::TRAINING, Scope::EVERYTHING, Scope::EVERYTHING]);
    assert!(!fitted.is_row_to_row_mapper());

    let training = materialize(fitted.transform(data.clone()).unwrap().as_ref()).unwrap();
    assert_eq!(training.row_count(), Some(3));

    let scoring = fitted.model_for(Scope::SCORING);
    assert!(scoring.is_row_to_row_mapper());
    let scored = materialize(scoring.transform(data).unwrap().as_ref()).unwrap();
    assert_eq!(scored.row_count(), Some(4));

    // mean of 22, 38, 35 is 31.666..; scaled values of the kept rows sum to zero
    let sum: f64 = training
        .into_rows()
        .iter()
        .map(|row| row[0].as_f64().unwrap())
        .sum();
    assert!(sum.abs() < 1e-9);
}

#[test]
fn test_row_mapper_refused_when_a_stage_filters_rows() {
    let chain = feature_chain().append(DropMissing::new(["age_raw"]));
    let err = chain.row_mapper(passengers_view().schema()).unwrap_err();
    assert!(matches!(err, ChainError::CapabilityViolation(_)));
    // the lazy path still works
    let out = materialize(chain.transform(passengers_view()).unwrap().as_ref()).unwrap();
    assert_eq!(out.row_count(), Some(3));
}
