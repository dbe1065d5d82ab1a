//! Titanic-style feature chain: fit, persist, reload for scoring.
//!
//! This example demonstrates:
//! - Fitting an estimator chain with a training-only row filter
//! - Saving the fitted chain to a container file
//! - Reloading it and keeping only the stages scoring needs
//! - Scoring rows through one fused row mapper
//!
//! Run with `RUST_LOG=debug` to see chain and persistence events.

use ml_chain::chain::{EstimatorChain, TransformEstimator};
use ml_chain::dataset::{all_active, DataView, InMemoryData, Value};
use ml_chain::persist::{ContainerConfig, TransformRegistry};
use ml_chain::schema::{ColumnType, Schema};
use ml_chain::scope::Scope;
use ml_chain::transforms::{Concat, DropMissing, SelectColumns, StandardScaler};
use ml_chain::{RowMapper, TransformerChain};
use std::error::Error;
use std::sync::Arc;

/// Passenger rows; `age` is sometimes missing.
fn create_titanic_data() -> Result<InMemoryData, Box<dyn Error>> {
    let schema = Schema::from_pairs([
        ("pclass", ColumnType::Int),
        ("sex", ColumnType::Int),
        ("age", ColumnType::Float),
        ("fare", ColumnType::Float),
        ("name", ColumnType::Text),
    ]);
    let raw: [(i64, i64, Option<f64>, f64, &str); 8] = [
        (3, 0, Some(22.0), 7.25, "Braund"),
        (1, 1, Some(38.0), 71.28, "Cumings"),
        (3, 1, Some(26.0), 7.92, "Heikkinen"),
        (1, 1, Some(35.0), 53.10, "Futrelle"),
        (3, 0, None, 8.05, "Allen"),
        (3, 0, None, 8.46, "Moran"),
        (1, 0, Some(54.0), 51.86, "McCarthy"),
        (3, 0, Some(2.0), 21.08, "Palsson"),
    ];
    let rows = raw
        .iter()
        .map(|&(pclass, sex, age, fare, name)| {
            vec![
                Value::Int(pclass),
                Value::Int(sex),
                age.map(Value::Float).unwrap_or(Value::Missing),
                Value::Float(fare),
                Value::Text(name.to_string()),
            ]
        })
        .collect();
    Ok(InMemoryData::new(schema, rows)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Scoring Chain Example ===\n");

    let data: Arc<dyn DataView> = Arc::new(create_titanic_data()?);
    println!("Input schema: {}", data.schema());

    // 1. Fit
    let fitted = EstimatorChain::new()
        .append_scoped(
            TransformEstimator::new(DropMissing::new(["age"])),
            Scope::TRAINING,
        )
        .append(StandardScaler::new("age"))
        .append(StandardScaler::new("fare"))
        .append(TransformEstimator::new(Concat::new(
            "features",
            ["pclass", "sex", "age", "fare"],
        )))
        .append(TransformEstimator::new(SelectColumns::new(["features", "name"])))
        .fit(&data)?;
    println!("\nFitted chain: {fitted:?}");

    // 2. Persist
    let dir = std::env::temp_dir().join("ml-chain-example");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("titanic_chain.bin");
    let config = ContainerConfig::new().with_model_name("Titanic");
    fitted.model_for(Scope::SCORING).save_to_file(&path, &config)?;
    println!("Saved scoring chain to {}", path.display());

    // 3. Reload
    let registry = TransformRegistry::with_builtins();
    let scoring = TransformerChain::load_from_file(&path, &registry, &config)?;
    println!("Reloaded chain: {scoring:?}");

    // 4. Score through one fused mapper
    let mapper = scoring.row_mapper(data.schema())?;
    println!("\nOutput schema: {}", mapper.output_schema());
    let active = all_active(mapper.output_schema().len());
    for row in data.rows() {
        let out = mapper.map_row(&row?, &active)?;
        if let (Value::Vector(features), Value::Text(name)) = (&out[0], &out[1]) {
            let shown: Vec<String> = features.iter().map(|x| format!("{x:>6.2}")).collect();
            println!("  {name:<10} [{}]", shown.join(", "));
        }
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
