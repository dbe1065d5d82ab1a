//! Quick fused-versus-staged comparison without criterion.

use benchmarks::{benchmark_with_warmup, feature_chain, synthetic_passengers};
use ml_chain::dataset::{all_active, materialize, DataView};
use ml_chain::transform::RowMapper;
use std::error::Error;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn Error>> {
    let rows = 50_000;
    let data: Arc<dyn DataView> = Arc::new(synthetic_passengers(rows, 42)?);
    let chain = feature_chain();
    let composite = chain.row_mapper(data.schema())?;
    let active = all_active(composite.output_schema().len());

    let map_all = || {
        data.rows()
            .map(|row| row.and_then(|row| composite.map_row(&row, &active)))
            .collect::<ml_chain::Result<Vec<_>>>()
    };
    let stage_all = || {
        chain
            .transform(data.clone())
            .and_then(|view| materialize(view.as_ref()))
    };

    // Run both paths once so a failing chain stops here instead of timing.
    let fused_rows = map_all()?.len();
    let staged_rows = stage_all()?.row_count();
    if fused_rows != rows || staged_rows != Some(rows) {
        return Err(format!(
            "expected {rows} rows, composite gave {fused_rows}, staged gave {staged_rows:?}"
        )
        .into());
    }

    let fused = benchmark_with_warmup(2, 10, map_all);
    let staged = benchmark_with_warmup(2, 10, stage_all);

    println!("ml-chain row mapping, {rows} rows, {} stages", chain.len());
    println!(
        "  composite mapper: {:>8.3} ms (sd {:.3})",
        fused.mean_ms, fused.std_dev_ms
    );
    println!(
        "  staged views:     {:>8.3} ms (sd {:.3})",
        staged.mean_ms, staged.std_dev_ms
    );
    println!();
    println!("For statistically sound numbers run:");
    println!("  cargo bench --package benchmarks --bench row_mapping");
    Ok(())
}
