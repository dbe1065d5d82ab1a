//! Synthetic passenger-style data for benchmarks.

use ml_chain::dataset::{InMemoryData, Value};
use ml_chain::error::Result;
use ml_chain::schema::{ColumnType, Schema};

/// Deterministic linear congruential generator, so runs are comparable.
#[derive(Debug, Clone)]
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Schema of [`synthetic_passengers`].
pub fn passenger_schema() -> Schema {
    Schema::from_pairs([
        ("age", ColumnType::Float),
        ("fare", ColumnType::Float),
        ("class", ColumnType::Int),
        ("siblings", ColumnType::Int),
        ("name", ColumnType::Text),
    ])
}

/// `rows` rows of passenger data; about one age in five is missing.
pub fn synthetic_passengers(rows: usize, seed: u64) -> Result<InMemoryData> {
    let mut rng = Lcg::new(seed);
    let data = (0..rows)
        .map(|i| {
            let age = if rng.next_f64() < 0.2 {
                Value::Missing
            } else {
                Value::Float((rng.next_f64() * 70.0).round() + 1.0)
            };
            vec![
                age,
                Value::Float(rng.next_f64() * 200.0),
                Value::Int(1 + (rng.next_f64() * 3.0) as i64),
                Value::Int((rng.next_f64() * 4.0) as i64),
                Value::Text(format!("passenger-{i}")),
            ]
        })
        .collect();
    InMemoryData::new(passenger_schema(), data)
}
