//! Benchmark utilities for ml-chain.
//!
//! This library provides:
//!
//! - Deterministic synthetic data
//! - Reference chains shared by the benches and the comparison binary
//! - Timing utilities

pub mod chains;
pub mod data;
pub mod utils;

pub use chains::{feature_chain, fitted_feature_chain};
pub use data::{passenger_schema, synthetic_passengers, Lcg};
pub use utils::{benchmark_with_warmup, time_fn, BenchmarkStats};
