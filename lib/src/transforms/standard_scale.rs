//! Standard scaling (Z-score normalization) of one numeric column.
//!
//! The standard score of a value `x` is
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the training values and `s` their population
//! standard deviation.
//!
//! [`StandardScaler`] is the estimator that learns `u` and `s`;
//! [`StandardScale`] is the fitted transform that applies them.
//!
//! # Example
//! ```rust
//! use std::sync::Arc;
//! use ml_chain::chain::Estimator;
//! use ml_chain::dataset::{DataView, InMemoryData, Value};
//! use ml_chain::schema::{ColumnType, Schema};
//! use ml_chain::transform::Transform;
//! use ml_chain::transforms::StandardScaler;
//!
//! let schema = Schema::from_pairs([("x", ColumnType::Float)]);
//! let rows = vec![vec![Value::Float(1.0)], vec![Value::Float(3.0)]];
//! let data: Arc<dyn DataView> = Arc::new(InMemoryData::new(schema, rows).unwrap());
//!
//! let fitted = StandardScaler::new("x").fit(&data).unwrap();
//! assert_eq!(fitted.name(), "StandardScale");
//! ```

use crate::chain::Estimator;
use crate::dataset::{DataView, Value};
use crate::error::{ChainError, Result};
use crate::persist::{LoadContext, SaveContext, VersionInfo};
use crate::schema::{Column, ColumnType, Schema};
use crate::transform::{LoadableTransform, RowMapper, Transform};
use crate::transforms::plan::{ColumnPlan, Derive};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Payload layout before `config` was persisted.
const VERSION_WITHOUT_CONFIG: u32 = 0x0001_0001;
const VERSION_WITH_CONFIG: u32 = 0x0001_0002;

/// Configuration for [`StandardScaler`] and [`StandardScale`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// If true, center values by the mean.
    pub with_mean: bool,
    /// If true, scale values to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Payload written by current builds.
#[derive(Serialize, Deserialize)]
struct StandardScaleParams {
    column: String,
    config: StandardScalerConfig,
    mean: f64,
    std: f64,
}

/// Payload written before `config` existed; both steps were always on.
#[derive(Serialize, Deserialize)]
struct StandardScaleParamsV1 {
    column: String,
    mean: f64,
    std: f64,
}

/// Fitted standard scaling of one `Int` or `Float` column.
///
/// The column is replaced in place by a `Float` column. Missing values stay
/// missing.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardScale {
    column: String,
    config: StandardScalerConfig,
    mean: f64,
    std: f64,
}

impl StandardScale {
    /// Scale `column` with fixed statistics. A zero `std` is treated as 1.
    pub fn new(column: impl Into<String>, mean: f64, std: f64) -> Self {
        Self::with_config(column, StandardScalerConfig::default(), mean, std)
    }

    pub fn with_config(
        column: impl Into<String>,
        config: StandardScalerConfig,
        mean: f64,
        std: f64,
    ) -> Self {
        Self {
            column: column.into(),
            config,
            mean,
            std: if std == 0.0 { 1.0 } else { std },
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn config(&self) -> StandardScalerConfig {
        self.config
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std(&self) -> f64 {
        self.std
    }

    /// Scale one value.
    pub fn scale(&self, x: f64) -> f64 {
        let mut z = x;
        if self.config.with_mean {
            z -= self.mean;
        }
        if self.config.with_std {
            z /= self.std;
        }
        z
    }

    /// Undo [`scale`](StandardScale::scale).
    pub fn inverse(&self, z: f64) -> f64 {
        let mut x = z;
        if self.config.with_std {
            x *= self.std;
        }
        if self.config.with_mean {
            x += self.mean;
        }
        x
    }

    fn plan(&self, input: &Schema) -> Result<(ColumnPlan, usize)> {
        let (index, _) =
            input.require_type(&self.column, "Int or Float", ColumnType::is_scalar_numeric)?;
        let mut plan = ColumnPlan::passthrough(input);
        plan.derive(
            Column::new(self.column.clone(), ColumnType::Float),
            0,
            vec![index],
        );
        Ok((plan, index))
    }
}

struct ScaleValues {
    scale: StandardScale,
    index: usize,
}

impl Derive for ScaleValues {
    fn derive(&self, _id: usize, row: &[Value]) -> Result<Value> {
        match &row[self.index] {
            Value::Missing => Ok(Value::Missing),
            value => value
                .as_f64()
                .map(|x| Value::Float(self.scale.scale(x)))
                .ok_or_else(|| {
                    ChainError::InvalidData(format!(
                        "column '{}' holds non-numeric {value:?}",
                        self.scale.column
                    ))
                }),
        }
    }
}

impl Transform for StandardScale {
    fn version_info(&self) -> VersionInfo {
        Self::VERSION
    }

    fn output_schema(&self, input: &Schema) -> Result<Schema> {
        Ok(self.plan(input)?.0.output().clone())
    }

    fn is_row_to_row_mapper(&self) -> bool {
        true
    }

    fn row_mapper(&self, input: &Schema) -> Result<Arc<dyn RowMapper>> {
        let (plan, index) = self.plan(input)?;
        Ok(Arc::new(plan.into_mapper(ScaleValues {
            scale: self.clone(),
            index,
        })))
    }

    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<()> {
        ctx.write(&StandardScaleParams {
            column: self.column.clone(),
            config: self.config,
            mean: self.mean,
            std: self.std,
        })
    }
}

impl LoadableTransform for StandardScale {
    const VERSION: VersionInfo = VersionInfo::new(
        "STDSCALE",
        VERSION_WITH_CONFIG,
        VERSION_WITH_CONFIG,
        VERSION_WITHOUT_CONFIG,
        "StandardScale",
    );

    fn load(ctx: &mut LoadContext<'_>) -> Result<Self> {
        if ctx.header().version_written < VERSION_WITH_CONFIG {
            let params: StandardScaleParamsV1 = ctx.read()?;
            return Ok(Self::new(params.column, params.mean, params.std));
        }
        let params: StandardScaleParams = ctx.read()?;
        Ok(Self::with_config(
            params.column,
            params.config,
            params.mean,
            params.std,
        ))
    }
}

/// Estimator learning the mean and population standard deviation of one
/// column. Missing values are skipped.
#[derive(Clone, Debug)]
pub struct StandardScaler {
    column: String,
    config: StandardScalerConfig,
}

impl StandardScaler {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            config: StandardScalerConfig::default(),
        }
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }

    /// Fit and return the concrete transform.
    pub fn fit_scale(&self, data: &dyn DataView) -> Result<StandardScale> {
        let schema = data.schema();
        let (index, _) =
            schema.require_type(&self.column, "Int or Float", ColumnType::is_scalar_numeric)?;
        let mut active = vec![false; schema.len()];
        active[index] = true;

        // Welford's online mean and variance.
        let mut count = 0u64;
        let mut mean = 0.0f64;
        let mut m2 = 0.0f64;
        for row in data.cursor(&active) {
            let row = row?;
            let value = &row[index];
            if value.is_missing() {
                continue;
            }
            let Some(x) = value.as_f64() else {
                continue;
            };
            count += 1;
            let delta = x - mean;
            mean += delta / count as f64;
            m2 += delta * (x - mean);
        }
        if count == 0 {
            return Err(ChainError::EmptyData(format!(
                "cannot fit StandardScaler: column '{}' has no values",
                self.column
            )));
        }
        let std = (m2 / count as f64).sqrt();
        debug!(column = %self.column, count, mean, std, "fitted standard scaler");

        Ok(StandardScale::with_config(
            self.column.clone(),
            self.config,
            if self.config.with_mean { mean } else { 0.0 },
            if self.config.with_std { std } else { 1.0 },
        ))
    }
}

impl Estimator for StandardScaler {
    fn fit(&self, data: &Arc<dyn DataView>) -> Result<Arc<dyn Transform>> {
        Ok(Arc::new(self.fit_scale(data.as_ref())?))
    }

    fn name(&self) -> &str {
        "StandardScaler"
    }
}
