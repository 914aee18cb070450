//! Numeric feature scaling.
//!
//! Scaled values are appended as new columns (`<source>_standard`,
//! `<source>_minmax`); the source column is never overwritten.

use crate::config::{PipelineConfig, ScalingMode, ZeroSpreadPolicy};
use crate::error::{PipelineError, Result};
use crate::utils::{f64_values, finite_values, is_numeric_dtype, mean, std_dev};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A scaling transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    /// `(x - mean) / std`, population standard deviation
    Standard,
    /// `(x - min) / (max - min)`
    MinMax,
}

impl ScalingMethod {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Standard => "_standard",
            Self::MinMax => "_minmax",
        }
    }

    /// Name of the column holding `source` scaled by this method.
    pub fn target_column(&self, source: &str) -> String {
        format!("{}{}", source, self.suffix())
    }
}

/// Ordered list of methods, each applied to the same source columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingPlan {
    pub steps: Vec<(ScalingMethod, Vec<String>)>,
}

impl ScalingPlan {
    pub fn new(mode: ScalingMode, columns: &[String]) -> Self {
        let methods: &[ScalingMethod] = match mode {
            ScalingMode::Standard => &[ScalingMethod::Standard],
            ScalingMode::MinMax => &[ScalingMethod::MinMax],
            ScalingMode::Both => &[ScalingMethod::Standard, ScalingMethod::MinMax],
        };

        Self {
            steps: methods
                .iter()
                .map(|method| (*method, columns.to_vec()))
                .collect(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.scaling, &config.scale_columns)
    }

    /// Every target column the plan will append, in order.
    pub fn target_columns(&self) -> Vec<String> {
        self.steps
            .iter()
            .flat_map(|(method, columns)| columns.iter().map(|c| method.target_column(c)))
            .collect()
    }
}

/// A column appended by the scaler, with the parameters it was fitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledColumn {
    pub source: String,
    pub target: String,
    pub method: ScalingMethod,
    /// Mean or minimum.
    pub center: f64,
    /// Standard deviation or range; 0.0 when the source has no values.
    pub scale: f64,
    /// Non-null finite values the parameters were fitted on.
    pub fitted_values: usize,
}

impl ScaledColumn {
    /// Whether the source had anything to fit on.
    pub fn has_values(&self) -> bool {
        self.fitted_values > 0
    }

    /// Whether the spread is indistinguishable from rounding noise around
    /// `center`.
    pub fn has_zero_spread(&self) -> bool {
        is_negligible_spread(self.center, self.scale)
    }
}

/// Relative tolerance under which a spread counts as zero.
const SPREAD_TOLERANCE: f64 = 10.0 * f64::EPSILON;

fn is_negligible_spread(center: f64, scale: f64) -> bool {
    scale <= SPREAD_TOLERANCE * center.abs().max(1.0)
}

/// Fits and applies a [`ScalingPlan`].
#[derive(Debug, Clone)]
pub struct Scaler {
    plan: ScalingPlan,
    zero_spread: ZeroSpreadPolicy,
}

impl Scaler {
    pub fn new(plan: ScalingPlan, zero_spread: ZeroSpreadPolicy) -> Self {
        Self { plan, zero_spread }
    }

    /// Append every scaled column of the plan to `df`.
    pub fn apply(&self, df: DataFrame) -> Result<(DataFrame, Vec<ScaledColumn>)> {
        let mut df = df;
        let mut scaled_columns = Vec::new();

        info!("Scaling {} columns...", self.plan.target_columns().len());

        for (method, columns) in &self.plan.steps {
            for source in columns {
                let series = df
                    .column(source)
                    .map_err(|_| PipelineError::ColumnNotFound(source.clone()))?
                    .as_materialized_series();

                let target = method.target_column(source);
                if df.get_column_index(&target).is_some() {
                    return Err(PipelineError::ScalingFailed {
                        column: source.clone(),
                        reason: format!("output column '{}' already exists", target),
                    });
                }

                let descriptor = fit(*method, source, series)?;
                let scaled = self.transform(series, &descriptor)?;
                df.with_column(scaled)?;

                debug!(
                    "'{}' -> '{}' (center {:.4}, scale {:.4})",
                    descriptor.source, descriptor.target, descriptor.center, descriptor.scale
                );
                scaled_columns.push(descriptor);
            }
        }

        Ok((df, scaled_columns))
    }

    fn transform(&self, series: &Series, descriptor: &ScaledColumn) -> Result<Series> {
        let zero_value = match self.zero_spread {
            ZeroSpreadPolicy::Zero => Some(0.0),
            ZeroSpreadPolicy::Null => None,
        };

        let scaled: Vec<Option<f64>> = f64_values(series)?
            .into_iter()
            .map(|opt| {
                opt.and_then(|v| {
                    if descriptor.has_zero_spread() {
                        zero_value
                    } else {
                        Some((v - descriptor.center) / descriptor.scale)
                    }
                })
            })
            .collect();

        Ok(Series::new(descriptor.target.as_str().into(), scaled))
    }
}

/// Compute the center and scale of `series` for `method`.
fn fit(method: ScalingMethod, source: &str, series: &Series) -> Result<ScaledColumn> {
    if !is_numeric_dtype(series.dtype()) {
        return Err(PipelineError::TypeConversionFailed {
            column: source.to_string(),
            target_type: "Float64".to_string(),
            reason: format!("cannot scale a {} column", series.dtype()),
        });
    }

    // every input is null, so the output is all-null whatever the parameters
    let values = finite_values(series)?;
    if values.is_empty() {
        warn!("'{}' has no values to scale", source);
        return Ok(ScaledColumn {
            source: source.to_string(),
            target: method.target_column(source),
            method,
            center: 0.0,
            scale: 0.0,
            fitted_values: 0,
        });
    }

    let (center, scale) = match method {
        ScalingMethod::Standard => {
            let center = mean(&values).unwrap_or(0.0);
            (center, std_dev(&values, 0).unwrap_or(0.0))
        }
        ScalingMethod::MinMax => {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (min, max - min)
        }
    };

    if is_negligible_spread(center, scale) {
        warn!(
            "'{}' has no spread, {:?} scaling falls back to the zero-spread policy",
            source, method
        );
    }

    Ok(ScaledColumn {
        source: source.to_string(),
        target: method.target_column(source),
        method,
        center,
        scale,
        fitted_values: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
        df.column(column)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    fn scaler(mode: ScalingMode, columns: &[&str]) -> Scaler {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        Scaler::new(ScalingPlan::new(mode, &columns), ZeroSpreadPolicy::Zero)
    }

    #[test]
    fn test_plan_from_mode() {
        let columns = vec!["durata_min".to_string(), "anul_lansarii".to_string()];
        let plan = ScalingPlan::new(ScalingMode::Both, &columns);

        assert_eq!(
            plan.target_columns(),
            vec![
                "durata_min_standard",
                "anul_lansarii_standard",
                "durata_min_minmax",
                "anul_lansarii_minmax",
            ]
        );
        assert_eq!(
            ScalingPlan::from_config(&PipelineConfig::minmax_preset()).steps[0].0,
            ScalingMethod::MinMax
        );
    }

    #[test]
    fn test_standard_scaling() {
        let df = df!["x" => [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]].unwrap();
        let (df, scaled) = scaler(ScalingMode::Standard, &["x"]).apply(df).unwrap();

        assert_eq!(scaled[0].center, 5.0);
        assert_eq!(scaled[0].scale, 2.0);

        let out: Vec<f64> = values(&df, "x_standard").into_iter().flatten().collect();
        assert_eq!(out[4], 0.0);
        assert_eq!(out[0], -1.5);
        assert_eq!(out[7], 2.0);
        assert!(out.iter().sum::<f64>().abs() < 1e-12);
        // source column is kept
        assert_eq!(values(&df, "x")[0], Some(2.0));
    }

    #[test]
    fn test_minmax_scaling() {
        let df = df!["x" => [10.0, 20.0, 30.0]].unwrap();
        let (df, _) = scaler(ScalingMode::MinMax, &["x"]).apply(df).unwrap();

        assert_eq!(values(&df, "x_minmax"), vec![Some(0.0), Some(0.5), Some(1.0)]);
    }

    #[test]
    fn test_integer_source_is_scaled() {
        let df = df!["anul_lansarii" => [2000i64, 2010, 2020]].unwrap();
        let (df, _) = scaler(ScalingMode::MinMax, &["anul_lansarii"])
            .apply(df)
            .unwrap();

        assert_eq!(
            values(&df, "anul_lansarii_minmax"),
            vec![Some(0.0), Some(0.5), Some(1.0)]
        );
    }

    #[test]
    fn test_zero_spread_policies() {
        let df = df!["x" => [Some(7.0), Some(7.0), None]].unwrap();

        let (zeroed, scaled) = scaler(ScalingMode::Both, &["x"]).apply(df.clone()).unwrap();
        assert!(scaled.iter().all(ScaledColumn::has_zero_spread));
        assert_eq!(values(&zeroed, "x_standard"), vec![Some(0.0), Some(0.0), None]);
        assert_eq!(values(&zeroed, "x_minmax"), vec![Some(0.0), Some(0.0), None]);

        let nulling = Scaler::new(
            ScalingPlan::new(ScalingMode::Standard, &["x".to_string()]),
            ZeroSpreadPolicy::Null,
        );
        let (nulled, _) = nulling.apply(df).unwrap();
        assert_eq!(nulled.column("x_standard").unwrap().null_count(), 3);
    }

    #[test]
    fn test_null_passthrough() {
        let df = df!["x" => [Some(10.0), None, Some(30.0)]].unwrap();
        let (df, scaled) = scaler(ScalingMode::Standard, &["x"]).apply(df).unwrap();

        assert_eq!(scaled[0].center, 20.0);
        assert_eq!(values(&df, "x_standard"), vec![Some(-1.0), None, Some(1.0)]);
    }

    #[test]
    fn test_text_column_is_rejected() {
        let df = df!["tip" => ["Movie", "TV Show"]].unwrap();
        let err = scaler(ScalingMode::Standard, &["tip"]).apply(df).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
    }

    #[test]
    fn test_all_null_column_scales_to_nulls() {
        let df = df!["x" => [None::<f64>, None]].unwrap();
        let (df, scaled) = scaler(ScalingMode::MinMax, &["x"]).apply(df).unwrap();
        assert_eq!(df.column("x_minmax").unwrap().null_count(), 2);
        assert!(!scaled[0].has_values());
    }

    #[test]
    fn test_constant_fractional_column_has_zero_spread() {
        // the mean of three 0.1 values is not exactly 0.1
        let df = df!["x" => [0.1, 0.1, 0.1]].unwrap();
        let (df, scaled) = scaler(ScalingMode::Both, &["x"]).apply(df).unwrap();

        assert!(scaled.iter().all(ScaledColumn::has_zero_spread));
        assert!(scaled.iter().all(ScaledColumn::has_values));
        assert_eq!(values(&df, "x_standard"), vec![Some(0.0), Some(0.0), Some(0.0)]);
        assert_eq!(values(&df, "x_minmax"), vec![Some(0.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_small_real_spread_is_scaled() {
        let df = df!["x" => [1.0e-6, 2.0e-6, 3.0e-6]].unwrap();
        let (df, scaled) = scaler(ScalingMode::MinMax, &["x"]).apply(df).unwrap();

        assert!(!scaled[0].has_zero_spread());
        let out: Vec<f64> = values(&df, "x_minmax").into_iter().flatten().collect();
        assert!((out[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_existing_output_column_is_not_overwritten() {
        let df = df![
            "x" => [1.0, 2.0],
            "x_standard" => [7.0, 7.0],
        ]
        .unwrap();
        let err = scaler(ScalingMode::Standard, &["x"]).apply(df).unwrap_err();
        assert_eq!(err.error_code(), "SCALING_FAILED");
    }
}
