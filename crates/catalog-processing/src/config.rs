//! Configuration types for the catalog pipeline.
//!
//! The two historical dashboard scripts differ only in a handful of policies,
//! so both are presets of one [`PipelineConfig`]:
//!
//! | preset                               | outliers | scaling  | duration fill | `"None"` literal |
//! |--------------------------------------|----------|----------|---------------|------------------|
//! | [`PipelineConfig::standard_preset`]  | remove   | standard | leave null    | kept             |
//! | [`PipelineConfig::minmax_preset`]    | keep     | min-max  | column mean   | nulled           |

use crate::error::{PipelineError, Result};
use crate::schema::{COUNTRY, DURATION_MIN, RATING, RELEASE_YEAR, TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Whether IQR outlier rows are dropped from the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutlierPolicy {
    /// Drop rows outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR]
    #[default]
    Remove,
    /// Keep every row
    Keep,
}

/// Which scaled columns are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScalingMode {
    /// Zero mean, unit variance
    #[default]
    Standard,
    /// Rescale to [0, 1]
    MinMax,
    /// Append both
    Both,
}

/// What a scaled column holds when its source has no spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ZeroSpreadPolicy {
    /// Every non-null input maps to 0.0
    #[default]
    Zero,
    /// Every input maps to null
    Null,
}

/// How `durata_min` nulls are treated after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DurationFill {
    /// Unparseable durations stay null
    #[default]
    LeaveNull,
    /// Nulls take the mean of the parsed durations
    Mean,
}

/// Configuration for the catalog pipeline.
///
/// Use [`PipelineConfig::builder()`] for a validated configuration, or one of
/// the presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Outlier handling for `outlier_column`.
    /// Default: Remove
    pub outlier_policy: OutlierPolicy,

    /// Column the IQR filter runs on.
    /// Default: "durata_min"
    pub outlier_column: String,

    /// Scaling methods to apply.
    /// Default: Standard
    pub scaling: ScalingMode,

    /// Numeric columns to scale.
    /// Default: ["durata_min", "anul_lansarii"]
    pub scale_columns: Vec<String>,

    /// Output of scaling a column with zero spread.
    /// Default: Zero
    pub zero_spread: ZeroSpreadPolicy,

    /// Treatment of unparseable durations.
    /// Default: LeaveNull
    pub duration_fill: DurationFill,

    /// Turn literal "None" cells into nulls before cleaning.
    /// Default: false
    pub normalize_none_literal: bool,

    /// Drop rows missing `durata_min` or `anul_lansarii` before encoding.
    /// Default: false
    pub drop_incomplete_rows: bool,

    /// Categorical columns to label-encode.
    /// Default: ["tip", "rating", "tara"]
    pub encode_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outlier_policy: OutlierPolicy::default(),
            outlier_column: DURATION_MIN.to_string(),
            scaling: ScalingMode::default(),
            scale_columns: default_scale_columns(),
            zero_spread: ZeroSpreadPolicy::default(),
            duration_fill: DurationFill::default(),
            normalize_none_literal: false,
            drop_incomplete_rows: false,
            encode_columns: default_encode_columns(),
        }
    }
}

fn default_scale_columns() -> Vec<String> {
    vec![DURATION_MIN.to_string(), RELEASE_YEAR.to_string()]
}

fn default_encode_columns() -> Vec<String> {
    vec![TYPE.to_string(), RATING.to_string(), COUNTRY.to_string()]
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Outlier removal, standard scaling, rows without a duration or release
    /// year dropped before scaling.
    pub fn standard_preset() -> Self {
        Self {
            outlier_policy: OutlierPolicy::Remove,
            scaling: ScalingMode::Standard,
            duration_fill: DurationFill::LeaveNull,
            normalize_none_literal: false,
            drop_incomplete_rows: true,
            ..Self::default()
        }
    }

    /// No outlier removal, min-max scaling, mean-filled durations and literal
    /// "None" cells treated as missing.
    pub fn minmax_preset() -> Self {
        Self {
            outlier_policy: OutlierPolicy::Keep,
            scaling: ScalingMode::MinMax,
            duration_fill: DurationFill::Mean,
            normalize_none_literal: true,
            drop_incomplete_rows: false,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.outlier_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName("outlier_column"));
        }

        check_column_list("scale_columns", &self.scale_columns)?;
        check_column_list("encode_columns", &self.encode_columns)?;

        Ok(())
    }
}

fn check_column_list(
    field: &'static str,
    columns: &[String],
) -> std::result::Result<(), ConfigValidationError> {
    if columns.is_empty() {
        return Err(ConfigValidationError::EmptyColumnList(field));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName(field));
        }
        if !seen.insert(column.as_str()) {
            return Err(ConfigValidationError::DuplicateColumn {
                field,
                column: column.clone(),
            });
        }
    }

    Ok(())
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("'{0}' must list at least one column")]
    EmptyColumnList(&'static str),

    #[error("'{0}' contains an empty column name")]
    EmptyColumnName(&'static str),

    #[error("'{field}' lists column '{column}' more than once")]
    DuplicateColumn { field: &'static str, column: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    base: Option<PipelineConfig>,
    outlier_policy: Option<OutlierPolicy>,
    outlier_column: Option<String>,
    scaling: Option<ScalingMode>,
    scale_columns: Option<Vec<String>>,
    zero_spread: Option<ZeroSpreadPolicy>,
    duration_fill: Option<DurationFill>,
    normalize_none_literal: Option<bool>,
    drop_incomplete_rows: Option<bool>,
    encode_columns: Option<Vec<String>>,
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration (e.g. a preset) instead of the
    /// defaults. Explicitly set fields still win.
    pub fn base(mut self, config: PipelineConfig) -> Self {
        self.base = Some(config);
        self
    }

    pub fn outlier_policy(mut self, policy: OutlierPolicy) -> Self {
        self.outlier_policy = Some(policy);
        self
    }

    pub fn outlier_column(mut self, column: impl Into<String>) -> Self {
        self.outlier_column = Some(column.into());
        self
    }

    pub fn scaling(mut self, mode: ScalingMode) -> Self {
        self.scaling = Some(mode);
        self
    }

    /// Replace the list of numeric columns to scale.
    pub fn scale_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scale_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn zero_spread(mut self, policy: ZeroSpreadPolicy) -> Self {
        self.zero_spread = Some(policy);
        self
    }

    pub fn duration_fill(mut self, fill: DurationFill) -> Self {
        self.duration_fill = Some(fill);
        self
    }

    pub fn normalize_none_literal(mut self, enable: bool) -> Self {
        self.normalize_none_literal = Some(enable);
        self
    }

    pub fn drop_incomplete_rows(mut self, enable: bool) -> Self {
        self.drop_incomplete_rows = Some(enable);
        self
    }

    /// Replace the list of categorical columns to encode.
    pub fn encode_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encode_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let base = self.base.unwrap_or_default();
        let config = PipelineConfig {
            outlier_policy: self.outlier_policy.unwrap_or(base.outlier_policy),
            outlier_column: self.outlier_column.unwrap_or(base.outlier_column),
            scaling: self.scaling.unwrap_or(base.scaling),
            scale_columns: self.scale_columns.unwrap_or(base.scale_columns),
            zero_spread: self.zero_spread.unwrap_or(base.zero_spread),
            duration_fill: self.duration_fill.unwrap_or(base.duration_fill),
            normalize_none_literal: self
                .normalize_none_literal
                .unwrap_or(base.normalize_none_literal),
            drop_incomplete_rows: self
                .drop_incomplete_rows
                .unwrap_or(base.drop_incomplete_rows),
            encode_columns: self.encode_columns.unwrap_or(base.encode_columns),
        };

        config.validate()?;
        Ok(config)
    }
}
