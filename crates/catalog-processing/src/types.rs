//! Output types of the catalog pipeline.

use crate::config::PipelineConfig;
use crate::encoder::Codebook;
use crate::features::OutlierReport;
use crate::scaler::ScaledColumn;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything the presenter needs: the prepared frame and how it was built.
#[derive(Debug, Clone)]
pub struct PreparedCatalog {
    /// Cleaned, encoded and scaled dataset.
    pub data: DataFrame,
    /// Reverse lookup of every `<column>_cod` column.
    pub codebook: Codebook,
    /// Scaled columns appended to `data`, in plan order.
    pub scaled_columns: Vec<ScaledColumn>,
    /// What the run did.
    pub summary: PipelineSummary,
    /// Configuration the run used.
    pub config: PipelineConfig,
}

impl PreparedCatalog {
    /// Names of the scaled columns in `data`.
    pub fn scaled_column_names(&self) -> Vec<&str> {
        self.scaled_columns.iter().map(|c| c.target.as_str()).collect()
    }
}

// ============================================================================
// Summary Types
// ============================================================================

/// Human-readable summary of what the pipeline did.
///
/// Serialized as-is by the CLI's `--json` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows loaded.
    pub rows_before: usize,
    /// Number of rows in the prepared dataset.
    pub rows_after: usize,
    /// Number of rows removed by any stage.
    pub rows_removed: usize,

    /// Number of columns loaded.
    pub columns_before: usize,
    /// Number of columns in the prepared dataset.
    pub columns_after: usize,

    /// Rows that had at least one null cell when loaded.
    pub rows_with_nulls_before: usize,
    /// Rows that still have at least one null cell.
    pub rows_with_nulls_after: usize,

    /// Rows dropped by the IQR filter.
    pub outliers_removed: usize,
    /// Bounds and counts of the IQR filter, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_report: Option<OutlierReport>,

    /// Ordered log of the processing steps.
    pub processing_steps: Vec<String>,

    /// Structured actions, one per change to the data.
    pub actions: Vec<PipelineAction>,

    /// Degraded cases worth surfacing: unparseable release years and added
    /// dates, columns with nothing to scale or no spread, heavy row loss.
    pub warnings: Vec<String>,
}

impl PipelineSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: PipelineAction) {
        self.actions.push(action);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }
}

/// A single change made to the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineAction {
    pub action_type: ActionType,
    /// Column name or "dataset".
    pub target: String,
    pub description: String,
}

impl PipelineAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.action_type.display_name(), self.description)
    }
}

/// Kinds of change the pipeline makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Placeholder cells were turned into nulls or filled with a sentinel.
    ValueCleaned,
    /// Missing values were filled from the column.
    ValueImputed,
    /// Text was parsed into a numeric or date column.
    TypeCorrected,
    /// Rows were dropped for missing values.
    RowsRemoved,
    /// Rows were dropped as outliers.
    OutlierHandled,
    /// Categories were label-encoded.
    CategoriesEncoded,
    /// Scaled columns were appended.
    DataNormalized,
}

impl ActionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ValueCleaned => "Value Cleaned",
            Self::ValueImputed => "Value Imputed",
            Self::TypeCorrected => "Type Corrected",
            Self::RowsRemoved => "Rows Removed",
            Self::OutlierHandled => "Outlier Handled",
            Self::CategoriesEncoded => "Categories Encoded",
            Self::DataNormalized => "Data Normalized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_removed_percentage() {
        let summary = PipelineSummary {
            rows_before: 200,
            rows_removed: 50,
            ..PipelineSummary::default()
        };
        assert_eq!(summary.rows_removed_percentage(), 25.0);
        assert_eq!(PipelineSummary::new().rows_removed_percentage(), 0.0);
    }

    #[test]
    fn test_summary_serialization_skips_missing_report() {
        let mut summary = PipelineSummary::new();
        summary.add_action(PipelineAction::new(
            ActionType::CategoriesEncoded,
            "tip",
            "Encoded 2 labels",
        ));

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("outlier_report").is_none());
        assert_eq!(json["actions"][0]["action_type"], "categories_encoded");
    }

    #[test]
    fn test_action_display_uses_type_name() {
        let action = PipelineAction::new(
            ActionType::RowsRemoved,
            "dataset",
            "Dropped 4 rows missing 'durata_min' or 'anul_lansarii'",
        );
        assert_eq!(
            action.to_string(),
            "[Rows Removed] Dropped 4 rows missing 'durata_min' or 'anul_lansarii'"
        );
    }
}
