//! Main catalog pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for running
//! Loader → Cleaner → Feature Deriver → Encoder → Scaler in that order.

use crate::cleaner::CatalogCleaner;
use crate::config::{ConfigValidationError, OutlierPolicy, PipelineConfig};
use crate::encoder::CategoricalEncoder;
use crate::error::{PipelineError, Result};
use crate::features::{FeatureDeriver, remove_iqr_outliers};
use crate::loader::CatalogLoader;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::scaler::{Scaler, ScalingPlan};
use crate::types::{ActionType, PipelineAction, PipelineSummary, PreparedCatalog};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Share of removed rows above which the summary carries a warning.
const HIGH_ROW_LOSS_PERCENT: f32 = 30.0;

/// The catalog preparation pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use catalog_processing::{Pipeline, PipelineConfig};
///
/// let prepared = Pipeline::builder()
///     .config(PipelineConfig::minmax_preset())
///     .build()?
///     .run("Netflix.csv")?;
///
/// println!("{} rows, {} codes for 'tip'",
///     prepared.data.height(),
///     prepared.codebook.get("tip").map_or(0, |m| m.len()));
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: CatalogCleaner,
    deriver: FeatureDeriver,
    scaler: Scaler,
}

// The pipeline may be built on one thread and run on another
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the catalog at `path` and process it.
    ///
    /// A missing or unreadable file fails before any processing happens.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<PreparedCatalog> {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}...", path.as_ref().display()),
        ));

        let df = match CatalogLoader::load(path) {
            Ok(df) => df,
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                return Err(e);
            }
        };

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows", df.height()),
        ));

        self.process(df)
    }

    /// Process an already loaded catalog frame.
    pub fn process(&self, df: DataFrame) -> Result<PreparedCatalog> {
        match self.process_internal(df) {
            Ok(prepared) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(prepared)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PreparedCatalog> {
        let start_time = Instant::now();

        info!("Starting catalog pipeline...");
        CatalogLoader::require_columns(&df)?;

        let mut summary = PipelineSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();
        summary.rows_with_nulls_before = rows_with_nulls(&df);

        let mut processing_steps: Vec<String> = Vec::new();

        // Step 1: Cleaning
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            0.0,
            "Cleaning catalog...",
        ));
        info!("Step 1: Cleaning...");

        let (df, cleaning_log) = self
            .cleaner
            .clean(df)
            .map_err(|e| PipelineError::CleaningFailed(e.to_string()))?;
        let cleaning_steps = cleaning_log.actions;
        for warning in cleaning_log.warnings {
            summary.add_warning(warning);
        }

        for step in &cleaning_steps {
            let action_type = if step.starts_with("Derived") || step.starts_with("Parsed") {
                ActionType::TypeCorrected
            } else {
                ActionType::ValueCleaned
            };
            summary.add_action(PipelineAction::new(action_type, "dataset", step.clone()));
        }
        processing_steps.extend(cleaning_steps);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            1.0,
            "Cleaning complete",
        ));

        // Step 2: Feature derivation
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Deriving,
            0.0,
            "Deriving features...",
        ));
        info!("Step 2: Deriving features...");

        let (df, derivation_steps) = self
            .deriver
            .derive(df)
            .map_err(|e| PipelineError::DerivationFailed(e.to_string()))?;

        for step in &derivation_steps {
            let action_type = if step.starts_with("Dropped") {
                ActionType::RowsRemoved
            } else {
                ActionType::ValueImputed
            };
            summary.add_action(PipelineAction::new(action_type, "dataset", step.clone()));
        }
        processing_steps.extend(derivation_steps);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Deriving,
            1.0,
            "Feature derivation complete",
        ));

        // Step 3: Outlier removal
        let df = match self.config.outlier_policy {
            OutlierPolicy::Remove => {
                self.report_progress(ProgressUpdate::new(
                    PipelineStage::OutlierRemoval,
                    0.0,
                    format!("Removing outliers in '{}'...", self.config.outlier_column),
                ));
                info!("Step 3: Removing outliers...");

                let (df, report) = remove_iqr_outliers(df, &self.config.outlier_column)
                    .map_err(|e| PipelineError::DerivationFailed(e.to_string()))?;

                if let Some(report) = report {
                    let step = format!(
                        "Removed {} outlier rows in '{}' outside [{:.2}, {:.2}]",
                        report.removed, report.column, report.lower, report.upper
                    );
                    summary.add_action(PipelineAction::new(
                        ActionType::OutlierHandled,
                        &report.column,
                        step.clone(),
                    ));
                    processing_steps.push(step);
                    summary.outliers_removed = report.removed;
                    summary.outlier_report = Some(report);
                }

                self.report_progress(ProgressUpdate::new(
                    PipelineStage::OutlierRemoval,
                    1.0,
                    format!("Removed {} outlier rows", summary.outliers_removed),
                ));
                df
            }
            OutlierPolicy::Keep => {
                info!("Step 3: Keeping outliers (disabled)");
                processing_steps.push("Kept all outliers".to_string());
                df
            }
        };

        // Step 4: Encoding
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Encoding,
            0.0,
            "Encoding categories...",
        ));
        info!("Step 4: Encoding categories...");

        let (df, codebook) = CategoricalEncoder::encode(df, &self.config.encode_columns)?;

        for mapping in codebook.iter() {
            let step = format!(
                "Encoded '{}' into {} codes",
                mapping.column,
                mapping.len()
            );
            summary.add_action(PipelineAction::new(
                ActionType::CategoriesEncoded,
                &mapping.column,
                step.clone(),
            ));
            processing_steps.push(step);
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Encoding,
            1.0,
            format!("Encoded {} columns", codebook.len()),
        ));

        // Step 5: Scaling
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Scaling,
            0.0,
            "Scaling numeric columns...",
        ));
        info!("Step 5: Scaling...");

        let (df, scaled_columns) = self.scaler.apply(df)?;

        for scaled in &scaled_columns {
            let step = format!(
                "Appended '{}' ({:?} scaling of '{}')",
                scaled.target, scaled.method, scaled.source
            );
            summary.add_action(PipelineAction::new(
                ActionType::DataNormalized,
                &scaled.target,
                step.clone(),
            ));
            processing_steps.push(step);

            if !scaled.has_values() {
                summary.add_warning(format!(
                    "'{}' has no values to scale; '{}' is all null",
                    scaled.source, scaled.target
                ));
            } else if scaled.has_zero_spread() {
                summary.add_warning(format!(
                    "'{}' has no spread; '{}' follows the {:?} zero-spread policy",
                    scaled.source, scaled.target, self.config.zero_spread
                ));
            }
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Scaling,
            1.0,
            format!("Appended {} scaled columns", scaled_columns.len()),
        ));

        // Finalize summary
        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.rows_removed = summary.rows_before.saturating_sub(summary.rows_after);
        summary.rows_with_nulls_after = rows_with_nulls(&df);
        summary.processing_steps = processing_steps;

        if summary.rows_removed_percentage() > HIGH_ROW_LOSS_PERCENT {
            summary.add_warning(format!(
                "High data loss: {:.1}% of rows were removed",
                summary.rows_removed_percentage()
            ));
        }

        debug!("Final shape: {:?}", df.shape());

        Ok(PreparedCatalog {
            data: df,
            codebook,
            scaled_columns,
            summary,
            config: self.config.clone(),
        })
    }
}

/// Number of rows holding at least one null cell.
fn rows_with_nulls(df: &DataFrame) -> usize {
    let mut has_null = vec![false; df.height()];
    for col in df.get_columns() {
        if col.null_count() == 0 {
            continue;
        }
        for (flag, is_null) in has_null
            .iter_mut()
            .zip(col.as_materialized_series().is_null().into_iter())
        {
            *flag |= is_null.unwrap_or(false);
        }
    }
    has_null.into_iter().filter(|flag| *flag).count()
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let scaler = Scaler::new(ScalingPlan::from_config(&config), config.zero_spread);

        Ok(Pipeline {
            cleaner: CatalogCleaner::new(config.normalize_none_literal),
            deriver: FeatureDeriver::new(config.duration_fill, config.drop_incomplete_rows),
            scaler,
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
