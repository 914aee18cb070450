//! Catalog Processing Library
//!
//! Data preparation for a streaming-catalog CSV, built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline runs once per process and hands a [`PreparedCatalog`] to the
//! presenter:
//!
//! - **Loading**: header-driven CSV read, dates left as text
//! - **Cleaning**: optional `"None"` normalization, sentinel fill of six text
//!   columns, minute durations, parsed added dates
//! - **Feature derivation**: duration fill policy, optional drop of rows that
//!   cannot be scaled, IQR outlier filter
//! - **Encoding**: lexicographic label codes for `tip`, `rating`, `tara`
//! - **Scaling**: standard and/or min-max columns appended next to the source
//! - **Presentation**: grouped queries and a fixed set of text pages
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use catalog_processing::{Page, Pipeline, PipelineConfig, RenderOptions, render_page};
//!
//! let prepared = Pipeline::builder()
//!     .config(PipelineConfig::standard_preset())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run("Netflix.csv")?;
//!
//! let mut stdout = std::io::stdout();
//! for page in Page::ALL {
//!     render_page(&prepared, page, &RenderOptions::default(), &mut stdout)?;
//! }
//! ```
//!
//! # Configuration
//!
//! The two dashboard variants are presets of one [`PipelineConfig`]; use the
//! builder to mix their policies:
//!
//! ```rust,ignore
//! use catalog_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .base(PipelineConfig::minmax_preset())
//!     .outlier_policy(OutlierPolicy::Remove)
//!     .scaling(ScalingMode::Both)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod insights;
pub mod loader;
pub mod pipeline;
pub mod presenter;
pub mod scaler;
pub mod schema;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use cleaner::{CatalogCleaner, CleaningLog, parse_added_date, parse_duration_minutes};
pub use config::{
    ConfigValidationError, DurationFill, OutlierPolicy, PipelineConfig, PipelineConfigBuilder,
    ScalingMode, ZeroSpreadPolicy,
};
pub use encoder::{CategoricalEncoder, CodeMapping, Codebook};
pub use error::{PipelineError, Result, ResultExt};
pub use features::{FeatureDeriver, OutlierReport, remove_iqr_outliers};
pub use insights::QueryOutcome;
pub use loader::CatalogLoader;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use presenter::{Page, RenderOptions, render_page};
pub use scaler::{ScaledColumn, Scaler, ScalingMethod, ScalingPlan};
pub use schema::CatalogType;
pub use types::{ActionType, PipelineAction, PipelineSummary, PreparedCatalog};
