//! Error types for the catalog preparation pipeline.
//!
//! Every fallible library operation returns [`PipelineError`]. Stage internals
//! that lean on `anyhow` are mapped onto the matching variant at the pipeline
//! boundary, so callers only ever match on one enum.
//!
//! Errors serialize as `{code, message}` so the JSON output of the CLI can
//! report them the same way it reports results.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the catalog pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source CSV does not exist.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// Cleaning stage failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// Feature derivation (duration policy, outlier filter) failed.
    #[error("Failed to derive features: {0}")]
    DerivationFailed(String),

    /// Label encoding failed.
    #[error("Failed to encode column '{column}': {reason}")]
    EncodingFailed { column: String, reason: String },

    /// Scaling failed.
    #[error("Failed to scale column '{column}': {reason}")]
    ScalingFailed { column: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used by the JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::DerivationFailed(_) => "DERIVATION_FAILED",
            Self::EncodingFailed { .. } => "ENCODING_FAILED",
            Self::ScalingFailed { .. } => "SCALING_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the failure happened before any row was read.
    pub fn is_startup_failure(&self) -> bool {
        match self {
            Self::SourceNotFound(_) | Self::InvalidConfig(_) | Self::Io(_) => true,
            Self::WithContext { source, .. } => source.is_startup_failure(),
            _ => false,
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PipelineError::SourceNotFound(PathBuf::from("Netflix.csv")).error_code(),
            "SOURCE_NOT_FOUND"
        );
        assert_eq!(
            PipelineError::ColumnNotFound("tara".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_startup_failure() {
        assert!(PipelineError::SourceNotFound(PathBuf::from("x.csv")).is_startup_failure());
        assert!(PipelineError::InvalidConfig("bad".to_string()).is_startup_failure());
        assert!(!PipelineError::CleaningFailed("bad".to_string()).is_startup_failure());
    }

    #[test]
    fn test_error_serialization() {
        let error = PipelineError::ColumnNotFound("durata".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("durata"));
    }

    #[test]
    fn test_with_context() {
        let error = PipelineError::ScalingFailed {
            column: "durata_min".to_string(),
            reason: "not numeric".to_string(),
        }
        .with_context("During scaling");
        assert!(error.to_string().contains("During scaling"));
        assert_eq!(error.error_code(), "SCALING_FAILED");
    }

    #[test]
    fn test_source_not_found_message_shows_path() {
        let error = PipelineError::SourceNotFound(PathBuf::from("data/Netflix.csv"));
        assert_eq!(error.to_string(), "Source file not found: data/Netflix.csv");
    }
}
