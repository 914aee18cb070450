//! CSV loading for the catalog dataset.
//!
//! Loading is the only stage allowed to fail on missing input: a missing or
//! malformed file aborts the run before any processing happens.

use crate::error::{PipelineError, Result, ResultExt};
use crate::schema::SOURCE_COLUMNS;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows inspected when inferring column types.
const INFER_SCHEMA_ROWS: usize = 100;

/// Reads the catalog CSV into a DataFrame.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load the catalog from a file path.
    ///
    /// Dates are left as text; the cleaner parses them with its own rules.
    pub fn load(path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::SourceNotFound(path.to_path_buf()));
        }

        info!("Loading catalog from: {}", path.display());
        let df = Self::read_options()
            .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
            .finish()
            .context(format!("Failed to read {}", path.display()))?;

        debug!("Catalog shape: {:?}", df.shape());
        Ok(df)
    }

    /// Load the catalog from in-memory CSV bytes.
    pub fn load_from_bytes(bytes: impl Into<Vec<u8>>) -> Result<DataFrame> {
        let df = Self::read_options()
            .into_reader_with_file_handle(Cursor::new(bytes.into()))
            .finish()?;

        debug!("Catalog shape: {:?}", df.shape());
        Ok(df)
    }

    /// Fail with the first source column missing from `df`.
    pub fn require_columns(df: &DataFrame) -> Result<()> {
        let present = df.get_column_names();
        for column in SOURCE_COLUMNS {
            if !present.iter().any(|name| name.as_str() == column) {
                return Err(PipelineError::ColumnNotFound(column.to_string()));
            }
        }
        Ok(())
    }

    fn read_options() -> CsvReadOptions {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_quote_char(Some(b'"'))
                    .with_try_parse_dates(false),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
titlu,tip,tara,rating,director,actori,categorie,durata,anul_lansarii,date_adaugarii
Dick Johnson Is Dead,Movie,United States,PG-13,Kirsten Johnson,,Documentaries,90 min,2020,\"September 25, 2021\"
Blood & Water,TV Show,South Africa,TV-MA,,Ama Qamata,International TV Shows,2 Seasons,2021,\"September 24, 2021\"
";

    #[test]
    fn test_load_from_bytes() {
        let df = CatalogLoader::load_from_bytes(SAMPLE).unwrap();

        assert_eq!(df.shape(), (2, 10));
        assert_eq!(df.column("anul_lansarii").unwrap().dtype(), &DataType::Int64);
        // dates are not parsed by the reader
        assert_eq!(df.column("date_adaugarii").unwrap().dtype(), &DataType::String);
        assert!(CatalogLoader::require_columns(&df).is_ok());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = CatalogLoader::load("does/not/exist/Netflix.csv").unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_NOT_FOUND");
        assert!(err.is_startup_failure());
    }

    #[test]
    fn test_require_columns_reports_missing() {
        let df = df![
            "titlu" => ["A"],
            "tip" => ["Movie"],
        ]
        .unwrap();

        let err = CatalogLoader::require_columns(&df).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(ref c) if c == "tara"));
    }
}
