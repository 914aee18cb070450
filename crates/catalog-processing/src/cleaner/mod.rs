//! Cleaning stage for the catalog dataset.
//!
//! This module provides:
//! - Optional `"None"` literal normalization
//! - Sentinel filling of the six descriptive text columns
//! - Duration parsing into a `durata_min` minutes column
//! - Release-year coercion to `Int64`
//! - Added-date parsing into a polars `Date` column

mod converters;
mod sanitizers;

pub use converters::{parse_added_date, parse_duration_minutes};

use crate::schema::{DATE_ADDED, DURATION, DURATION_MIN, FILL_RULES, RELEASE_YEAR};
use anyhow::{Result, anyhow};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// What a cleaning pass did, and the cells it had to give up on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningLog {
    pub actions: Vec<String>,
    pub warnings: Vec<String>,
}

/// Cleans a freshly loaded catalog frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogCleaner {
    normalize_none_literal: bool,
}

impl CatalogCleaner {
    pub fn new(normalize_none_literal: bool) -> Self {
        Self {
            normalize_none_literal,
        }
    }

    /// Run every cleaning rule and return the frame plus a log of actions.
    ///
    /// Afterwards none of the fillable columns holds a null, `durata_min`
    /// exists, `anul_lansarii` is `Int64` and `date_adaugarii` is a `Date`
    /// column.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningLog)> {
        let mut cleaning_actions = Vec::new();
        let mut warnings = Vec::new();
        let mut df = df;

        info!("Cleaning catalog ({} rows)...", df.height());

        // 1. "None" literals become real nulls before any fill rule sees them
        if self.normalize_none_literal {
            let (normalized, replaced) = sanitizers::normalize_none_literals(df)?;
            df = normalized;
            cleaning_actions.push(format!(
                "Normalized {} '{}' cells to null",
                replaced,
                sanitizers::NONE_LITERAL
            ));
        }

        // 2. Sentinel fill
        let (filled, counts) = sanitizers::fill_sentinels(df, &FILL_RULES)?;
        df = filled;
        for (column, count) in counts.iter().filter(|(_, count)| *count > 0) {
            cleaning_actions.push(format!("Filled {} missing values in '{}'", count, column));
        }

        // 3. Duration text -> minutes
        let duration = df
            .column(DURATION)
            .map_err(|_| anyhow!("Column '{}' not found in dataset", DURATION))?
            .as_materialized_series();
        let minutes = converters::duration_minutes_series(duration, DURATION_MIN)?;
        let unparsed = minutes.null_count().saturating_sub(duration.null_count());
        df.with_column(minutes)?;
        cleaning_actions.push(format!(
            "Derived '{}' from '{}' ({} values are not minute durations)",
            DURATION_MIN, DURATION, unparsed
        ));
        debug!("{} duration cells did not denote minutes", unparsed);

        // 4. Release year -> Int64, unparseable cells become null
        let year = df
            .column(RELEASE_YEAR)
            .map_err(|_| anyhow!("Column '{}' not found in dataset", RELEASE_YEAR))?
            .as_materialized_series();
        if year.dtype() != &DataType::Int64 {
            let nulls_before = year.null_count();
            let years = year.cast(&DataType::Int64)?;
            let failed = years.null_count().saturating_sub(nulls_before);
            df.replace(RELEASE_YEAR, years)?;
            if failed > 0 {
                let warning = format!(
                    "{} '{}' values are not integers and were set to null",
                    failed, RELEASE_YEAR
                );
                warn!("{}", warning);
                warnings.push(warning);
            }
            cleaning_actions.push(format!(
                "Parsed '{}' as integers ({} unparseable values set to null)",
                RELEASE_YEAR, failed
            ));
        }

        // 5. Added-date text -> Date
        let added = df
            .column(DATE_ADDED)
            .map_err(|_| anyhow!("Column '{}' not found in dataset", DATE_ADDED))?
            .as_materialized_series();
        let nulls_before = added.null_count();
        let dates = converters::added_date_series(added)?;
        let failed = dates.null_count().saturating_sub(nulls_before);
        df.replace(DATE_ADDED, dates)?;
        if failed > 0 {
            let warning = format!(
                "{} '{}' values could not be parsed and were set to null",
                failed, DATE_ADDED
            );
            warn!("{}", warning);
            warnings.push(warning);
        }
        cleaning_actions.push(format!(
            "Parsed '{}' as dates ({} unparseable values set to null)",
            DATE_ADDED, failed
        ));

        Ok((
            df,
            CleaningLog {
                actions: cleaning_actions,
                warnings,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SOURCE_COLUMNS;

    fn raw_frame() -> DataFrame {
        df![
            "titlu" => ["A", "B", "C"],
            "tip" => [Some("Movie"), Some("TV Show"), None],
            "tara" => [None, Some("India"), Some("None")],
            "rating" => [Some("PG"), None, Some("R")],
            "director" => [Some("None"), None, Some("Ava")],
            "actori" => [None::<&str>, None, None],
            "categorie" => [Some("Dramas"), None, Some("Comedies")],
            "durata" => [Some("95 min"), Some("3 Seasons"), None],
            "anul_lansarii" => [2019i64, 2020, 2017],
            "date_adaugarii" => [Some("September 25, 2021"), Some("garbage"), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_clean_fills_and_parses() {
        let (df, log) = CatalogCleaner::new(false).clean(raw_frame()).unwrap();

        for rule in FILL_RULES {
            assert_eq!(df.column(rule.column).unwrap().null_count(), 0);
        }

        let minutes: Vec<Option<f64>> = df
            .column("durata_min")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(minutes, vec![Some(95.0), None, None]);

        assert_eq!(df.column("date_adaugarii").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("date_adaugarii").unwrap().null_count(), 2);
        assert!(log.actions.iter().any(|a| a.contains("1 unparseable")));
        assert_eq!(
            log.warnings,
            vec!["1 'date_adaugarii' values could not be parsed and were set to null".to_string()]
        );

        // source columns are never removed
        for column in SOURCE_COLUMNS {
            assert!(df.column(column).is_ok());
        }
    }

    #[test]
    fn test_none_literal_kept_without_normalization() {
        let (df, _) = CatalogCleaner::new(false).clean(raw_frame()).unwrap();
        assert_eq!(df.column("tara").unwrap().str().unwrap().get(2), Some("None"));
        assert_eq!(df.column("director").unwrap().str().unwrap().get(0), Some("None"));
    }

    #[test]
    fn test_none_literal_normalized_then_filled() {
        let (df, log) = CatalogCleaner::new(true).clean(raw_frame()).unwrap();

        assert_eq!(
            df.column("tara").unwrap().str().unwrap().get(2),
            Some("Necunoscuta")
        );
        assert_eq!(
            df.column("director").unwrap().str().unwrap().get(0),
            Some("Necunoscut")
        );
        assert!(log.actions[0].starts_with("Normalized 2"));
    }

    #[test]
    fn test_release_year_text_is_coerced() {
        let df = raw_frame()
            .with_column(Series::new("anul_lansarii".into(), ["2019", "", "abc"]))
            .unwrap()
            .clone();
        let (df, log) = CatalogCleaner::new(false).clean(df).unwrap();

        let years: Vec<Option<i64>> = df
            .column("anul_lansarii")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(2019), None, None]);
        assert!(log.warnings.iter().any(|w| w.starts_with("2 'anul_lansarii'")));
    }

    #[test]
    fn test_all_blank_release_year_becomes_null_integers() {
        let df = raw_frame()
            .with_column(Series::new("anul_lansarii".into(), [None::<&str>, None, None]))
            .unwrap()
            .clone();
        let (df, log) = CatalogCleaner::new(false).clean(df).unwrap();

        let year = df.column("anul_lansarii").unwrap();
        assert_eq!(year.dtype(), &DataType::Int64);
        assert_eq!(year.null_count(), 3);
        // nothing was lost that was not already missing
        assert!(!log.warnings.iter().any(|w| w.contains("anul_lansarii")));
    }

    #[test]
    fn test_clean_requires_duration_column() {
        let df = raw_frame().drop("durata").unwrap();
        assert!(CatalogCleaner::default().clean(df).is_err());
    }
}
