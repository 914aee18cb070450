//! IQR outlier filter.
//!
//! Rows whose value lies outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` are dropped.
//! Quartiles use linear interpolation over the non-null values, and rows with
//! a null value are kept.

use crate::utils::{f64_values, finite_values, quantile_linear, sorted};
use anyhow::{Result, anyhow};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Multiplier applied to the interquartile range.
pub const IQR_FACTOR: f64 = 1.5;

/// What the outlier filter computed and removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
    /// Rows dropped for lying outside the bounds.
    pub removed: usize,
    /// Rows kept because the column was null there.
    pub null_rows_kept: usize,
}

impl OutlierReport {
    /// Whether `value` survives the filter.
    pub fn keeps(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Drop the rows of `df` whose `column` value is an IQR outlier.
///
/// A column with no finite values is returned untouched with `Ok(None)` in
/// place of a report.
pub fn remove_iqr_outliers(
    df: DataFrame,
    column: &str,
) -> Result<(DataFrame, Option<OutlierReport>)> {
    let series = df
        .column(column)
        .map_err(|_| anyhow!("Column '{}' not found in dataset", column))?
        .as_materialized_series();

    let values = sorted(finite_values(series)?);
    let (Some(q1), Some(q3)) = (
        quantile_linear(&values, 0.25),
        quantile_linear(&values, 0.75),
    ) else {
        debug!("No finite values in '{}', outlier filter skipped", column);
        return Ok((df, None));
    };

    let iqr = q3 - q1;
    let mut report = OutlierReport {
        column: column.to_string(),
        q1,
        q3,
        iqr,
        lower: q1 - IQR_FACTOR * iqr,
        upper: q3 + IQR_FACTOR * iqr,
        removed: 0,
        null_rows_kept: 0,
    };

    let mut mask_values = Vec::with_capacity(series.len());
    for opt_val in f64_values(series)? {
        match opt_val {
            Some(val) => mask_values.push(report.keeps(val)),
            None => {
                report.null_rows_kept += 1;
                mask_values.push(true);
            }
        }
    }

    let mask = BooleanChunked::from_slice("mask".into(), &mask_values);
    let original_rows = df.height();
    let filtered = df.filter(&mask)?;
    report.removed = original_rows - filtered.height();

    debug!(
        "'{}' bounds [{:.2}, {:.2}], removed {} rows, kept {} null rows",
        column, report.lower, report.upper, report.removed, report.null_rows_kept
    );

    Ok((filtered, Some(report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_single_extreme_value() {
        let df = df![
            "titlu" => ["a", "b", "c", "d", "e"],
            "durata_min" => [10.0, 12.0, 11.0, 13.0, 1000.0],
        ]
        .unwrap();

        let (df, report) = remove_iqr_outliers(df, "durata_min").unwrap();
        let report = report.unwrap();

        assert_eq!(df.height(), 4);
        assert_eq!(report.q1, 11.0);
        assert_eq!(report.q3, 13.0);
        assert_eq!(report.lower, 8.0);
        assert_eq!(report.upper, 16.0);
        assert_eq!(report.removed, 1);

        let titles: Vec<Option<&str>> = df
            .column("titlu")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(titles, vec![Some("a"), Some("b"), Some("c"), Some("d")]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        // Q1 = 11, Q3 = 13 -> bounds [8, 16]
        let df = df!["durata_min" => [8.0, 11.0, 12.0, 13.0, 16.0, 11.0, 13.0]].unwrap();
        let (filtered, report) = remove_iqr_outliers(df, "durata_min").unwrap();
        let report = report.unwrap();

        assert!(report.keeps(report.lower));
        assert!(report.keeps(report.upper));
        assert_eq!(filtered.height(), 7 - report.removed);
    }

    #[test]
    fn test_null_rows_are_kept_and_counted() {
        let df = df![
            "durata_min" => [Some(10.0), None, Some(12.0), Some(11.0), Some(13.0), Some(1000.0), None],
        ]
        .unwrap();

        let (df, report) = remove_iqr_outliers(df, "durata_min").unwrap();
        let report = report.unwrap();

        assert_eq!(report.null_rows_kept, 2);
        assert_eq!(report.removed, 1);
        assert_eq!(df.height(), 6);
        assert_eq!(df.column("durata_min").unwrap().null_count(), 2);
    }

    #[test]
    fn test_all_null_column_is_noop() {
        let df = df!["durata_min" => [None::<f64>, None]].unwrap();
        let (df, report) = remove_iqr_outliers(df, "durata_min").unwrap();

        assert!(report.is_none());
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_identical_values_keep_everything() {
        let df = df!["durata_min" => [90.0, 90.0, 90.0]].unwrap();
        let (df, report) = remove_iqr_outliers(df, "durata_min").unwrap();

        assert_eq!(report.unwrap().iqr, 0.0);
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_missing_column_is_error() {
        let df = df!["anul_lansarii" => [2020i64]].unwrap();
        assert!(remove_iqr_outliers(df, "durata_min").is_err());
    }
}
