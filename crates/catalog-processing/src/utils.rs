//! Shared utilities for the catalog pipeline.
//!
//! Small numeric and Series helpers used by more than one stage.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Owned column names of a DataFrame.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Values of a numeric Series as `f64`, nulls preserved.
pub fn f64_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Non-null, finite values of a numeric Series.
pub fn finite_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(f64_values(series)?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect())
}

/// Replace nulls in a Series with `fill_value`, casting it to String first.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = series.cast(&DataType::String)?;
    let filled: Vec<String> = str_series
        .str()?
        .into_iter()
        .map(|opt| opt.unwrap_or(fill_value).to_string())
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom.
///
/// `None` when fewer than `ddof + 1` values are available.
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - ddof) as f64).sqrt())
}

/// Quantile of ascending-sorted values with linear interpolation between the
/// two closest ranks (the pandas/numpy default).
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Sort finite values ascending.
pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

// =============================================================================
// Date Utilities
// =============================================================================

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch, the physical representation of a polars `Date`.
pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`date_to_epoch_days`].
pub fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Build a polars `Date` Series from optional dates.
pub fn date_series(name: PlSmallStr, dates: &[Option<NaiveDate>]) -> PolarsResult<Series> {
    let days: Vec<Option<i32>> = dates
        .iter()
        .map(|d| d.map(date_to_epoch_days))
        .collect();
    Series::new(name, days).cast(&DataType::Date)
}

/// Read a polars `Date` Series back into optional dates.
pub fn series_dates(series: &Series) -> PolarsResult<Vec<Option<NaiveDate>>> {
    let days = series.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(epoch_days_to_date))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Date));
    }

    #[test]
    fn test_quantile_linear_matches_pandas() {
        let values = sorted(vec![10.0, 12.0, 11.0, 13.0, 1000.0]);
        assert_eq!(quantile_linear(&values, 0.25), Some(11.0));
        assert_eq!(quantile_linear(&values, 0.75), Some(13.0));

        let even = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_linear(&even, 0.25), Some(1.75));
        assert_eq!(quantile_linear(&even, 0.5), Some(2.5));
    }

    #[test]
    fn test_quantile_linear_edge_cases() {
        assert_eq!(quantile_linear(&[], 0.5), None);
        assert_eq!(quantile_linear(&[7.0], 0.25), Some(7.0));
        assert_eq!(quantile_linear(&[1.0, 2.0], 1.5), None);
    }

    #[test]
    fn test_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(std_dev(&values, 0), Some(2.0));
        assert!((std_dev(&values, 1).unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(std_dev(&[1.0], 1), None);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("tara".into(), &[Some("Romania"), None, Some("India")]);
        let filled = fill_string_nulls(&series, "Necunoscuta").unwrap();

        let values: Vec<Option<&str>> = filled.str().unwrap().into_iter().collect();
        assert_eq!(
            values,
            vec![Some("Romania"), Some("Necunoscuta"), Some("India")]
        );
    }

    #[test]
    fn test_epoch_days_round_trip() {
        let date = NaiveDate::from_ymd_opt(2017, 9, 25).unwrap();
        assert_eq!(date_to_epoch_days(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(epoch_days_to_date(date_to_epoch_days(date)), Some(date));
    }

    #[test]
    fn test_date_series_round_trip() {
        let dates = vec![NaiveDate::from_ymd_opt(2021, 9, 25), None];
        let series = date_series("d".into(), &dates).unwrap();

        assert_eq!(series.dtype(), &DataType::Date);
        assert_eq!(series_dates(&series).unwrap(), dates);
    }
}
