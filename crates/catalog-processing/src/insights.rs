//! Read-only queries over a prepared catalog.
//!
//! Every query returns a [`QueryOutcome`] so that "no rows matched" is a value
//! the caller branches on, not an error.

use crate::error::{PipelineError, Result};
use crate::schema::{
    CatalogType, COUNTRY, DATE_ADDED, DURATION_MIN, RATING, RELEASE_YEAR, TITLE, TYPE,
};
use crate::utils::{
    column_names, finite_values, is_numeric_dtype, mean, quantile_linear, series_dates, sorted,
    std_dev,
};
use chrono::Datelike;
use polars::prelude::*;

/// Output column of the count aggregations.
pub const PRODUCTION_COUNT: &str = "numar_productii";

/// Result of a query: either a non-empty table or an explicit empty state.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Empty,
    Rows(DataFrame),
}

impl QueryOutcome {
    /// Wrap `df`, mapping a frame without rows to [`QueryOutcome::Empty`].
    pub fn from_frame(df: DataFrame) -> Self {
        if df.height() == 0 {
            Self::Empty
        } else {
            Self::Rows(df)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn rows(&self) -> Option<&DataFrame> {
        match self {
            Self::Empty => None,
            Self::Rows(df) => Some(df),
        }
    }

    pub fn height(&self) -> usize {
        self.rows().map_or(0, DataFrame::height)
    }
}

fn require(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(PipelineError::ColumnNotFound(column.to_string()));
        }
    }
    Ok(())
}

// =============================================================================
// Grouped aggregations
// =============================================================================

/// Number of titles per release year and type.
pub fn productions_per_year_and_type(df: &DataFrame) -> Result<QueryOutcome> {
    require(df, &[RELEASE_YEAR, TYPE])?;
    let out = df
        .clone()
        .lazy()
        .group_by([col(RELEASE_YEAR), col(TYPE)])
        .agg([len().alias(PRODUCTION_COUNT)])
        .sort([RELEASE_YEAR, TYPE], SortMultipleOptions::default())
        .collect()?;
    Ok(QueryOutcome::from_frame(out))
}

/// Mean duration in minutes per rating.
pub fn mean_duration_per_rating(df: &DataFrame) -> Result<QueryOutcome> {
    require(df, &[RATING, DURATION_MIN])?;
    let out = df
        .clone()
        .lazy()
        .group_by([col(RATING)])
        .agg([col(DURATION_MIN).mean()])
        .sort([RATING], SortMultipleOptions::default())
        .collect()?;
    Ok(QueryOutcome::from_frame(out))
}

/// The `n` countries with the most titles, most first; ties by name.
pub fn top_countries(df: &DataFrame, n: usize) -> Result<QueryOutcome> {
    require(df, &[COUNTRY])?;
    let limit = IdxSize::try_from(n).unwrap_or(IdxSize::MAX);
    let out = df
        .clone()
        .lazy()
        .group_by([col(COUNTRY)])
        .agg([len().alias(PRODUCTION_COUNT)])
        .sort(
            [PRODUCTION_COUNT, COUNTRY],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(limit)
        .collect()?;
    Ok(QueryOutcome::from_frame(out))
}

/// Mean duration per release year and type.
pub fn mean_duration_per_year_and_type(df: &DataFrame) -> Result<QueryOutcome> {
    require(df, &[RELEASE_YEAR, TYPE, DURATION_MIN])?;
    let out = df
        .clone()
        .lazy()
        .group_by([col(RELEASE_YEAR), col(TYPE)])
        .agg([col(DURATION_MIN).mean()])
        .sort([RELEASE_YEAR, TYPE], SortMultipleOptions::default())
        .collect()?;
    Ok(QueryOutcome::from_frame(out))
}

/// Mean and maximum duration per rating.
pub fn duration_mean_max_per_rating(df: &DataFrame) -> Result<QueryOutcome> {
    require(df, &[RATING, DURATION_MIN])?;
    let out = df
        .clone()
        .lazy()
        .group_by([col(RATING)])
        .agg([
            col(DURATION_MIN).mean().alias("mean"),
            col(DURATION_MIN).max().alias("max"),
        ])
        .sort([RATING], SortMultipleOptions::default())
        .collect()?;
    Ok(QueryOutcome::from_frame(out))
}

/// Count of known durations plus mean, min and max duration per type.
pub fn duration_stats_per_type(df: &DataFrame) -> Result<QueryOutcome> {
    require(df, &[TYPE, DURATION_MIN])?;
    let out = df
        .clone()
        .lazy()
        .group_by([col(TYPE)])
        .agg([
            col(DURATION_MIN).count().alias("nr_titluri"),
            col(DURATION_MIN).mean().alias("durata_medie"),
            col(DURATION_MIN).min().alias("durata_minima"),
            col(DURATION_MIN).max().alias("durata_maxima"),
        ])
        .sort([TYPE], SortMultipleOptions::default())
        .collect()?;
    Ok(QueryOutcome::from_frame(out))
}

// =============================================================================
// Row selections
// =============================================================================

/// Titles added in `year` that have a known duration, ordered by added date.
///
/// Columns: title, added date, duration.
pub fn added_in_year(df: &DataFrame, year: i32) -> Result<QueryOutcome> {
    require(df, &[TITLE, DATE_ADDED, DURATION_MIN])?;

    let dates = series_dates(df.column(DATE_ADDED)?.as_materialized_series())?;
    let minutes = df.column(DURATION_MIN)?.as_materialized_series().is_not_null();

    let mask_values: Vec<bool> = dates
        .iter()
        .zip(minutes.into_iter())
        .map(|(date, has_minutes)| {
            has_minutes.unwrap_or(false) && date.is_some_and(|d| d.year() == year)
        })
        .collect();
    let mask = BooleanChunked::from_slice("mask".into(), &mask_values);

    let out = df
        .select([TITLE, DATE_ADDED, DURATION_MIN])?
        .filter(&mask)?
        .sort([DATE_ADDED], SortMultipleOptions::default())?;
    Ok(QueryOutcome::from_frame(out))
}

/// Rows whose `tip` parses to `kind`.
pub fn titles_of_type(df: &DataFrame, kind: CatalogType) -> Result<QueryOutcome> {
    require(df, &[TYPE])?;
    let types = df.column(TYPE)?.as_materialized_series().cast(&DataType::String)?;
    let mask: BooleanChunked = types
        .str()?
        .into_iter()
        .map(|v| Some(v.map(CatalogType::from_label) == Some(kind)))
        .collect();
    Ok(QueryOutcome::from_frame(df.filter(&mask)?))
}

/// Every column except the scaled ones.
pub fn unscaled_view(df: &DataFrame, scaled: &[&str]) -> Result<QueryOutcome> {
    let keep: Vec<String> = column_names(df)
        .into_iter()
        .filter(|name| !scaled.contains(&name.as_str()))
        .collect();
    Ok(QueryOutcome::from_frame(df.select(keep)?))
}

/// Only the scaled columns.
pub fn scaled_view(df: &DataFrame, scaled: &[&str]) -> Result<QueryOutcome> {
    require(df, scaled)?;
    if scaled.is_empty() {
        return Ok(QueryOutcome::Empty);
    }
    Ok(QueryOutcome::from_frame(df.select(scaled.iter().copied())?))
}

// =============================================================================
// Descriptive statistics
// =============================================================================

/// Row labels of [`describe_numeric`].
pub const DESCRIBE_STATISTICS: [&str; 8] =
    ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Count, mean, sample std, min, quartiles and max of every numeric column.
///
/// The first column, `statistic`, holds the row labels. Statistics of a
/// column without values are null.
pub fn describe_numeric(df: &DataFrame) -> Result<QueryOutcome> {
    let mut columns: Vec<Column> = vec![
        Series::new("statistic".into(), DESCRIBE_STATISTICS.to_vec()).into(),
    ];

    for col in df.get_columns() {
        if !is_numeric_dtype(col.dtype()) {
            continue;
        }
        let values = sorted(finite_values(col.as_materialized_series())?);
        let stats: Vec<Option<f64>> = vec![
            Some(values.len() as f64),
            mean(&values),
            std_dev(&values, 1),
            values.first().copied(),
            quantile_linear(&values, 0.25),
            quantile_linear(&values, 0.5),
            quantile_linear(&values, 0.75),
            values.last().copied(),
        ];
        columns.push(Series::new(col.name().clone(), stats).into());
    }

    if columns.len() == 1 {
        return Ok(QueryOutcome::Empty);
    }
    Ok(QueryOutcome::from_frame(DataFrame::new(columns)?))
}
