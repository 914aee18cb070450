//! Cell-level conversions for free-text catalog fields.
//!
//! Every conversion here is total: an unparseable cell becomes null, never an
//! error.

use crate::utils::{date_series, is_numeric_dtype};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

/// Leading integer plus optional unit word, e.g. "95 min", "3 Seasons".
static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*([[:alpha:]]*)\.?\s*$").expect("Invalid regex: duration")
});

/// Units accepted as minutes. An empty unit is a bare number.
const MINUTE_UNITS: [&str; 5] = ["", "min", "mins", "minute", "minutes"];

/// Date layouts seen in the added-date column, tried in order.
const DATE_FORMATS: [&str; 9] = [
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Minutes denoted by a duration cell.
///
/// `"95 min"` is 95; `"3 Seasons"` is not a minute count and yields `None`.
pub fn parse_duration_minutes(text: &str) -> Option<f64> {
    let caps = DURATION_PATTERN.captures(text)?;
    let unit = caps.get(2).map_or("", |m| m.as_str()).to_ascii_lowercase();
    if !MINUTE_UNITS.contains(&unit.as_str()) {
        return None;
    }
    caps.get(1)?.as_str().parse::<u32>().ok().map(f64::from)
}

/// Calendar date of an added-date cell.
pub fn parse_added_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Derive a Float64 minutes Series named `name` from a duration column.
///
/// Numeric input is taken as minutes already; negative or non-finite values
/// become null.
pub(crate) fn duration_minutes_series(series: &Series, name: &str) -> Result<Series> {
    let minutes: Vec<Option<f64>> = if is_numeric_dtype(series.dtype()) {
        let float_series = series.cast(&DataType::Float64)?;
        float_series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|m| m.is_finite() && *m >= 0.0))
            .collect()
    } else {
        let str_series = series.cast(&DataType::String)?;
        str_series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_duration_minutes))
            .collect()
    };

    Ok(Series::new(name.into(), minutes))
}

/// Convert an added-date column into a polars `Date` Series.
///
/// Columns that are already dates are returned unchanged.
pub(crate) fn added_date_series(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::Date => Ok(series.clone()),
        DataType::Datetime(_, _) => Ok(series.cast(&DataType::Date)?),
        _ => {
            let str_series = series.cast(&DataType::String)?;
            let dates: Vec<Option<NaiveDate>> = str_series
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_added_date))
                .collect();
            Ok(date_series(series.name().clone(), &dates)?)
        }
    }
}
