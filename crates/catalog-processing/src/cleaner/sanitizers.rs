//! Null normalization and sentinel filling.

use crate::schema::FillRule;
use crate::utils::{column_names, fill_string_nulls};
use anyhow::{Result, anyhow};
use polars::prelude::*;
use tracing::debug;

/// Literal text some exports write instead of an empty cell.
pub(crate) const NONE_LITERAL: &str = "None";

/// Turn every `"None"` cell of every string column into null.
///
/// Returns the frame and the number of replaced cells.
pub(crate) fn normalize_none_literals(df: DataFrame) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let mut total_replacements = 0;

    for col_name in column_names(&df) {
        let series = df.column(&col_name)?.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }

        let (cleaned, count) = replace_literal_with_null(series, NONE_LITERAL)?;
        if count > 0 {
            debug!("Nulled {} '{}' cells in '{}'", count, NONE_LITERAL, col_name);
            total_replacements += count;
            df.replace(&col_name, cleaned)?;
        }
    }

    Ok((df, total_replacements))
}

/// Replace cells equal to `literal` (after trimming) with null.
pub(crate) fn replace_literal_with_null(series: &Series, literal: &str) -> Result<(Series, usize)> {
    let str_series = series.str()?;
    let mut replacement_count = 0;

    let cleaned: Vec<Option<&str>> = str_series
        .into_iter()
        .map(|opt_val| match opt_val {
            Some(val) if val.trim() == literal => {
                replacement_count += 1;
                None
            }
            other => other,
        })
        .collect();

    Ok((Series::new(series.name().clone(), cleaned), replacement_count))
}

/// Apply each fill rule; returns the frame and `(column, filled cells)` pairs.
pub(crate) fn fill_sentinels(
    df: DataFrame,
    rules: &[FillRule],
) -> Result<(DataFrame, Vec<(String, usize)>)> {
    let mut df = df;
    let mut filled_counts = Vec::with_capacity(rules.len());

    for rule in rules {
        let series = df
            .column(rule.column)
            .map_err(|_| anyhow!("Column '{}' not found in dataset", rule.column))?
            .as_materialized_series();

        let nulls = series.null_count();
        let filled = fill_string_nulls(series, rule.sentinel)?;
        df.replace(rule.column, filled)?;

        debug!(
            "Filled {} nulls in '{}' with '{}'",
            nulls, rule.column, rule.sentinel
        );
        filled_counts.push((rule.column.to_string(), nulls));
    }

    Ok((df, filled_counts))
}
