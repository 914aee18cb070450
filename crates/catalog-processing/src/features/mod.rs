//! Feature derivation stage.
//!
//! Decides what happens to `durata_min` nulls, optionally drops rows that
//! cannot be scaled, and hosts the IQR outlier filter.

pub mod outliers;

pub use outliers::{OutlierReport, remove_iqr_outliers};

use crate::config::DurationFill;
use crate::schema::{DURATION_MIN, RELEASE_YEAR};
use crate::utils::{f64_values, finite_values, mean};
use anyhow::{Result, anyhow};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Applies the duration fill policy and the incomplete-row drop.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver {
    duration_fill: DurationFill,
    drop_incomplete_rows: bool,
}

impl FeatureDeriver {
    pub fn new(duration_fill: DurationFill, drop_incomplete_rows: bool) -> Self {
        Self {
            duration_fill,
            drop_incomplete_rows,
        }
    }

    /// Run the derivation rules and return the frame plus a log of actions.
    pub fn derive(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        let mut actions = Vec::new();

        info!("Deriving features ({} rows)...", df.height());

        let (df, filled) = apply_duration_fill(df, self.duration_fill)?;
        if filled > 0 {
            actions.push(format!(
                "Filled {} missing '{}' values with the column mean",
                filled, DURATION_MIN
            ));
        }

        let df = if self.drop_incomplete_rows {
            let (df, dropped) = drop_incomplete_rows(df)?;
            actions.push(format!(
                "Dropped {} rows missing '{}' or '{}'",
                dropped, DURATION_MIN, RELEASE_YEAR
            ));
            df
        } else {
            df
        };

        Ok((df, actions))
    }
}

/// Apply `policy` to the nulls of `durata_min`.
///
/// Returns the frame and the number of filled cells. A column without any
/// parsed value has no mean and stays all-null.
pub fn apply_duration_fill(df: DataFrame, policy: DurationFill) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let series = df
        .column(DURATION_MIN)
        .map_err(|_| anyhow!("Column '{}' not found in dataset", DURATION_MIN))?
        .as_materialized_series();

    if policy == DurationFill::LeaveNull || series.null_count() == 0 {
        return Ok((df, 0));
    }

    let Some(fill_value) = mean(&finite_values(series)?) else {
        warn!(
            "'{}' has no parsed values, mean fill skipped",
            DURATION_MIN
        );
        return Ok((df, 0));
    };

    let nulls = series.null_count();
    let filled: Vec<f64> = f64_values(series)?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    df.replace(DURATION_MIN, Series::new(DURATION_MIN.into(), filled))?;

    debug!(
        "Filled {} nulls in '{}' with mean {:.2}",
        nulls, DURATION_MIN, fill_value
    );
    Ok((df, nulls))
}

/// Drop rows whose `durata_min` or `anul_lansarii` is null.
///
/// Returns the frame and the number of dropped rows.
pub fn drop_incomplete_rows(df: DataFrame) -> Result<(DataFrame, usize)> {
    let mut keep = vec![true; df.height()];
    for column in [DURATION_MIN, RELEASE_YEAR] {
        let series = df
            .column(column)
            .map_err(|_| anyhow!("Column '{}' not found in dataset", column))?
            .as_materialized_series();
        for (flag, is_null) in keep.iter_mut().zip(series.is_null().into_iter()) {
            if is_null.unwrap_or(false) {
                *flag = false;
            }
        }
    }

    let mask = BooleanChunked::from_slice("mask".into(), &keep);
    let original_rows = df.height();
    let df = df.filter(&mask)?;
    let dropped = original_rows - df.height();

    if dropped > 0 {
        debug!("Dropped {} incomplete rows", dropped);
    }
    Ok((df, dropped))
}
