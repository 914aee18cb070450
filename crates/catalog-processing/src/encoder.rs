//! Label encoding of categorical columns.
//!
//! Each encoded column gets a [`CodeMapping`]: its distinct non-null values in
//! byte-wise sorted order, where a value's code is its index. The encoded
//! values are appended as `<column>_cod` (UInt32); the source column stays.

use crate::error::{PipelineError, Result};
use crate::schema::code_column;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Header of the label column in [`CodeMapping::to_frame`].
pub const LABEL_HEADER: &str = "valoare_originala";
/// Header of the code column in [`CodeMapping::to_frame`].
pub const CODE_HEADER: &str = "cod";

/// Sorted distinct labels of one column; a label's code is its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMapping {
    pub column: String,
    labels: Vec<String>,
}

impl CodeMapping {
    /// Build the mapping from the non-null values of `series`.
    fn fit(column: &str, series: &Series) -> Result<Self> {
        let str_series = series
            .cast(&DataType::String)
            .map_err(|e| PipelineError::EncodingFailed {
                column: column.to_string(),
                reason: e.to_string(),
            })?;

        let distinct: BTreeSet<&str> = str_series.str()?.into_iter().flatten().collect();

        Ok(Self {
            column: column.to_string(),
            labels: distinct.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn code_of(&self, label: &str) -> Option<u32> {
        self.labels
            .binary_search_by(|known| known.as_str().cmp(label))
            .ok()
            .and_then(|idx| u32::try_from(idx).ok())
    }

    pub fn label_of(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }

    /// Two-column table of every label next to its code, in code order.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let codes: Vec<u32> = (0..self.labels.len() as u32).collect();
        DataFrame::new(vec![
            Series::new(LABEL_HEADER.into(), self.labels.clone()).into(),
            Series::new(CODE_HEADER.into(), codes).into(),
        ])
    }

    /// Encode `series` into a UInt32 Series named `name`. Nulls stay null.
    fn transform(&self, series: &Series, name: &str) -> Result<Series> {
        let str_series = series.cast(&DataType::String)?;
        let codes: Vec<Option<u32>> = str_series
            .str()?
            .into_iter()
            .map(|v| v.and_then(|label| self.code_of(label)))
            .collect();

        Ok(Series::new(name.into(), codes))
    }
}

/// Every mapping built by one encoding pass, in encoding order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codebook {
    mappings: Vec<CodeMapping>,
}

impl Codebook {
    pub fn get(&self, column: &str) -> Option<&CodeMapping> {
        self.mappings.iter().find(|m| m.column == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Appends `<column>_cod` columns and records their mappings.
pub struct CategoricalEncoder;

impl CategoricalEncoder {
    /// Encode each of `columns` in `df`.
    ///
    /// The mappings are rebuilt from the values present in `df`, so encoding
    /// after row filtering never yields codes for labels that are gone.
    pub fn encode(df: DataFrame, columns: &[String]) -> Result<(DataFrame, Codebook)> {
        let mut df = df;
        let mut codebook = Codebook::default();

        info!("Encoding {} categorical columns...", columns.len());

        for column in columns {
            let series = df
                .column(column)
                .map_err(|_| PipelineError::ColumnNotFound(column.clone()))?
                .as_materialized_series();

            let mapping = CodeMapping::fit(column, series)?;
            let encoded = mapping.transform(series, &code_column(column))?;
            df.with_column(encoded)?;

            debug!("Encoded '{}' with {} distinct labels", column, mapping.len());
            codebook.mappings.push(mapping);
        }

        Ok((df, codebook))
    }
}
