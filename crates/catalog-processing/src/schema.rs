//! Column names and fill rules of the catalog CSV.
//!
//! The source file keeps its original (Romanian) headers; everything in the
//! crate refers to columns through these constants.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const TITLE: &str = "titlu";
pub const TYPE: &str = "tip";
pub const COUNTRY: &str = "tara";
pub const RATING: &str = "rating";
pub const DIRECTOR: &str = "director";
pub const ACTORS: &str = "actori";
pub const CATEGORY: &str = "categorie";
pub const DURATION: &str = "durata";
pub const RELEASE_YEAR: &str = "anul_lansarii";
pub const DATE_ADDED: &str = "date_adaugarii";

/// Derived numeric duration in minutes.
pub const DURATION_MIN: &str = "durata_min";

/// Suffix of label-encoded columns.
pub const CODE_SUFFIX: &str = "_cod";

/// Columns every source file must carry.
pub const SOURCE_COLUMNS: [&str; 10] = [
    TITLE,
    TYPE,
    COUNTRY,
    RATING,
    DIRECTOR,
    ACTORS,
    CATEGORY,
    DURATION,
    RELEASE_YEAR,
    DATE_ADDED,
];

/// A column whose nulls are replaced by a fixed sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRule {
    pub column: &'static str,
    pub sentinel: &'static str,
}

/// Sentinel substitutions applied by the cleaner.
pub const FILL_RULES: [FillRule; 6] = [
    FillRule {
        column: COUNTRY,
        sentinel: "Necunoscuta",
    },
    FillRule {
        column: RATING,
        sentinel: "Necunoscut",
    },
    FillRule {
        column: TYPE,
        sentinel: "Necunoscut",
    },
    FillRule {
        column: DIRECTOR,
        sentinel: "Necunoscut",
    },
    FillRule {
        column: ACTORS,
        sentinel: "Necunoscut",
    },
    FillRule {
        column: CATEGORY,
        sentinel: "Fara categorie",
    },
];

/// Name of the label-encoded column for `column`.
pub fn code_column(column: &str) -> String {
    format!("{column}{CODE_SUFFIX}")
}

/// Kind of catalog entry, read from the `tip` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogType {
    Movie,
    TvShow,
    Unknown,
}

impl CatalogType {
    /// Parse the raw `tip` cell. Anything unrecognised, including the fill
    /// sentinel, is [`CatalogType::Unknown`].
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Movie" => Self::Movie,
            "TV Show" => Self::TvShow,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::TvShow => "TV Show",
            Self::Unknown => "Necunoscut",
        }
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rules_cover_six_columns() {
        let columns: Vec<&str> = FILL_RULES.iter().map(|r| r.column).collect();
        assert_eq!(
            columns,
            vec![COUNTRY, RATING, TYPE, DIRECTOR, ACTORS, CATEGORY]
        );
        assert!(FILL_RULES.iter().all(|r| SOURCE_COLUMNS.contains(&r.column)));
    }

    #[test]
    fn test_code_column() {
        assert_eq!(code_column(TYPE), "tip_cod");
        assert_eq!(code_column(COUNTRY), "tara_cod");
    }

    #[test]
    fn test_catalog_type_from_label() {
        assert_eq!(CatalogType::from_label("Movie"), CatalogType::Movie);
        assert_eq!(CatalogType::from_label(" TV Show "), CatalogType::TvShow);
        assert_eq!(CatalogType::from_label("Necunoscut"), CatalogType::Unknown);
        assert_eq!(CatalogType::TvShow.to_string(), "TV Show");
    }
}
