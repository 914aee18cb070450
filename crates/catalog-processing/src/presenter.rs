//! Text rendering of the dashboard pages.
//!
//! The page set is fixed; [`Page::ALL`] lists it in display order and
//! [`render_page`] is the single entry point that draws one page.

use crate::error::Result;
use crate::insights::{self, QueryOutcome};
use crate::types::PreparedCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Notice printed in place of a table without rows.
pub const EMPTY_NOTICE: &str = "(no rows)";

/// A dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// The prepared dataset without scaled columns
    Dataset,
    /// `describe` of every numeric column plus the scaled columns
    DescriptiveStatistics,
    /// Durations of titles added in the selected year
    AddedInYear,
    /// Label to code tables
    CategoryCodes,
    /// Grouped aggregates
    StatisticalSummaries,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dataset,
        Page::DescriptiveStatistics,
        Page::AddedInYear,
        Page::CategoryCodes,
        Page::StatisticalSummaries,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Dataset => "Dataset",
            Self::DescriptiveStatistics => "Descriptive statistics",
            Self::AddedInYear => "Duration of titles added in the selected year",
            Self::CategoryCodes => "Category codes",
            Self::StatisticalSummaries => "Statistical summaries",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Knobs of the text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Rows shown per table preview.
    pub rows: usize,
    /// Year of the added-in-year page.
    pub year: i32,
    /// Countries listed on the top-countries table.
    pub top_countries: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            rows: 10,
            year: 2017,
            top_countries: 10,
        }
    }
}

/// Draw `page` of `catalog` into `out`.
pub fn render_page<W: Write>(
    catalog: &PreparedCatalog,
    page: Page,
    options: &RenderOptions,
    out: &mut W,
) -> Result<()> {
    let df = &catalog.data;
    let scaled = catalog.scaled_column_names();

    writeln!(out, "=== {} ===", page.title())?;
    writeln!(out)?;

    match page {
        Page::Dataset => {
            let view = insights::unscaled_view(df, &scaled)?;
            write_table(out, &view, options.rows)?;
        }
        Page::DescriptiveStatistics => {
            write_table(out, &insights::describe_numeric(df)?, usize::MAX)?;
            write_heading(out, "Scaled values")?;
            write_table(out, &insights::scaled_view(df, &scaled)?, options.rows)?;
        }
        Page::AddedInYear => {
            let outcome = insights::added_in_year(df, options.year)?;
            if outcome.is_empty() {
                writeln!(out, "No titles with a duration were added in {}.", options.year)?;
            } else {
                writeln!(
                    out,
                    "{} titles added in {}",
                    outcome.height(),
                    options.year
                )?;
                write_table(out, &outcome, options.rows)?;
            }
        }
        Page::CategoryCodes => {
            for mapping in catalog.codebook.iter() {
                write_heading(out, &mapping.column)?;
                let table = QueryOutcome::from_frame(mapping.to_frame()?);
                write_table(out, &table, usize::MAX)?;
            }
        }
        Page::StatisticalSummaries => {
            write_heading(out, "Titles per release year and type")?;
            write_table(out, &insights::productions_per_year_and_type(df)?, options.rows)?;

            write_heading(out, "Mean duration per rating")?;
            write_table(out, &insights::mean_duration_per_rating(df)?, usize::MAX)?;

            write_heading(
                out,
                &format!("Titles per country (top {})", options.top_countries),
            )?;
            write_table(
                out,
                &insights::top_countries(df, options.top_countries)?,
                usize::MAX,
            )?;

            write_heading(out, "Mean duration per year and type")?;
            write_table(out, &insights::mean_duration_per_year_and_type(df)?, options.rows)?;

            write_heading(out, "Mean and maximum duration per rating")?;
            write_table(out, &insights::duration_mean_max_per_rating(df)?, usize::MAX)?;

            write_heading(out, "Duration per type")?;
            write_table(out, &insights::duration_stats_per_type(df)?, usize::MAX)?;
        }
    }

    writeln!(out)?;
    Ok(())
}

fn write_heading<W: Write>(out: &mut W, heading: &str) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "--- {} ---", heading)?;
    Ok(())
}

/// Print at most `rows` rows of `outcome`, or the empty notice.
fn write_table<W: Write>(out: &mut W, outcome: &QueryOutcome, rows: usize) -> Result<()> {
    match outcome {
        QueryOutcome::Empty => writeln!(out, "{}", EMPTY_NOTICE)?,
        QueryOutcome::Rows(df) => {
            if df.height() > rows {
                writeln!(out, "{}", df.head(Some(rows)))?;
                writeln!(out, "showing {} of {} rows", rows, df.height())?;
            } else {
                writeln!(out, "{}", df)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::Pipeline;
    use polars::prelude::*;

    fn catalog() -> PreparedCatalog {
        let df = df![
            "titlu" => ["A", "B", "C"],
            "tip" => ["Movie", "TV Show", "Movie"],
            "tara" => ["India", "Romania", "India"],
            "rating" => ["PG", "R", "PG"],
            "director" => ["X", "Y", "Z"],
            "actori" => ["P", "Q", "R"],
            "categorie" => ["Dramas", "Comedies", "Dramas"],
            "durata" => ["90 min", "1 Season", "100 min"],
            "anul_lansarii" => [2017i64, 2018, 2019],
            "date_adaugarii" => ["March 1, 2018", "April 2, 2018", "May 3, 2019"],
        ]
        .unwrap();

        Pipeline::builder()
            .config(PipelineConfig::minmax_preset())
            .build()
            .unwrap()
            .process(df)
            .unwrap()
    }

    fn render(page: Page, options: &RenderOptions) -> String {
        let mut out = Vec::new();
        render_page(&catalog(), page, options, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_every_page_renders() {
        for page in Page::ALL {
            let text = render(page, &RenderOptions::default());
            assert!(text.starts_with(&format!("=== {} ===", page.title())));
        }
    }

    #[test]
    fn test_added_in_year_empty_notice() {
        let text = render(Page::AddedInYear, &RenderOptions::default());
        assert!(text.contains("No titles with a duration were added in 2017."));
    }

    #[test]
    fn test_added_in_year_with_matches() {
        let options = RenderOptions {
            year: 2018,
            ..RenderOptions::default()
        };
        let text = render(Page::AddedInYear, &options);
        // the mean-filled TV show counts as well
        assert!(text.contains("2 titles added in 2018"));
    }

    #[test]
    fn test_category_codes_lists_every_mapping() {
        let text = render(Page::CategoryCodes, &RenderOptions::default());
        for column in ["tip", "rating", "tara"] {
            assert!(text.contains(&format!("--- {} ---", column)));
        }
    }

    #[test]
    fn test_dataset_preview_is_truncated() {
        let options = RenderOptions {
            rows: 2,
            ..RenderOptions::default()
        };
        let text = render(Page::Dataset, &options);
        assert!(text.contains("showing 2 of 3 rows"));
    }
}
