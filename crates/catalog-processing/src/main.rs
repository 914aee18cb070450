//! CLI entry point for the catalog dashboard.

use anyhow::{Result, anyhow};
use catalog_processing::{
    Codebook, DurationFill, OutlierPolicy, Page, Pipeline, PipelineConfig, PipelineError,
    PipelineSummary, PreparedCatalog, RenderOptions, ScaledColumn, ScalingMode, render_page,
};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};

/// Which of the two dashboard variants to start from
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPreset {
    /// Remove outliers, standard scaling, drop rows without duration
    Standard,
    /// Keep outliers, min-max scaling, mean-filled durations
    Minmax,
}

impl From<CliPreset> for PipelineConfig {
    fn from(cli: CliPreset) -> Self {
        match cli {
            CliPreset::Standard => PipelineConfig::standard_preset(),
            CliPreset::Minmax => PipelineConfig::minmax_preset(),
        }
    }
}

/// CLI-compatible outlier policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierPolicy {
    /// Drop rows outside the IQR fences
    Remove,
    /// Keep every row
    Keep,
}

impl From<CliOutlierPolicy> for OutlierPolicy {
    fn from(cli: CliOutlierPolicy) -> Self {
        match cli {
            CliOutlierPolicy::Remove => OutlierPolicy::Remove,
            CliOutlierPolicy::Keep => OutlierPolicy::Keep,
        }
    }
}

/// CLI-compatible scaling mode enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScaling {
    /// Zero mean, unit variance
    Standard,
    /// Rescale to [0, 1]
    Minmax,
    /// Append both
    Both,
}

impl From<CliScaling> for ScalingMode {
    fn from(cli: CliScaling) -> Self {
        match cli {
            CliScaling::Standard => ScalingMode::Standard,
            CliScaling::Minmax => ScalingMode::MinMax,
            CliScaling::Both => ScalingMode::Both,
        }
    }
}

/// CLI-compatible duration fill enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDurationFill {
    /// Unparseable durations stay null
    Null,
    /// Fill with the mean of parsed durations
    Mean,
}

impl From<CliDurationFill> for DurationFill {
    fn from(cli: CliDurationFill) -> Self {
        match cli {
            CliDurationFill::Null => DurationFill::LeaveNull,
            CliDurationFill::Mean => DurationFill::Mean,
        }
    }
}

/// Dashboard page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliPage {
    Dataset,
    Statistics,
    AddedInYear,
    Codes,
    Aggregates,
    All,
}

impl CliPage {
    fn pages(self) -> Vec<Page> {
        match self {
            Self::Dataset => vec![Page::Dataset],
            Self::Statistics => vec![Page::DescriptiveStatistics],
            Self::AddedInYear => vec![Page::AddedInYear],
            Self::Codes => vec![Page::CategoryCodes],
            Self::Aggregates => vec![Page::StatisticalSummaries],
            Self::All => Page::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Streaming catalog data preparation and terminal dashboard",
    long_about = "Loads a catalog CSV, cleans it, derives minute durations, encodes \
                  categories, appends scaled columns and prints the dashboard pages.\n\n\
                  EXAMPLES:\n  \
                  # All pages, standard preset\n  \
                  catalog-processing -i Netflix.csv\n\n  \
                  # Min-max variant, only the category codes\n  \
                  catalog-processing -i Netflix.csv --preset minmax --page codes\n\n  \
                  # Titles added in 2019\n  \
                  catalog-processing -i Netflix.csv --page added-in-year --year 2019\n\n  \
                  # Machine-readable summary\n  \
                  catalog-processing -i Netflix.csv --json | jq .summary"
)]
struct Args {
    /// Path to the catalog CSV
    #[arg(short, long)]
    input: PathBuf,

    /// JSON pipeline configuration; preset and flags are applied on top
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset to start from when no --config is given
    #[arg(long, value_enum, default_value = "standard")]
    preset: CliPreset,

    /// Override the outlier policy
    #[arg(long, value_enum)]
    outliers: Option<CliOutlierPolicy>,

    /// Override the scaling mode
    #[arg(long, value_enum)]
    scaling: Option<CliScaling>,

    /// Override the duration fill policy
    #[arg(long, value_enum)]
    duration_fill: Option<CliDurationFill>,

    /// Treat literal "None" cells as missing
    #[arg(long)]
    normalize_none: bool,

    /// Page to render
    #[arg(short, long, value_enum, default_value = "all")]
    page: CliPage,

    /// Year of the added-in-year page
    #[arg(long, default_value = "2017")]
    year: i32,

    /// Rows shown per table preview
    #[arg(long, default_value = "10")]
    rows: usize,

    /// Output JSON to stdout instead of the pages
    ///
    /// Disables all progress logs; only outputs the summary, codebook and
    /// scaling parameters. Useful for piping: `... --json | jq .codebook`
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Machine-readable output of `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    input: String,
    config: &'a PipelineConfig,
    summary: &'a PipelineSummary,
    codebook: &'a Codebook,
    scaled_columns: &'a [ScaledColumn],
}

#[derive(Serialize)]
struct JsonError<'a> {
    error: &'a PipelineError,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    let pipeline = build_pipeline(&args, config)?;

    let prepared = match pipeline.run(&args.input) {
        Ok(prepared) => prepared,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&JsonError { error: &e })?);
            }
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    if args.json {
        let report = JsonReport {
            input: args.input.display().to_string(),
            config: &prepared.config,
            summary: &prepared.summary,
            codebook: &prepared.codebook,
            scaled_columns: &prepared.scaled_columns,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    render_pages(&prepared, &args)
}

/// Config file or preset first, then the explicit flags.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PipelineConfig::from_json_file(path)?
        }
        None => args.preset.into(),
    };

    let mut builder = PipelineConfig::builder().base(base);

    if let Some(policy) = args.outliers {
        builder = builder.outlier_policy(policy.into());
    }
    if let Some(scaling) = args.scaling {
        builder = builder.scaling(scaling.into());
    }
    if let Some(fill) = args.duration_fill {
        builder = builder.duration_fill(fill.into());
    }
    if args.normalize_none {
        builder = builder.normalize_none_literal(true);
    }

    Ok(builder.build()?)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Print the summary header and the selected pages to stdout.
///
/// Uses stdout directly rather than logging: the pages are the program's
/// output and must show regardless of the log level.
fn render_pages(prepared: &PreparedCatalog, args: &Args) -> Result<()> {
    let summary = &prepared.summary;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out, "CATALOG: {}", args.input.display())?;
    writeln!(
        out,
        "  Rows: {} -> {} ({} removed, {} outliers)",
        summary.rows_before, summary.rows_after, summary.rows_removed, summary.outliers_removed
    )?;
    writeln!(
        out,
        "  Columns: {} -> {}",
        summary.columns_before, summary.columns_after
    )?;
    writeln!(out, "  Duration: {}ms", summary.duration_ms)?;
    for action in &summary.actions {
        writeln!(out, "  {}", action)?;
    }
    for warning in &summary.warnings {
        writeln!(out, "  Warning: {}", warning)?;
    }
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out)?;

    let options = RenderOptions {
        rows: args.rows,
        year: args.year,
        ..RenderOptions::default()
    };

    for page in args.page.pages() {
        render_page(prepared, page, &options, &mut out)?;
    }

    Ok(())
}
