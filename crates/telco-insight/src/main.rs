//! CLI entry point: read a CSV extract, clean it, analyze it, write results.

use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::Parser;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use telco_insight::{AnalysisPipeline, CleanerConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cleaning and statistical analysis for telecom customer datasets",
    long_about = "Reads a customer CSV extract, runs the cleaning pipeline and the\n\
                  statistical analyzer, and writes the cleaned data plus JSON reports.\n\n\
                  EXAMPLES:\n  \
                  # Clean and analyze with defaults\n  \
                  telco-insight -i customers.csv\n\n  \
                  # Pin the reference date for reproducible runs\n  \
                  telco-insight -i customers.csv --as-of 2024-06-01\n\n  \
                  # Custom cleaning configuration\n  \
                  telco-insight -i customers.csv --config cleaner.json"
)]
struct Args {
    /// Path to the customer CSV file
    #[arg(short, long)]
    input: String,

    /// Output directory for cleaned data and reports
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Cleaner configuration as a JSON file
    ///
    /// Missing keys fall back to the built-in defaults.
    #[arg(short, long)]
    config: Option<String>,

    /// Reference date (YYYY-MM-DD) for age and expiry computations
    ///
    /// Defaults to today. Fix it to make runs reproducible.
    #[arg(long)]
    as_of: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors)
    #[arg(short, long)]
    quiet: bool,

    /// Print the statistics JSON to stdout instead of the summary
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout carries only
/// the JSON document.
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
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let output_dir = PathBuf::from(&args.output);
    std::fs::create_dir_all(&output_dir)?;

    let config = load_config(args.config.as_deref())?;
    let as_of = resolve_as_of(args.as_of.as_deref())?;

    info!("Loading dataset from: {}", args.input);
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(&args.input)))?
        .finish()?;
    info!(
        "Loaded {} records with {} columns",
        df.height(),
        df.width()
    );

    let pipeline = AnalysisPipeline::new(config, as_of)?;
    let mut outcome = pipeline.run(&df)?;

    let cleaned_path = output_dir.join("cleaned_data.csv");
    let mut file = File::create(&cleaned_path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut outcome.cleaned)?;
    info!("Cleaned data saved: {}", cleaned_path.display());

    let report_path = output_dir.join("cleaning_report.json");
    write_json(&report_path, &serde_json::to_string_pretty(&outcome.report)?)?;
    info!("Cleaning report saved: {}", report_path.display());

    let stats_path = output_dir.join("statistical_analysis.json");
    let stats_json = serde_json::to_string_pretty(&outcome.statistics)?;
    write_json(&stats_path, &stats_json)?;
    info!("Analysis results saved: {}", stats_path.display());

    if args.json {
        println!("{}", stats_json);
    } else {
        print_summary(&outcome);
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<CleanerConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow!("Failed to read config {}: {}", path, e))?;
            let config: CleanerConfig = serde_json::from_str(&raw)
                .map_err(|e| anyhow!("Failed to parse config {}: {}", path, e))?;
            Ok(config)
        }
        None => Ok(CleanerConfig::default()),
    }
}

fn resolve_as_of(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| anyhow!("Invalid --as-of date '{}': {}", raw, e)),
        None => Ok(Local::now().date_naive()),
    }
}

fn write_json(path: &Path, contents: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// Human-readable run summary. Intentionally `println!`: this is the primary
/// output, visible regardless of log level.
fn print_summary(outcome: &telco_insight::PipelineOutcome) {
    let report = &outcome.report;
    let stats = &outcome.statistics;

    println!("\n{}", "=".repeat(80));
    println!("CLEANING SUMMARY");
    println!("{}", "=".repeat(80));
    println!("  Original records: {}", report.original_count);
    println!("  Cleaned records:  {}", report.cleaned_count);
    println!("  Records removed:  {}", report.removed_count);
    if !report.absent_columns.is_empty() {
        println!("  Absent columns:   {}", report.absent_columns.join(", "));
    }

    println!("\nKEY METRICS");
    println!("{}", "-".repeat(40));
    println!(
        "  Service adoption rate: {:.1}%",
        report.quality.service_adoption_rate * 100.0
    );
    println!(
        "  High churn risk:       {:.1}%",
        report.quality.high_churn_risk_share * 100.0
    );
    if let Some(age) = report.quality.avg_account_age_days {
        println!("  Avg account age:       {:.0} days", age);
    }
    if let Some(balance) = report.quality.avg_balance {
        println!("  Avg balance:           {:.2}", balance);
    }

    if !stats.insights.is_empty() {
        println!("\n{} BUSINESS INSIGHTS", stats.insights.len());
        println!("{}", "-".repeat(40));
        for (i, insight) in stats.insights.iter().enumerate() {
            println!(
                "  {}. [{}] {}",
                i + 1,
                insight.severity.as_str(),
                insight.category
            );
            println!("     {}", insight.message);
            println!("     -> {}", insight.recommendation);
        }
    }
    println!("{}", "=".repeat(80));
}
