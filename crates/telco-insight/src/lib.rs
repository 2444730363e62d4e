//! Telco Insight
//!
//! Cleaning and statistical analysis for telecom customer record sets,
//! built on Polars.
//!
//! # Overview
//!
//! Two components, consumed in sequence:
//!
//! - **Cleaner**: fills missing values per a declarative per-field policy,
//!   standardizes text, validates phone identifiers, computes the derived
//!   columns (`has_service`, `account_age_days`, `days_to_expire`,
//!   `churn_risk`, `balance_segment`, `phone_valid`), and counts integrity
//!   violations. Rows are never dropped; problems are filled, flagged, or
//!   counted.
//! - **Analyzer**: computes eight independent aggregate views (overview,
//!   balance, service adoption, churn, geography, staff performance,
//!   temporal trends, segmentation) and turns threshold breaches into
//!   severity-tagged insights.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use telco_insight::{AnalysisPipeline, CleanerConfig};
//! use chrono::NaiveDate;
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("customers.csv".into()))?
//!     .finish()?;
//!
//! let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let pipeline = AnalysisPipeline::new(CleanerConfig::default(), as_of)?;
//! let outcome = pipeline.run(&df)?;
//!
//! println!("{} records cleaned", outcome.report.cleaned_count);
//! println!("{} insights", outcome.statistics.insights.len());
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use telco_insight::{CleanerConfig, MissingValueStrategy};
//!
//! let config = CleanerConfig::builder()
//!     .churn_risk_days(14)
//!     .balance_segments(vec![0.0, 1.0, 10000.0], vec!["None", "Some"])
//!     .strategy("bts_name", MissingValueStrategy::KeepNull)
//!     .build()?;
//! ```
//!
//! The `as_of` date is injected rather than read from the system clock, so
//! every date-derived column in one run is computed against the same instant
//! and scenario tests are deterministic.

pub mod analyzer;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analyzer::{
    BalanceStats, ChurnStats, DatasetStatistics, GeographicStats, OverviewStats,
    SegmentationStats, ServiceStats, StaffPerformance, StaffStats, StatisticalAnalyzer,
    TemporalStats,
};
pub use cleaner::DataCleaner;
pub use config::{
    CleanerConfig, CleanerConfigBuilder, ConfigValidationError, MissingValueStrategy,
};
pub use error::{PipelineError, Result};
pub use pipeline::{AnalysisPipeline, PipelineOutcome};
pub use types::{
    CleaningReport, FieldFillStats, Insight, IntegrityCounts, QualityMetrics, Severity,
    ValueCount,
};
