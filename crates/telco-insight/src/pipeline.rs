//! Orchestration: clean, then analyze.

use crate::analyzer::{DatasetStatistics, StatisticalAnalyzer};
use crate::cleaner::DataCleaner;
use crate::config::CleanerConfig;
use crate::error::Result;
use crate::types::CleaningReport;
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::info;

/// Everything one pipeline run produces.
pub struct PipelineOutcome {
    pub cleaned: DataFrame,
    pub report: CleaningReport,
    pub statistics: DatasetStatistics,
}

/// Runs the cleaner and the analyzer back to back over one record set.
///
/// Each `run` operates on its own copy and returns fresh results, so
/// concurrent runs with different inputs are safe.
pub struct AnalysisPipeline {
    cleaner: DataCleaner,
    analyzer: StatisticalAnalyzer,
}

impl AnalysisPipeline {
    /// Build a pipeline; fails only on invalid configuration.
    pub fn new(config: CleanerConfig, as_of: NaiveDate) -> Result<Self> {
        let analyzer = StatisticalAnalyzer::new(&config);
        let cleaner = DataCleaner::new(config, as_of)?;
        Ok(Self { cleaner, analyzer })
    }

    pub fn cleaner(&self) -> &DataCleaner {
        &self.cleaner
    }

    /// Clean `df` and compute the statistics over the cleaned frame.
    pub fn run(&self, df: &DataFrame) -> Result<PipelineOutcome> {
        info!("Running cleaning and analysis pipeline...");
        let (cleaned, report) = self.cleaner.clean(df)?;
        let statistics = self.analyzer.analyze_all(&cleaned);
        Ok(PipelineOutcome {
            cleaned,
            report,
            statistics,
        })
    }
}
