//! Configuration types for the cleaning pipeline.
//!
//! The per-field missing-value policy is a tagged enum rather than a string
//! dispatch: an unknown strategy is unrepresentable, and a malformed
//! bins/labels pair is rejected at construction time, before any record is
//! processed.

use crate::schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do with missing values in one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum MissingValueStrategy {
    /// Leave nulls in place; a null is meaningful for this field.
    KeepNull,
    /// Replace nulls with a fixed value.
    FillConstant(String),
    /// Propagate the last non-null value downward.
    ForwardFill,
    /// Forward fill, then take the named column's value for rows still null.
    ForwardFillThenFallback(String),
}

/// Configuration for [`DataCleaner`](crate::cleaner::DataCleaner).
///
/// All fields have defaults matching the production policy; use
/// [`CleanerConfig::builder()`] to override individual pieces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Per-field missing-value policy.
    pub missing_value_strategy: BTreeMap<String, MissingValueStrategy>,

    /// Ordered bin edges for the balance segmentation. Values fall into
    /// half-open `[edge_i, edge_i+1)` intervals; the lowest edge is
    /// inclusive and values at or above the top edge clamp to the last label.
    pub balance_segment_bins: Vec<f64>,

    /// Labels for the balance bins; must be one shorter than the edge list.
    pub balance_segment_labels: Vec<String>,

    /// Customers expiring in fewer than this many days are high churn risk.
    pub churn_risk_days: i64,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        let mut strategy = BTreeMap::new();
        strategy.insert(
            schema::STAFF_CODE.to_string(),
            MissingValueStrategy::FillConstant(schema::UNASSIGNED_STAFF.to_string()),
        );
        strategy.insert(
            schema::OWNING_UNIT.to_string(),
            MissingValueStrategy::ForwardFillThenFallback(schema::PROVINCE_NAME.to_string()),
        );
        strategy.insert(
            schema::BTS_NAME.to_string(),
            MissingValueStrategy::FillConstant(schema::UNKNOWN_BTS.to_string()),
        );
        strategy.insert(
            schema::SERVICE_CODE.to_string(),
            MissingValueStrategy::KeepNull,
        );
        strategy.insert(schema::TIME_START.to_string(), MissingValueStrategy::KeepNull);
        strategy.insert(schema::TIME_END.to_string(), MissingValueStrategy::KeepNull);

        Self {
            missing_value_strategy: strategy,
            balance_segment_bins: vec![0.0, 1.0, 5000.0, 10000.0, 20000.0],
            balance_segment_labels: vec![
                "None".to_string(),
                "Low".to_string(),
                "Medium".to_string(),
                "High".to_string(),
            ],
            churn_risk_days: 30,
        }
    }
}

impl CleanerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleanerConfigBuilder {
        CleanerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.balance_segment_bins.len() < 2 {
            return Err(ConfigValidationError::TooFewBins(
                self.balance_segment_bins.len(),
            ));
        }

        if self.balance_segment_labels.len() + 1 != self.balance_segment_bins.len() {
            return Err(ConfigValidationError::LabelCountMismatch {
                bins: self.balance_segment_bins.len(),
                labels: self.balance_segment_labels.len(),
            });
        }

        if self
            .balance_segment_bins
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(ConfigValidationError::NonMonotonicBins);
        }

        if self.churn_risk_days < 0 {
            return Err(ConfigValidationError::NegativeChurnWindow(
                self.churn_risk_days,
            ));
        }

        Ok(())
    }

    /// Label of the highest balance segment.
    pub fn top_segment_label(&self) -> &str {
        self.balance_segment_labels
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Upper edge of the balance bins; balances at exactly this value are
    /// reported as "at cap" by the analyzer.
    pub fn balance_cap(&self) -> f64 {
        self.balance_segment_bins.last().copied().unwrap_or(0.0)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("balance_segment_bins needs at least 2 edges, got {0}")]
    TooFewBins(usize),

    #[error(
        "balance_segment_labels count must be exactly bins - 1 ({bins} bins, {labels} labels)"
    )]
    LabelCountMismatch { bins: usize, labels: usize },

    #[error("balance_segment_bins must be strictly increasing")]
    NonMonotonicBins,

    #[error("churn_risk_days must be non-negative, got {0}")]
    NegativeChurnWindow(i64),
}

/// Builder for [`CleanerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleanerConfigBuilder {
    missing_value_strategy: Option<BTreeMap<String, MissingValueStrategy>>,
    balance_segment_bins: Option<Vec<f64>>,
    balance_segment_labels: Option<Vec<String>>,
    churn_risk_days: Option<i64>,
}

impl CleanerConfigBuilder {
    /// Override the missing-value strategy for a single field.
    pub fn strategy(mut self, field: impl Into<String>, strategy: MissingValueStrategy) -> Self {
        self.missing_value_strategy
            .get_or_insert_with(|| CleanerConfig::default().missing_value_strategy)
            .insert(field.into(), strategy);
        self
    }

    /// Replace the balance bin edges and labels together.
    pub fn balance_segments(
        mut self,
        bins: Vec<f64>,
        labels: Vec<impl Into<String>>,
    ) -> Self {
        self.balance_segment_bins = Some(bins);
        self.balance_segment_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Set the churn-risk window in days.
    pub fn churn_risk_days(mut self, days: i64) -> Self {
        self.churn_risk_days = Some(days);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleanerConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleanerConfig, ConfigValidationError> {
        let defaults = CleanerConfig::default();
        let config = CleanerConfig {
            missing_value_strategy: self
                .missing_value_strategy
                .unwrap_or(defaults.missing_value_strategy),
            balance_segment_bins: self
                .balance_segment_bins
                .unwrap_or(defaults.balance_segment_bins),
            balance_segment_labels: self
                .balance_segment_labels
                .unwrap_or(defaults.balance_segment_labels),
            churn_risk_days: self.churn_risk_days.unwrap_or(defaults.churn_risk_days),
        };

        config.validate()?;
        Ok(config)
    }
}
