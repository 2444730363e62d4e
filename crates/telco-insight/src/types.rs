//! Report and insight types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Null counts for one field before and after cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFillStats {
    pub missing_before: usize,
    pub missing_after: usize,
    pub filled: usize,
}

/// Diagnostic counts from the integrity pass. These never block cleaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityCounts {
    /// Records with a negative main-account balance.
    pub negative_balances: usize,
    /// Records whose activation date lies after the expiry date.
    pub inverted_date_ranges: usize,
    /// Records activated after the pipeline's "as of" date.
    pub future_activations: usize,
}

/// Headline quality metrics computed over the cleaned frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Fraction of customers with an active service.
    pub service_adoption_rate: f64,
    /// Mean account age in days, if any ages could be computed.
    pub avg_account_age_days: Option<f64>,
    /// Fraction of customers classified as high churn risk.
    pub high_churn_risk_share: f64,
    /// Mean main-account balance, if any balances were present.
    pub avg_balance: Option<f64>,
}

/// What the cleaner did to one record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    pub original_count: usize,
    pub cleaned_count: usize,
    /// Always `original_count - cleaned_count`; zero under the no-drop policy.
    pub removed_count: usize,
    /// Per-field null counts, for every source field that had any nulls.
    pub missing_values: BTreeMap<String, FieldFillStats>,
    /// Names of the columns the cleaner added.
    pub derived_columns: Vec<String>,
    /// Expected source columns that were absent and degraded to defaults.
    pub absent_columns: Vec<String>,
    pub integrity: IntegrityCounts,
    pub quality: QualityMetrics,
    /// Human-readable notes accumulated during cleaning.
    pub warnings: Vec<String>,
}

impl CleaningReport {
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record a source column that was absent and handled by degradation.
    pub fn note_absent_column(&mut self, column: &str) {
        if !self.absent_columns.iter().any(|c| c == column) {
            self.absent_columns.push(column.to_string());
        }
    }
}

/// Severity of a generated insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// A rule-triggered business finding derived from the aggregate views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub category: String,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

/// One value with its occurrence count, used for frequency rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_absent_column_deduplicates() {
        let mut report = CleaningReport {
            original_count: 0,
            cleaned_count: 0,
            removed_count: 0,
            missing_values: BTreeMap::new(),
            derived_columns: Vec::new(),
            absent_columns: Vec::new(),
            integrity: IntegrityCounts::default(),
            quality: QualityMetrics {
                service_adoption_rate: 0.0,
                avg_account_age_days: None,
                high_churn_risk_share: 0.0,
                avg_balance: None,
            },
            warnings: Vec::new(),
        };

        report.note_absent_column("staff_code");
        report.note_absent_column("staff_code");
        assert_eq!(report.absent_columns, vec!["staff_code".to_string()]);
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"Critical\"");
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"Medium\"");
    }

    #[test]
    fn test_report_serialization_roundtrip() {
        let report = CleaningReport {
            original_count: 10,
            cleaned_count: 10,
            removed_count: 0,
            missing_values: BTreeMap::from([(
                "staff_code".to_string(),
                FieldFillStats {
                    missing_before: 3,
                    missing_after: 0,
                    filled: 3,
                },
            )]),
            derived_columns: vec!["has_service".to_string()],
            absent_columns: vec![],
            integrity: IntegrityCounts::default(),
            quality: QualityMetrics {
                service_adoption_rate: 0.4,
                avg_account_age_days: Some(812.0),
                high_churn_risk_share: 0.1,
                avg_balance: Some(4200.5),
            },
            warnings: vec!["something".to_string()],
        };

        let json = serde_json::to_string(&report).unwrap();
        let back: CleaningReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.original_count, 10);
        assert_eq!(back.missing_values["staff_code"].filled, 3);
        assert_eq!(back.quality.avg_account_age_days, Some(812.0));
    }
}
