//! Statistical analysis of cleaned customer record sets.
//!
//! Eight independent, side-effect-free views plus a rule-based insight
//! generator. Views share no state and only read the frame, so they could be
//! evaluated in any order; the reference behavior evaluates them in the fixed
//! order below so logs and insight lists are reproducible.

mod cohorts;
mod insights;
mod views;

pub use cohorts::{
    ActivationTrend, GeographicStats, SegmentCell, SegmentationStats, StaffPerformance,
    StaffStats, TemporalStats,
};
pub use insights::{CHURN_CRITICAL_SHARE, SERVICE_ADOPTION_FLOOR, ZERO_BALANCE_SHARE};
pub use views::{
    BalanceStats, ChurnStats, CompletenessCounts, DateRange, DescriptiveStats, OverviewStats,
    ServiceStats,
};

use crate::config::CleanerConfig;
use crate::types::Insight;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The full statistics object: eight views plus the generated insights.
/// Everything inside is JSON-serializable primitives; dates are ISO-8601
/// strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub overview: OverviewStats,
    pub balance_analysis: BalanceStats,
    pub service_analysis: ServiceStats,
    pub churn_analysis: ChurnStats,
    pub geographic_analysis: GeographicStats,
    pub staff_performance: StaffStats,
    pub temporal_trends: TemporalStats,
    pub segmentation: SegmentationStats,
    pub insights: Vec<Insight>,
}

/// Computes aggregate views over a cleaned frame.
///
/// Carries the two pieces of cleaner configuration the views depend on: the
/// top segment label (for the high-value headlines) and the upper bin edge
/// (for the at-cap count).
pub struct StatisticalAnalyzer {
    balance_cap: f64,
    top_segment: String,
}

impl StatisticalAnalyzer {
    /// Build an analyzer matching the cleaner's segmentation setup.
    pub fn new(config: &CleanerConfig) -> Self {
        Self {
            balance_cap: config.balance_cap(),
            top_segment: config.top_segment_label().to_string(),
        }
    }

    /// Run all eight views and the insight generator.
    ///
    /// Never fails on well-formed cleaned input; a missing derived column
    /// degrades the affected view to zero/empty defaults.
    pub fn analyze_all(&self, df: &DataFrame) -> DatasetStatistics {
        info!("Starting comprehensive statistical analysis...");

        let overview = views::analyze_overview(df);
        let balance_analysis = views::analyze_balance(df, self.balance_cap);
        let service_analysis = views::analyze_service_adoption(df);
        let churn_analysis = views::analyze_churn_risk(df);
        let geographic_analysis = cohorts::analyze_geographic(df);
        let staff_performance = cohorts::analyze_staff_performance(df);
        let temporal_trends = cohorts::analyze_temporal_trends(df);
        let segmentation = cohorts::analyze_segmentation(df, &self.top_segment);

        let insights = insights::generate_insights(&insights::RuleInputs {
            overview: &overview,
            balance: &balance_analysis,
            service: &service_analysis,
            churn: &churn_analysis,
            staff: &staff_performance,
        });

        info!("Statistical analysis completed");
        DatasetStatistics {
            overview,
            balance_analysis,
            service_analysis,
            churn_analysis,
            geographic_analysis,
            staff_performance,
            temporal_trends,
            segmentation,
            insights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use pretty_assertions::assert_eq;

    fn analyzer() -> StatisticalAnalyzer {
        StatisticalAnalyzer::new(&CleanerConfig::default())
    }

    fn cleaned_frame() -> DataFrame {
        df![
            schema::TOTAL_BALANCE => [Some(0.0), Some(7000.0), Some(20000.0)],
            schema::BALANCE_SEGMENT => [Some("None"), Some("Medium"), Some("High")],
            schema::HAS_SERVICE => [false, true, true],
            schema::SERVICE_CODE => [None, Some("4G_DATA"), Some("TV_BASIC")],
            schema::CHURN_RISK => [Some("High"), Some("Low"), Some("High")],
            schema::DAYS_TO_EXPIRE => [Some(3i64), Some(90), Some(12)],
            schema::STAFF_CODE => [Some("UNASSIGNED"), Some("NV01"), Some("NV01")],
            schema::PROVINCE_NAME => [Some("Hanoi"), Some("Hue"), Some("Hue")],
            schema::BTS_NAME => [Some("BTS-01"), Some("BTS-02"), Some("BTS-02")],
            schema::DATE_ENTER_ACTIVE => [Some("2023-01-10"), Some("2022-06-01"), Some("2024-02-20")],
            schema::ACCT_EXPIRE_DATE => [Some("2024-06-04"), Some("2024-08-30"), Some("2024-06-13")],
            schema::ACCOUNT_AGE_DAYS => [Some(500i64), Some(730), Some(100)],
        ]
        .unwrap()
    }

    #[test]
    fn test_analyze_all_partitions_are_consistent() {
        let stats = analyzer().analyze_all(&cleaned_frame());
        let total = stats.overview.total_customers;

        assert_eq!(
            stats.service_analysis.customers_with_service
                + stats.service_analysis.customers_without_service,
            total
        );

        let segment_total: usize = stats
            .balance_analysis
            .segment_distribution
            .iter()
            .map(|s| s.count)
            .sum();
        assert_eq!(segment_total, total);

        let matrix_total: usize = stats
            .segmentation
            .segment_matrix
            .values()
            .map(|c| c.customer_count)
            .sum();
        assert_eq!(matrix_total, total);

        // Churn high + low partitions the set.
        assert_eq!(stats.churn_analysis.high_risk_count, 2);
        assert_eq!(total - stats.churn_analysis.high_risk_count, 1);
    }

    #[test]
    fn test_analyze_all_headline_numbers() {
        let stats = analyzer().analyze_all(&cleaned_frame());

        assert_eq!(stats.balance_analysis.customers_at_cap, 1);
        assert_eq!(stats.segmentation.high_value_customers, 1);
        assert_eq!(stats.segmentation.at_risk_high_value, 1);
        assert_eq!(stats.staff_performance.unassigned_customers, 1);
        assert!((stats.service_analysis.adoption_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_insights_fire_from_real_views() {
        let stats = analyzer().analyze_all(&cleaned_frame());

        // One unassigned customer and 1/3 zero-balance customers fire the
        // two Medium rules; adoption (66%) and churn (66%) stay quiet.
        let categories: Vec<&str> = stats
            .insights
            .iter()
            .map(|i| i.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Balance Distribution", "Staff Assignment"]);
    }

    #[test]
    fn test_analyze_all_empty_frame() {
        let stats = analyzer().analyze_all(&DataFrame::empty());

        assert_eq!(stats.overview.total_customers, 0);
        assert_eq!(stats.balance_analysis.total_balance, 0.0);
        assert!(stats.segmentation.segment_matrix.is_empty());
        assert!(stats.insights.is_empty());
    }

    #[test]
    fn test_statistics_serialize_to_json() {
        let stats = analyzer().analyze_all(&cleaned_frame());
        let json = serde_json::to_value(&stats).unwrap();

        assert!(json.get("overview").is_some());
        assert!(json.get("segmentation").is_some());
        assert_eq!(
            json["overview"]["total_customers"],
            serde_json::json!(3)
        );
        // Dates surface as ISO-8601 strings.
        assert_eq!(
            json["overview"]["date_range"]["earliest_activation"],
            serde_json::json!("2022-06-01")
        );
    }
}
