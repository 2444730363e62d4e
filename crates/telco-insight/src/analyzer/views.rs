//! The first four aggregate views: overview, balance, service, churn.
//!
//! Every view is a pure function of the cleaned frame. A missing prerequisite
//! column yields zero/empty defaults instead of an error, so one gap never
//! blanks the whole statistics object.

use crate::schema;
use crate::types::ValueCount;
use crate::utils::{
    bool_column, int_column, mean, median, numeric_column, quantile, sample_std, sorted_values,
    string_column, value_counts,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Observed range of the two date columns, as ISO-8601 strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest_activation: Option<String>,
    pub latest_activation: Option<String>,
    pub earliest_expiration: Option<String>,
    pub latest_expiration: Option<String>,
}

/// Row/column completeness counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletenessCounts {
    pub complete_records: usize,
    pub records_with_missing: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_customers: usize,
    pub total_columns: usize,
    pub date_range: DateRange,
    pub data_quality: CompletenessCounts,
}

/// Descriptive statistics over the non-null balances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub q25: Option<f64>,
    pub q75: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceStats {
    pub descriptive_stats: DescriptiveStats,
    /// Customers per balance segment, ordered by descending count.
    pub segment_distribution: Vec<ValueCount>,
    pub total_balance: f64,
    pub customers_with_zero_balance: usize,
    /// Customers whose balance sits exactly at the top bin edge.
    pub customers_at_cap: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub adoption_rate: f64,
    pub customers_with_service: usize,
    pub customers_without_service: usize,
    pub avg_balance_with_service: Option<f64>,
    pub avg_balance_without_service: Option<f64>,
    /// Ten most common service codes among adopters.
    pub top_service_codes: Vec<ValueCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChurnStats {
    pub high_risk_count: usize,
    /// Fraction of customers classified high risk.
    pub high_risk_percentage: f64,
    pub avg_days_to_expire: Option<f64>,
    pub expiring_within_7_days: usize,
    pub expiring_within_30_days: usize,
    pub already_expired: usize,
}

pub(crate) fn analyze_overview(df: &DataFrame) -> OverviewStats {
    info!("Analyzing dataset overview...");

    let mut row_has_null = vec![false; df.height()];
    for col in df.get_columns() {
        let mask = col.as_materialized_series().is_null();
        for (i, v) in mask.into_iter().enumerate() {
            if v.unwrap_or(false) {
                row_has_null[i] = true;
            }
        }
    }
    let records_with_missing = row_has_null.iter().filter(|v| **v).count();

    let activation: Vec<String> = string_column(df, schema::DATE_ENTER_ACTIVE)
        .into_iter()
        .flatten()
        .collect();
    let expiration: Vec<String> = string_column(df, schema::ACCT_EXPIRE_DATE)
        .into_iter()
        .flatten()
        .collect();

    OverviewStats {
        total_customers: df.height(),
        total_columns: df.width(),
        date_range: DateRange {
            // ISO-8601 strings order lexicographically.
            earliest_activation: activation.iter().min().cloned(),
            latest_activation: activation.iter().max().cloned(),
            earliest_expiration: expiration.iter().min().cloned(),
            latest_expiration: expiration.iter().max().cloned(),
        },
        data_quality: CompletenessCounts {
            complete_records: df.height() - records_with_missing,
            records_with_missing,
        },
    }
}

pub(crate) fn analyze_balance(df: &DataFrame, cap: f64) -> BalanceStats {
    info!("Analyzing balance distribution...");

    let balances = numeric_column(df, schema::TOTAL_BALANCE);
    let sorted = sorted_values(&balances);

    let segment_distribution = value_counts(
        string_column(df, schema::BALANCE_SEGMENT)
            .into_iter()
            .flatten(),
    );

    BalanceStats {
        descriptive_stats: DescriptiveStats {
            mean: mean(&sorted),
            median: median(&sorted),
            std: sample_std(&sorted),
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            q25: quantile(&sorted, 0.25),
            q75: quantile(&sorted, 0.75),
        },
        segment_distribution,
        total_balance: sorted.iter().sum(),
        customers_with_zero_balance: sorted.iter().filter(|v| **v == 0.0).count(),
        customers_at_cap: sorted.iter().filter(|v| **v == cap).count(),
    }
}

pub(crate) fn analyze_service_adoption(df: &DataFrame) -> ServiceStats {
    info!("Analyzing service adoption...");

    let has_service = bool_column(df, schema::HAS_SERVICE);
    let balances = numeric_column(df, schema::TOTAL_BALANCE);
    let codes = string_column(df, schema::SERVICE_CODE);
    let height = df.height();

    let with_service = has_service
        .iter()
        .filter(|v| v.unwrap_or(false))
        .count();

    let mut balances_with = Vec::new();
    let mut balances_without = Vec::new();
    for i in 0..height {
        let adopter = has_service.get(i).copied().flatten().unwrap_or(false);
        if let Some(balance) = balances.get(i).copied().flatten() {
            if adopter {
                balances_with.push(balance);
            } else {
                balances_without.push(balance);
            }
        }
    }

    let adopter_codes = (0..height).filter_map(|i| {
        if has_service.get(i).copied().flatten().unwrap_or(false) {
            codes.get(i).cloned().flatten()
        } else {
            None
        }
    });
    let mut top_service_codes = value_counts(adopter_codes);
    top_service_codes.truncate(10);

    ServiceStats {
        adoption_rate: if height == 0 {
            0.0
        } else {
            with_service as f64 / height as f64
        },
        customers_with_service: with_service,
        customers_without_service: height - with_service,
        avg_balance_with_service: mean(&balances_with),
        avg_balance_without_service: mean(&balances_without),
        top_service_codes,
    }
}

pub(crate) fn analyze_churn_risk(df: &DataFrame) -> ChurnStats {
    info!("Analyzing churn risk...");

    let risk = string_column(df, schema::CHURN_RISK);
    let days = int_column(df, schema::DAYS_TO_EXPIRE);
    let height = df.height();

    let high_risk_count = risk
        .iter()
        .flatten()
        .filter(|r| r.as_str() == schema::CHURN_HIGH)
        .count();

    let known_days: Vec<f64> = days.iter().flatten().map(|v| *v as f64).collect();

    ChurnStats {
        high_risk_count,
        high_risk_percentage: if height == 0 {
            0.0
        } else {
            high_risk_count as f64 / height as f64
        },
        avg_days_to_expire: mean(&known_days),
        expiring_within_7_days: days.iter().flatten().filter(|d| **d < 7).count(),
        expiring_within_30_days: days.iter().flatten().filter(|d| **d < 30).count(),
        already_expired: days.iter().flatten().filter(|d| **d < 0).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cleaned_frame() -> DataFrame {
        df![
            schema::TOTAL_BALANCE => [Some(0.0), Some(7000.0), Some(20000.0), Some(500.0)],
            schema::BALANCE_SEGMENT => [Some("None"), Some("Medium"), Some("High"), Some("Low")],
            schema::HAS_SERVICE => [true, true, false, false],
            schema::SERVICE_CODE => [Some("4G_DATA"), Some("4G_DATA"), None, None],
            schema::CHURN_RISK => [Some("High"), Some("Low"), Some("Low"), Some("High")],
            schema::DAYS_TO_EXPIRE => [Some(5i64), Some(60), Some(400), Some(-3)],
            schema::DATE_ENTER_ACTIVE => [Some("2023-01-10"), Some("2021-06-01"), Some("2024-02-20"), None],
            schema::ACCT_EXPIRE_DATE => [Some("2024-06-06"), Some("2024-07-31"), Some("2025-07-06"), Some("2024-05-29")],
        ]
        .unwrap()
    }

    #[test]
    fn test_overview_counts_and_range() {
        let stats = analyze_overview(&cleaned_frame());

        assert_eq!(stats.total_customers, 4);
        assert_eq!(stats.total_columns, 8);
        assert_eq!(
            stats.date_range.earliest_activation.as_deref(),
            Some("2021-06-01")
        );
        assert_eq!(
            stats.date_range.latest_activation.as_deref(),
            Some("2024-02-20")
        );
        assert_eq!(
            stats.date_range.latest_expiration.as_deref(),
            Some("2025-07-06")
        );
        // One row has nulls (the missing service_code rows and activation).
        assert_eq!(stats.data_quality.complete_records, 2);
        assert_eq!(stats.data_quality.records_with_missing, 2);
    }

    #[test]
    fn test_balance_descriptives_and_cap() {
        let stats = analyze_balance(&cleaned_frame(), 20000.0);

        let d = &stats.descriptive_stats;
        assert_eq!(d.mean, Some(6875.0));
        assert_eq!(d.min, Some(0.0));
        assert_eq!(d.max, Some(20000.0));
        assert_eq!(stats.total_balance, 27500.0);
        assert_eq!(stats.customers_with_zero_balance, 1);
        assert_eq!(stats.customers_at_cap, 1);

        // Each segment appears once.
        assert_eq!(stats.segment_distribution.len(), 4);
        assert!(stats.segment_distribution.iter().all(|s| s.count == 1));
    }

    #[test]
    fn test_service_partition_sums_to_total() {
        let stats = analyze_service_adoption(&cleaned_frame());

        assert_eq!(stats.customers_with_service, 2);
        assert_eq!(stats.customers_without_service, 2);
        assert_eq!(
            stats.customers_with_service + stats.customers_without_service,
            4
        );
        assert_eq!(stats.adoption_rate, 0.5);
        assert_eq!(stats.avg_balance_with_service, Some(3500.0));
        assert_eq!(stats.avg_balance_without_service, Some(10250.0));
        assert_eq!(stats.top_service_codes[0].value, "4G_DATA");
        assert_eq!(stats.top_service_codes[0].count, 2);
    }

    #[test]
    fn test_churn_buckets() {
        let stats = analyze_churn_risk(&cleaned_frame());

        assert_eq!(stats.high_risk_count, 2);
        assert_eq!(stats.high_risk_percentage, 0.5);
        // days: 5, 60, 400, -3
        assert_eq!(stats.expiring_within_7_days, 2);
        assert_eq!(stats.expiring_within_30_days, 2);
        assert_eq!(stats.already_expired, 1);
        assert_eq!(stats.avg_days_to_expire, Some(115.5));
    }

    #[test]
    fn test_views_default_on_empty_frame() {
        let df = DataFrame::empty();

        let overview = analyze_overview(&df);
        assert_eq!(overview.total_customers, 0);
        assert_eq!(overview.date_range.earliest_activation, None);

        let balance = analyze_balance(&df, 20000.0);
        assert_eq!(balance.descriptive_stats.mean, None);
        assert_eq!(balance.total_balance, 0.0);

        let service = analyze_service_adoption(&df);
        assert_eq!(service.adoption_rate, 0.0);
        assert_eq!(service.customers_with_service, 0);

        let churn = analyze_churn_risk(&df);
        assert_eq!(churn.high_risk_count, 0);
        assert_eq!(churn.avg_days_to_expire, None);
    }

    #[test]
    fn test_views_default_when_derived_columns_missing() {
        // Analyzer run on a frame the cleaner never saw.
        let df = df!["unrelated" => [1.0, 2.0]].unwrap();

        let service = analyze_service_adoption(&df);
        assert_eq!(service.customers_with_service, 0);
        assert_eq!(service.customers_without_service, 2);

        let churn = analyze_churn_risk(&df);
        assert_eq!(churn.high_risk_count, 0);

        let balance = analyze_balance(&df, 20000.0);
        assert!(balance.segment_distribution.is_empty());
    }
}
