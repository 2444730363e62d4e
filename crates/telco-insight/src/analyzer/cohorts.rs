//! The grouped views: geography, staff performance, temporal trends, and
//! segmentation.

use crate::schema;
use crate::types::ValueCount;
use crate::utils::{bool_column, int_column, mean, month_key, numeric_column, string_column, value_counts};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// How many months of activation history the temporal view reports.
const TRAILING_MONTHS: usize = 24;

/// Account-age bands in days, lower-inclusive; ages past the last band clamp
/// into it.
const AGE_BANDS: [(i64, i64, &str); 4] = [
    (0, 365, "<1 year"),
    (365, 730, "1-2 years"),
    (730, 1095, "2-3 years"),
    (1095, 1460, "3-4 years"),
];
const AGE_BAND_OVERFLOW: &str = "4+ years";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeographicStats {
    /// Customers per province, ordered by descending count.
    pub provinces: Vec<ValueCount>,
    /// Ten most common base stations.
    pub top_bts_stations: Vec<ValueCount>,
    /// Mean balance per province.
    pub avg_balance_by_province: BTreeMap<String, f64>,
}

/// Aggregate for one staff code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffPerformance {
    pub staff_code: String,
    pub customer_count: usize,
    pub avg_balance: f64,
    pub total_balance: f64,
    /// Fraction of this staff's customers with an active service.
    pub service_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffStats {
    pub total_staff: usize,
    pub avg_customers_per_staff: f64,
    /// Customers carrying the UNASSIGNED sentinel.
    pub unassigned_customers: usize,
    /// Ten largest portfolios, by customer count.
    pub top_performers: Vec<StaffPerformance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationTrend {
    pub last_6_months: usize,
    pub last_12_months: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalStats {
    /// Activations per observed month (`YYYY-MM`), trailing window.
    pub monthly_activations: BTreeMap<String, usize>,
    pub avg_account_age_days: Option<f64>,
    /// Customers per age band, in band order, zero counts included.
    pub account_age_distribution: Vec<ValueCount>,
    pub activation_trend: ActivationTrend,
}

/// One cell of the segment × service matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentCell {
    pub customer_count: usize,
    pub avg_balance: f64,
    /// Fraction of the cell at high churn risk.
    pub churn_risk_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationStats {
    /// Keys like `High_with_service` / `Low_no_service`.
    pub segment_matrix: BTreeMap<String, SegmentCell>,
    /// Top segment and holding a service.
    pub high_value_customers: usize,
    /// Top segment and high churn risk.
    pub at_risk_high_value: usize,
}

pub(crate) fn analyze_geographic(df: &DataFrame) -> GeographicStats {
    info!("Analyzing geographic distribution...");

    let provinces_col = string_column(df, schema::PROVINCE_NAME);
    let balances = numeric_column(df, schema::TOTAL_BALANCE);

    let provinces = value_counts(provinces_col.iter().cloned().flatten());

    let mut top_bts_stations = value_counts(
        string_column(df, schema::BTS_NAME).into_iter().flatten(),
    );
    top_bts_stations.truncate(10);

    let mut by_province: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (i, province) in provinces_col.iter().enumerate() {
        let Some(province) = province else { continue };
        if let Some(balance) = balances.get(i).copied().flatten() {
            by_province.entry(province.clone()).or_default().push(balance);
        }
    }
    let avg_balance_by_province = by_province
        .into_iter()
        .map(|(province, values)| {
            let avg = mean(&values).unwrap_or(0.0);
            (province, avg)
        })
        .collect();

    GeographicStats {
        provinces,
        top_bts_stations,
        avg_balance_by_province,
    }
}

pub(crate) fn analyze_staff_performance(df: &DataFrame) -> StaffStats {
    info!("Analyzing staff performance...");

    let staff = string_column(df, schema::STAFF_CODE);
    let balances = numeric_column(df, schema::TOTAL_BALANCE);
    let has_service = bool_column(df, schema::HAS_SERVICE);

    struct Acc {
        count: usize,
        balances: Vec<f64>,
        with_service: usize,
    }

    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for (i, code) in staff.iter().enumerate() {
        let Some(code) = code else { continue };
        let acc = groups.entry(code.clone()).or_insert(Acc {
            count: 0,
            balances: Vec::new(),
            with_service: 0,
        });
        acc.count += 1;
        if let Some(balance) = balances.get(i).copied().flatten() {
            acc.balances.push(balance);
        }
        if has_service.get(i).copied().flatten().unwrap_or(false) {
            acc.with_service += 1;
        }
    }

    let unassigned_customers = groups
        .get(schema::UNASSIGNED_STAFF)
        .map(|acc| acc.count)
        .unwrap_or(0);

    let total_staff = groups.len();
    let counts: Vec<f64> = groups.values().map(|a| a.count as f64).collect();
    let avg_customers_per_staff = mean(&counts).unwrap_or(0.0);

    let mut top_performers: Vec<StaffPerformance> = groups
        .into_iter()
        .map(|(staff_code, acc)| StaffPerformance {
            staff_code,
            customer_count: acc.count,
            avg_balance: mean(&acc.balances).unwrap_or(0.0),
            total_balance: acc.balances.iter().sum(),
            service_rate: acc.with_service as f64 / acc.count as f64,
        })
        .collect();
    top_performers.sort_by(|a, b| {
        b.customer_count
            .cmp(&a.customer_count)
            .then_with(|| a.staff_code.cmp(&b.staff_code))
    });
    top_performers.truncate(10);

    StaffStats {
        total_staff,
        avg_customers_per_staff,
        unassigned_customers,
        top_performers,
    }
}

pub(crate) fn analyze_temporal_trends(df: &DataFrame) -> TemporalStats {
    info!("Analyzing temporal trends...");

    let mut by_month: BTreeMap<String, usize> = BTreeMap::new();
    for value in string_column(df, schema::DATE_ENTER_ACTIVE).iter().flatten() {
        if let Some(key) = month_key(value) {
            *by_month.entry(key).or_insert(0) += 1;
        }
    }

    // BTreeMap iteration is chronological for YYYY-MM keys.
    let observed: Vec<(String, usize)> = by_month.into_iter().collect();
    let tail = |months: usize| -> usize {
        observed
            .iter()
            .rev()
            .take(months)
            .map(|(_, count)| count)
            .sum()
    };
    let activation_trend = ActivationTrend {
        last_6_months: tail(6),
        last_12_months: tail(12),
    };
    let monthly_activations: BTreeMap<String, usize> = observed
        .iter()
        .rev()
        .take(TRAILING_MONTHS)
        .cloned()
        .collect();

    let ages = int_column(df, schema::ACCOUNT_AGE_DAYS);
    let known_ages: Vec<f64> = ages.iter().flatten().map(|v| *v as f64).collect();

    let mut band_counts: Vec<ValueCount> = AGE_BANDS
        .iter()
        .map(|(_, _, label)| ValueCount {
            value: label.to_string(),
            count: 0,
        })
        .chain(std::iter::once(ValueCount {
            value: AGE_BAND_OVERFLOW.to_string(),
            count: 0,
        }))
        .collect();
    for age in ages.iter().flatten() {
        let idx = AGE_BANDS
            .iter()
            .position(|(lo, hi, _)| *age >= *lo && *age < *hi)
            .unwrap_or(if *age < 0 { 0 } else { AGE_BANDS.len() });
        band_counts[idx].count += 1;
    }

    TemporalStats {
        monthly_activations,
        avg_account_age_days: mean(&known_ages),
        account_age_distribution: band_counts,
        activation_trend,
    }
}

pub(crate) fn analyze_segmentation(df: &DataFrame, top_segment: &str) -> SegmentationStats {
    info!("Analyzing customer segmentation...");

    let segments = string_column(df, schema::BALANCE_SEGMENT);
    let has_service = bool_column(df, schema::HAS_SERVICE);
    let balances = numeric_column(df, schema::TOTAL_BALANCE);
    let risk = string_column(df, schema::CHURN_RISK);

    struct Cell {
        count: usize,
        balances: Vec<f64>,
        high_risk: usize,
    }

    let mut cells: BTreeMap<String, Cell> = BTreeMap::new();
    let mut high_value_customers = 0;
    let mut at_risk_high_value = 0;

    for (i, segment) in segments.iter().enumerate() {
        let Some(segment) = segment else { continue };
        let adopter = has_service.get(i).copied().flatten().unwrap_or(false);
        let high_risk = risk
            .get(i)
            .cloned()
            .flatten()
            .is_some_and(|r| r == schema::CHURN_HIGH);

        if segment == top_segment {
            if adopter {
                high_value_customers += 1;
            }
            if high_risk {
                at_risk_high_value += 1;
            }
        }

        let suffix = if adopter { "with_service" } else { "no_service" };
        let key = format!("{}_{}", segment, suffix);
        let cell = cells.entry(key).or_insert(Cell {
            count: 0,
            balances: Vec::new(),
            high_risk: 0,
        });
        cell.count += 1;
        if let Some(balance) = balances.get(i).copied().flatten() {
            cell.balances.push(balance);
        }
        if high_risk {
            cell.high_risk += 1;
        }
    }

    let segment_matrix = cells
        .into_iter()
        .map(|(key, cell)| {
            let value = SegmentCell {
                customer_count: cell.count,
                avg_balance: mean(&cell.balances).unwrap_or(0.0),
                churn_risk_rate: cell.high_risk as f64 / cell.count as f64,
            };
            (key, value)
        })
        .collect();

    SegmentationStats {
        segment_matrix,
        high_value_customers,
        at_risk_high_value,
    }
}
