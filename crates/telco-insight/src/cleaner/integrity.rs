//! Integrity checks: diagnostic counts only, never blocking.

use crate::schema;
use crate::types::IntegrityCounts;
use crate::utils::{numeric_column, parse_flexible_date, string_column};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{info, warn};

pub(crate) fn check_data_integrity(df: &DataFrame, as_of: NaiveDate) -> IntegrityCounts {
    info!("Validating data integrity...");

    let negative_balances = numeric_column(df, schema::TOTAL_BALANCE)
        .iter()
        .flatten()
        .filter(|v| **v < 0.0)
        .count();

    let activation: Vec<Option<NaiveDate>> = string_column(df, schema::DATE_ENTER_ACTIVE)
        .iter()
        .map(|v| v.as_deref().and_then(parse_flexible_date))
        .collect();
    let expiry: Vec<Option<NaiveDate>> = string_column(df, schema::ACCT_EXPIRE_DATE)
        .iter()
        .map(|v| v.as_deref().and_then(parse_flexible_date))
        .collect();

    let inverted_date_ranges = activation
        .iter()
        .zip(&expiry)
        .filter(|(a, e)| matches!((a, e), (Some(a), Some(e)) if a > e))
        .count();

    let future_activations = activation
        .iter()
        .flatten()
        .filter(|d| **d > as_of)
        .count();

    if negative_balances > 0 {
        warn!("Found {} records with negative total_balance", negative_balances);
    }
    if inverted_date_ranges > 0 {
        warn!(
            "Found {} records with activation after expiry",
            inverted_date_ranges
        );
    }
    if future_activations > 0 {
        warn!(
            "Found {} records with future activation dates",
            future_activations
        );
    }

    IntegrityCounts {
        negative_balances,
        inverted_date_ranges,
        future_activations,
    }
}
