//! Derived-column pass.
//!
//! Columns are computed in dependency order: `has_service`,
//! `account_age_days`, `days_to_expire`, `churn_risk`, `balance_segment`.
//! A step whose source column is absent emits a constant default for every
//! row and records the event, so downstream code can rely on every derived
//! column existing.

use crate::config::CleanerConfig;
use crate::error::Result;
use crate::schema::{self, SchemaProbe};
use crate::types::CleaningReport;
use crate::utils::{int_column, mean, numeric_column, parse_flexible_date, string_column};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{debug, info, warn};

pub(crate) fn create_derived_columns(
    df: &mut DataFrame,
    config: &CleanerConfig,
    probe: &SchemaProbe,
    as_of: NaiveDate,
    report: &mut CleaningReport,
) -> Result<()> {
    info!("Creating derived columns...");
    let height = df.height();

    // has_service: presence of a service code.
    if probe.has(schema::SERVICE_CODE) {
        let service = string_column(df, schema::SERVICE_CODE);
        let has: Vec<bool> = service.iter().map(|v| v.is_some()).collect();
        let with_service = has.iter().filter(|h| **h).count();
        if height > 0 {
            info!(
                "has_service: {} customers with service ({:.1}%)",
                with_service,
                with_service as f64 / height as f64 * 100.0
            );
        }
        df.with_column(Series::new(schema::HAS_SERVICE.into(), has))?;
    } else {
        warn!("service_code column not found, has_service defaulted to false");
        report.note_absent_column(schema::SERVICE_CODE);
        report.add_warning(
            "Column 'service_code' absent from source; has_service defaulted to false"
                .to_string(),
        );
        df.with_column(Series::new(schema::HAS_SERVICE.into(), vec![false; height]))?;
    }

    // account_age_days: days between activation and the pipeline's as-of date.
    match normalize_date_column(df, schema::DATE_ENTER_ACTIVE)? {
        Some(dates) => {
            let ages: Vec<Option<i64>> = dates
                .iter()
                .map(|d| d.map(|d| (as_of - d).num_days()))
                .collect();
            let known: Vec<f64> = ages.iter().flatten().map(|v| *v as f64).collect();
            if let Some(m) = mean(&known) {
                info!("account_age_days: mean = {:.0} days", m);
            }
            df.with_column(Series::new(schema::ACCOUNT_AGE_DAYS.into(), ages))?;
        }
        None => {
            warn!("date_enter_active column not found, account_age_days defaulted to null");
            report.note_absent_column(schema::DATE_ENTER_ACTIVE);
            report.add_warning(
                "Column 'date_enter_active' absent from source; account_age_days defaulted to null"
                    .to_string(),
            );
            df.with_column(Series::new(
                schema::ACCOUNT_AGE_DAYS.into(),
                vec![None::<i64>; height],
            ))?;
        }
    }

    // days_to_expire: days between the as-of date and expiry.
    match normalize_date_column(df, schema::ACCT_EXPIRE_DATE)? {
        Some(dates) => {
            let days: Vec<Option<i64>> = dates
                .iter()
                .map(|d| d.map(|d| (d - as_of).num_days()))
                .collect();
            let known: Vec<f64> = days.iter().flatten().map(|v| *v as f64).collect();
            if let Some(m) = mean(&known) {
                info!("days_to_expire: mean = {:.0} days", m);
            }
            df.with_column(Series::new(schema::DAYS_TO_EXPIRE.into(), days))?;
        }
        None => {
            warn!(
                "acct_expire_date column not found, days_to_expire defaulted to {}",
                schema::EXPIRY_SENTINEL_DAYS
            );
            report.note_absent_column(schema::ACCT_EXPIRE_DATE);
            report.add_warning(format!(
                "Column 'acct_expire_date' absent from source; days_to_expire defaulted to {}",
                schema::EXPIRY_SENTINEL_DAYS
            ));
            df.with_column(Series::new(
                schema::DAYS_TO_EXPIRE.into(),
                vec![Some(schema::EXPIRY_SENTINEL_DAYS); height],
            ))?;
        }
    }

    // churn_risk: expiring within the configured window.
    let days = int_column(df, schema::DAYS_TO_EXPIRE);
    let threshold = config.churn_risk_days;
    let risk: Vec<Option<String>> = days
        .iter()
        .map(|d| {
            let label = match d {
                Some(v) if *v < threshold => schema::CHURN_HIGH,
                _ => schema::CHURN_LOW,
            };
            Some(label.to_string())
        })
        .collect();
    let high_risk = risk
        .iter()
        .filter(|r| r.as_deref() == Some(schema::CHURN_HIGH))
        .count();
    if height > 0 {
        info!(
            "churn_risk: {} customers at high risk ({:.1}%)",
            high_risk,
            high_risk as f64 / height as f64 * 100.0
        );
    }
    df.with_column(Series::new(schema::CHURN_RISK.into(), risk))?;

    // balance_segment: configured bins over the main-account balance.
    if probe.has(schema::TOTAL_BALANCE) {
        let balances = numeric_column(df, schema::TOTAL_BALANCE);
        let segments: Vec<Option<String>> = balances
            .iter()
            .map(|b| {
                b.map(|v| {
                    segment_label(v, &config.balance_segment_bins, &config.balance_segment_labels)
                        .to_string()
                })
            })
            .collect();
        df.with_column(Series::new(schema::BALANCE_SEGMENT.into(), segments))?;
        debug!("balance_segment computed over {} bins", config.balance_segment_labels.len());
    } else {
        let label = config
            .balance_segment_labels
            .first()
            .cloned()
            .unwrap_or_default();
        warn!(
            "total_balance column not found, balance_segment defaulted to '{}'",
            label
        );
        report.note_absent_column(schema::TOTAL_BALANCE);
        report.add_warning(format!(
            "Column 'total_balance' absent from source; balance_segment defaulted to '{}'",
            label
        ));
        df.with_column(Series::new(
            schema::BALANCE_SEGMENT.into(),
            vec![Some(label); height],
        ))?;
    }

    Ok(())
}

/// Parse a heterogeneous date column, coerce failures to null, and rewrite
/// the column as ISO-8601 strings. Returns `None` when the column is absent.
fn normalize_date_column(
    df: &mut DataFrame,
    name: &str,
) -> Result<Option<Vec<Option<NaiveDate>>>> {
    if df.column(name).is_err() {
        return Ok(None);
    }

    let raw = string_column(df, name);
    let parsed: Vec<Option<NaiveDate>> = raw
        .iter()
        .map(|v| v.as_deref().and_then(parse_flexible_date))
        .collect();

    let coerced = raw
        .iter()
        .zip(&parsed)
        .filter(|(r, p)| r.is_some() && p.is_none())
        .count();
    if coerced > 0 {
        debug!("Coerced {} unparseable {} values to null", coerced, name);
    }

    let iso: Vec<Option<String>> = parsed
        .iter()
        .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    df.replace(name, Series::new(name.into(), iso))?;

    Ok(Some(parsed))
}

/// Map a balance onto its segment label using half-open lower-inclusive
/// intervals. Values below the first edge clamp to the first label; values at
/// or above the top edge clamp to the last.
pub(crate) fn segment_label<'a>(value: f64, bins: &[f64], labels: &'a [String]) -> &'a str {
    if value < bins[0] {
        return &labels[0];
    }
    for i in 0..labels.len() {
        if value >= bins[i] && value < bins[i + 1] {
            return &labels[i];
        }
    }
    &labels[labels.len() - 1]
}
