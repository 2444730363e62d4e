//! Data cleaning pipeline for telecom customer record sets.
//!
//! The cleaner owns all enrichment: it fills missing values per the
//! configured strategy, standardizes text, validates phone numbers, computes
//! the derived columns, and runs the diagnostic integrity checks. It works on
//! a copy of the input and never drops a row; "handling" a problem means
//! filling, flagging, or counting it.

mod derived;
mod integrity;
mod missing;
mod phone;
mod standardize;

use crate::config::CleanerConfig;
use crate::error::{PipelineError, Result};
use crate::schema::{self, SchemaProbe};
use crate::types::{CleaningReport, FieldFillStats, IntegrityCounts, QualityMetrics};
use crate::utils::{bool_column, int_column, mean, numeric_column, string_column};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

/// Cleans raw customer record sets.
///
/// The `as_of` date anchors every date computation in a run, so ages and
/// expiry windows are consistent across all records and across re-runs in
/// tests.
#[derive(Debug)]
pub struct DataCleaner {
    config: CleanerConfig,
    as_of: NaiveDate,
}

impl DataCleaner {
    /// Create a cleaner, validating the configuration up front.
    ///
    /// A malformed configuration (mismatched bins/labels, negative windows)
    /// is the one fatal error class; it is rejected here, before any record
    /// is touched.
    pub fn new(config: CleanerConfig, as_of: NaiveDate) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, as_of })
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Run the full cleaning pipeline over a copy of `df`.
    ///
    /// Returns the enriched frame plus a report of what changed. The caller's
    /// frame is never mutated, and the output always has the same row count
    /// as the input.
    pub fn clean(&self, df: &DataFrame) -> Result<(DataFrame, CleaningReport)> {
        info!("Starting data cleaning for {} records...", df.height());

        let probe = SchemaProbe::of(df);
        let missing_before: BTreeMap<String, usize> = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect();

        let mut cleaned = df.clone();
        let mut report = CleaningReport {
            original_count: df.height(),
            cleaned_count: 0,
            removed_count: 0,
            missing_values: BTreeMap::new(),
            derived_columns: schema::DERIVED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
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

        missing::handle_missing_values(&mut cleaned, &self.config, &probe, &mut report)?;
        standardize::standardize_text_fields(&mut cleaned)?;
        phone::validate_phone_numbers(&mut cleaned, &probe, &mut report)?;
        derived::create_derived_columns(
            &mut cleaned,
            &self.config,
            &probe,
            self.as_of,
            &mut report,
        )?;
        report.integrity = integrity::check_data_integrity(&cleaned, self.as_of);

        report.cleaned_count = cleaned.height();
        report.removed_count = report.original_count - report.cleaned_count;

        for (name, before) in missing_before {
            if before == 0 {
                continue;
            }
            let after = cleaned
                .column(&name)
                .map(|c| c.null_count())
                .unwrap_or(0);
            report.missing_values.insert(
                name,
                FieldFillStats {
                    missing_before: before,
                    missing_after: after,
                    filled: before.saturating_sub(after),
                },
            );
        }

        report.quality = quality_metrics(&cleaned);

        info!("Data cleaning completed. Final records: {}", cleaned.height());
        Ok((cleaned, report))
    }
}

fn quality_metrics(df: &DataFrame) -> QualityMetrics {
    let height = df.height();

    let with_service = bool_column(df, schema::HAS_SERVICE)
        .iter()
        .flatten()
        .filter(|v| **v)
        .count();
    let high_risk = string_column(df, schema::CHURN_RISK)
        .iter()
        .flatten()
        .filter(|c| c.as_str() == schema::CHURN_HIGH)
        .count();
    let ages: Vec<f64> = int_column(df, schema::ACCOUNT_AGE_DAYS)
        .iter()
        .flatten()
        .map(|v| *v as f64)
        .collect();
    let balances: Vec<f64> = numeric_column(df, schema::TOTAL_BALANCE)
        .iter()
        .flatten()
        .copied()
        .collect();

    QualityMetrics {
        service_adoption_rate: if height == 0 {
            0.0
        } else {
            with_service as f64 / height as f64
        },
        avg_account_age_days: mean(&ages),
        high_churn_risk_share: if height == 0 {
            0.0
        } else {
            high_risk as f64 / height as f64
        },
        avg_balance: mean(&balances),
    }
}
