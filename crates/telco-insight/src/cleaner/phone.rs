//! Phone validation: flags records whose number does not match the
//! country-coded canonical form. Invalid numbers are never dropped.

use crate::error::Result;
use crate::schema::{self, SchemaProbe};
use crate::types::CleaningReport;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::{info, warn};

/// Canonical form: country code 84 followed by nine digits.
static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^84\d{9}$").expect("phone pattern is valid"));

pub(crate) fn validate_phone_numbers(
    df: &mut DataFrame,
    probe: &SchemaProbe,
    report: &mut CleaningReport,
) -> Result<()> {
    info!("Validating phone numbers...");

    if !probe.has(schema::PHONE_NUMBER) {
        df.with_column(Series::new(
            schema::PHONE_VALID.into(),
            vec![false; df.height()],
        ))?;
        report.note_absent_column(schema::PHONE_NUMBER);
        report.add_warning(
            "Column 'phone_number' absent from source; phone_valid defaulted to false"
                .to_string(),
        );
        warn!("phone_number column not found, phone_valid defaulted to false");
        return Ok(());
    }

    let digits = phone_digits(df)?;
    let valid: Vec<bool> = digits.iter().map(|d| PHONE_PATTERN.is_match(d)).collect();
    let canonical: Vec<Option<i64>> = digits.iter().map(|d| d.parse::<i64>().ok()).collect();

    let invalid = valid.iter().filter(|v| !**v).count();
    if invalid > 0 {
        warn!("Found {} invalid phone numbers", invalid);
        report.add_warning(format!("Found {} invalid phone numbers", invalid));
    } else {
        info!("All phone numbers are valid");
    }

    df.replace(
        schema::PHONE_NUMBER,
        Series::new(schema::PHONE_NUMBER.into(), canonical),
    )?;
    df.with_column(Series::new(schema::PHONE_VALID.into(), valid))?;

    Ok(())
}

/// Render each phone value to its digit string, stripping non-numeric noise.
/// Nulls become empty strings, which never match the pattern.
fn phone_digits(df: &DataFrame) -> Result<Vec<String>> {
    let col = df.column(schema::PHONE_NUMBER)?;
    let series = col.as_materialized_series();

    let numeric = matches!(
        series.dtype(),
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    );

    // Floats would render a fractional suffix; go through Int64 first.
    let as_string = if numeric {
        series.cast(&DataType::Int64)?.cast(&DataType::String)?
    } else {
        series.cast(&DataType::String)?
    };

    let ca = as_string.str()?;
    Ok(ca
        .into_iter()
        .map(|v| {
            v.map(|s| s.chars().filter(char::is_ascii_digit).collect::<String>())
                .unwrap_or_default()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntegrityCounts, QualityMetrics};
    use std::collections::BTreeMap;

    fn empty_report() -> CleaningReport {
        CleaningReport {
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
        }
    }

    fn bools(df: &DataFrame, col: &str) -> Vec<bool> {
        df.column(col)
            .unwrap()
            .as_materialized_series()
            .bool()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect()
    }

    #[test]
    fn test_valid_and_invalid_phones_flagged() {
        let mut df = df![
            schema::PHONE_NUMBER => [
                Some("84912345678"),   // valid
                Some("0912345678"),    // wrong prefix
                Some("84 912-345-678"),// valid after noise stripping
                None,                  // null -> invalid
            ],
        ]
        .unwrap();
        let probe = SchemaProbe::of(&df);
        let mut report = empty_report();

        validate_phone_numbers(&mut df, &probe, &mut report).unwrap();

        assert_eq!(
            bools(&df, schema::PHONE_VALID),
            vec![true, false, true, false]
        );
        // Invalid records stay in the frame.
        assert_eq!(df.height(), 4);
    }

    #[test]
    fn test_canonical_form_is_numeric() {
        let mut df = df![
            schema::PHONE_NUMBER => [Some("84912345678"), Some("garbage")],
        ]
        .unwrap();
        let probe = SchemaProbe::of(&df);
        let mut report = empty_report();

        validate_phone_numbers(&mut df, &probe, &mut report).unwrap();

        let phone = df.column(schema::PHONE_NUMBER).unwrap();
        assert_eq!(phone.dtype(), &DataType::Int64);
        let ca = phone.as_materialized_series().i64().unwrap().clone();
        assert_eq!(ca.get(0), Some(84912345678));
        // Unparseable values coerce to null, never raise.
        assert_eq!(ca.get(1), None);
    }

    #[test]
    fn test_numeric_input_column() {
        let mut df = df![
            schema::PHONE_NUMBER => [Some(84912345678i64), Some(12345i64)],
        ]
        .unwrap();
        let probe = SchemaProbe::of(&df);
        let mut report = empty_report();

        validate_phone_numbers(&mut df, &probe, &mut report).unwrap();

        assert_eq!(bools(&df, schema::PHONE_VALID), vec![true, false]);
    }

    #[test]
    fn test_absent_column_defaults_false() {
        let mut df = df![
            schema::PROVINCE_NAME => [Some("Hanoi")],
        ]
        .unwrap();
        let probe = SchemaProbe::of(&df);
        let mut report = empty_report();

        validate_phone_numbers(&mut df, &probe, &mut report).unwrap();

        assert_eq!(bools(&df, schema::PHONE_VALID), vec![false]);
        assert!(report.absent_columns.iter().any(|c| c == schema::PHONE_NUMBER));
    }
}
