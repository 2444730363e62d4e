//! Shared helpers for column extraction, numeric summaries, and date parsing.
//!
//! The analyzer views and several cleaner passes work on plain `Vec`s pulled
//! out of the frame; every accessor here degrades to an empty vector when the
//! column is absent, so callers never need their own presence checks.

use crate::types::ValueCount;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Column Extraction
// =============================================================================

/// Extract a column as `f64` values. Absent column yields an empty vector;
/// uncastable values yield nulls.
pub fn numeric_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    let Ok(col) = df.column(name) else {
        return Vec::new();
    };
    let series = col.as_materialized_series();
    let Ok(casted) = series.cast(&DataType::Float64) else {
        return vec![None; series.len()];
    };
    match casted.f64() {
        Ok(ca) => ca.into_iter().collect(),
        Err(_) => vec![None; series.len()],
    }
}

/// Extract a column as `i64` values. Absent column yields an empty vector.
pub fn int_column(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    let Ok(col) = df.column(name) else {
        return Vec::new();
    };
    let series = col.as_materialized_series();
    let Ok(casted) = series.cast(&DataType::Int64) else {
        return vec![None; series.len()];
    };
    match casted.i64() {
        Ok(ca) => ca.into_iter().collect(),
        Err(_) => vec![None; series.len()],
    }
}

/// Extract a column as strings, casting non-string dtypes through polars.
/// Absent column yields an empty vector.
pub fn string_column(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    let Ok(col) = df.column(name) else {
        return Vec::new();
    };
    let series = col.as_materialized_series();
    let Ok(casted) = series.cast(&DataType::String) else {
        return vec![None; series.len()];
    };
    match casted.str() {
        Ok(ca) => ca.into_iter().map(|v| v.map(str::to_string)).collect(),
        Err(_) => vec![None; series.len()],
    }
}

/// Extract a boolean column. Absent column yields an empty vector.
pub fn bool_column(df: &DataFrame, name: &str) -> Vec<Option<bool>> {
    let Ok(col) = df.column(name) else {
        return Vec::new();
    };
    let series = col.as_materialized_series();
    match series.bool() {
        Ok(ca) => ca.into_iter().collect(),
        Err(_) => vec![None; series.len()],
    }
}

/// Fill null values in a string column with a constant, preserving the rest.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let ca = series.str()?;
    let filled: Vec<Option<String>> = ca
        .into_iter()
        .map(|v| {
            Some(
                v.map(str::to_string)
                    .unwrap_or_else(|| fill_value.to_string()),
            )
        })
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Numeric Summaries
// =============================================================================

/// Mean of a slice, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` for fewer than two
/// values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Linearly interpolated quantile over an ascending-sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
    }
}

/// Median via the interpolated quantile.
pub fn median(sorted: &[f64]) -> Option<f64> {
    quantile(sorted, 0.5)
}

/// Collect the non-null values of a numeric column, sorted ascending.
pub fn sorted_values(values: &[Option<f64>]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().flatten().copied().collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

// =============================================================================
// Frequency Counting
// =============================================================================

/// Count occurrences, sorted by descending count with ties broken by value.
pub fn value_counts<I>(values: I) -> Vec<ValueCount>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

// =============================================================================
// Date Parsing
// =============================================================================

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a date from the formats seen in source extracts. Unparseable input
/// is `None`, never an error.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// The `YYYY-MM` prefix of an ISO-8601 date string.
pub fn month_key(iso_date: &str) -> Option<String> {
    if iso_date.len() >= 7 {
        Some(iso_date[..7].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numeric_column_basic() {
        let df = df!["balance" => [Some(1.5), None, Some(3.0)]].unwrap();
        assert_eq!(
            numeric_column(&df, "balance"),
            vec![Some(1.5), None, Some(3.0)]
        );
    }

    #[test]
    fn test_numeric_column_absent() {
        let df = df!["other" => [1.0]].unwrap();
        assert!(numeric_column(&df, "balance").is_empty());
    }

    #[test]
    fn test_numeric_column_casts_integers() {
        let df = df!["n" => [Some(2i64), None]].unwrap();
        assert_eq!(numeric_column(&df, "n"), vec![Some(2.0), None]);
    }

    #[test]
    fn test_string_column_casts_numbers() {
        let df = df!["phone" => [Some(84912345678i64), None]].unwrap();
        assert_eq!(
            string_column(&df, "phone"),
            vec![Some("84912345678".to_string()), None]
        );
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("s".into(), &[Some("a"), None, Some("b")]);
        let filled = fill_string_nulls(&series, "X").unwrap();
        assert_eq!(filled.null_count(), 0);
        let ca = filled.str().unwrap();
        assert_eq!(ca.get(1), Some("X"));
        assert_eq!(ca.get(0), Some("a"));
    }

    #[test]
    fn test_mean_and_std() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(mean(&values), Some(3.0));
        // Sample variance = 10 / 4 = 2.5
        let std = sample_std(&values).unwrap();
        assert!((std - 2.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std(&[42.0]), None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
    }

    #[test]
    fn test_median_odd_count() {
        assert_eq!(median(&[1.0, 5.0, 9.0]), Some(5.0));
    }

    #[test]
    fn test_value_counts_ordering() {
        let counts = value_counts(
            ["b", "a", "a", "c", "a", "b"]
                .into_iter()
                .map(str::to_string),
        );
        assert_eq!(counts[0].value, "a");
        assert_eq!(counts[0].count, 3);
        assert_eq!(counts[1].value, "b");
        assert_eq!(counts[2].value, "c");
    }

    #[test]
    fn test_value_counts_tie_break_by_value() {
        let counts = value_counts(["z", "y"].into_iter().map(str::to_string));
        assert_eq!(counts[0].value, "y");
        assert_eq!(counts[1].value, "z");
    }

    #[test]
    fn test_parse_flexible_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 15).unwrap();
        assert_eq!(parse_flexible_date("2023-04-15"), Some(expected));
        assert_eq!(parse_flexible_date("2023/04/15"), Some(expected));
        assert_eq!(parse_flexible_date("15/04/2023"), Some(expected));
        assert_eq!(parse_flexible_date("15-04-2023"), Some(expected));
        assert_eq!(parse_flexible_date("20230415"), Some(expected));
        assert_eq!(parse_flexible_date("2023-04-15 09:30:00"), Some(expected));
    }

    #[test]
    fn test_parse_flexible_date_coerces_garbage_to_none() {
        assert_eq!(parse_flexible_date("not-a-date"), None);
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("2023-13-45"), None);
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key("2023-04-15"), Some("2023-04".to_string()));
        assert_eq!(month_key("bad"), None);
    }
}
