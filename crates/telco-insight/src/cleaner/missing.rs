//! Missing-value pass: applies the per-field strategy map.
//!
//! Fields are processed in a fixed order because the owning-unit fallback
//! reads `province_name` for rows still null after forward filling; every
//! fill must land before the derived-column pass runs.

use crate::config::{CleanerConfig, MissingValueStrategy};
use crate::error::Result;
use crate::schema::{self, SchemaProbe};
use crate::types::CleaningReport;
use crate::utils::{fill_string_nulls, string_column};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Application order for the production strategy map. Any extra configured
/// fields run afterwards in name order.
const FILL_ORDER: [&str; 3] = [schema::STAFF_CODE, schema::OWNING_UNIT, schema::BTS_NAME];

pub(crate) fn handle_missing_values(
    df: &mut DataFrame,
    config: &CleanerConfig,
    probe: &SchemaProbe,
    report: &mut CleaningReport,
) -> Result<()> {
    info!("Handling missing values...");

    let mut ordered: Vec<&str> = FILL_ORDER
        .iter()
        .copied()
        .filter(|f| config.missing_value_strategy.contains_key(*f))
        .collect();
    for field in config.missing_value_strategy.keys() {
        if !ordered.iter().any(|f| f == field) {
            ordered.push(field.as_str());
        }
    }

    for field in ordered {
        let strategy = &config.missing_value_strategy[field];
        apply_strategy(df, field, strategy, probe, report)?;
    }

    Ok(())
}

fn apply_strategy(
    df: &mut DataFrame,
    field: &str,
    strategy: &MissingValueStrategy,
    probe: &SchemaProbe,
    report: &mut CleaningReport,
) -> Result<()> {
    match strategy {
        MissingValueStrategy::KeepNull => {
            if !probe.has(field) {
                report.note_absent_column(field);
            }
            debug!("Keeping nulls in '{}'", field);
        }
        MissingValueStrategy::FillConstant(value) => {
            if !probe.has(field) {
                let filled: Vec<Option<String>> = vec![Some(value.clone()); df.height()];
                df.with_column(Series::new(field.into(), filled))?;
                report.note_absent_column(field);
                report.add_warning(format!(
                    "Column '{}' absent from source; created with constant '{}'",
                    field, value
                ));
                warn!(
                    "Column '{}' absent from source, created with constant '{}'",
                    field, value
                );
                return Ok(());
            }

            let missing = df.column(field)?.null_count();
            if missing > 0 {
                let series = string_series(df, field)?;
                let filled = fill_string_nulls(&series, value)?;
                df.replace(field, filled)?;
                info!("Filled {} missing {} with '{}'", missing, field, value);
            }
        }
        MissingValueStrategy::ForwardFill => {
            if !probe.has(field) {
                df.with_column(Series::new(
                    field.into(),
                    vec![None::<String>; df.height()],
                ))?;
                report.note_absent_column(field);
                warn!("Column '{}' absent from source, created as null", field);
                return Ok(());
            }

            let missing = df.column(field)?.null_count();
            if missing > 0 {
                let series = string_series(df, field)?;
                let filled = forward_fill(&series);
                df.replace(field, filled)?;
                info!("Forward-filled {} missing {} values", missing, field);
            }
        }
        MissingValueStrategy::ForwardFillThenFallback(fallback) => {
            if !probe.has(field) {
                // No history to propagate; take the fallback column directly.
                let values = string_column(df, fallback);
                let values = if values.is_empty() {
                    vec![None::<String>; df.height()]
                } else {
                    values
                };
                df.with_column(Series::new(field.into(), values))?;
                report.note_absent_column(field);
                warn!(
                    "Column '{}' absent from source, seeded from '{}'",
                    field, fallback
                );
                return Ok(());
            }

            let missing = df.column(field)?.null_count();
            if missing > 0 {
                let series = string_series(df, field)?;
                let filled = forward_fill(&series);
                let filled = fill_from_fallback(df, &filled, fallback);
                df.replace(field, filled)?;
                info!("Filled {} missing {} values", missing, field);
            }
        }
    }

    Ok(())
}

/// Fetch a column as a String series, casting other dtypes through polars.
fn string_series(df: &DataFrame, field: &str) -> Result<Series> {
    let col = df.column(field)?;
    let series = col.as_materialized_series();
    if series.dtype() == &DataType::String {
        Ok(series.clone())
    } else {
        Ok(series.cast(&DataType::String)?)
    }
}

/// Propagate the last non-null value downward.
fn forward_fill(series: &Series) -> Series {
    let mut last: Option<String> = None;
    let out: Vec<Option<String>> = match series.str() {
        Ok(ca) => ca
            .into_iter()
            .map(|v| match v {
                Some(s) => {
                    last = Some(s.to_string());
                    Some(s.to_string())
                }
                None => last.clone(),
            })
            .collect(),
        Err(_) => vec![None; series.len()],
    };
    Series::new(series.name().clone(), out)
}

/// Replace remaining nulls with the same-row value of `fallback`.
fn fill_from_fallback(df: &DataFrame, series: &Series, fallback: &str) -> Series {
    let alt = string_column(df, fallback);
    let out: Vec<Option<String>> = match series.str() {
        Ok(ca) => ca
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.map(str::to_string)
                    .or_else(|| alt.get(i).cloned().flatten())
            })
            .collect(),
        Err(_) => vec![None; series.len()],
    };
    Series::new(series.name().clone(), out)
}
