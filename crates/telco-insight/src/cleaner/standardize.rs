//! Text standardization: trims every string column and upper-cases the
//! code-column set. Non-text columns are skipped silently.

use crate::error::Result;
use crate::schema;
use polars::prelude::*;
use tracing::{debug, info};

pub(crate) fn standardize_text_fields(df: &mut DataFrame) -> Result<()> {
    info!("Standardizing text fields...");

    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for name in &column_names {
        let trimmed = {
            let col = df.column(name)?;
            let series = col.as_materialized_series();
            if series.dtype() != &DataType::String {
                continue;
            }
            let ca = series.str()?;
            let values: Vec<Option<String>> = ca
                .into_iter()
                .map(|v| v.map(|s| s.trim().to_string()))
                .collect();
            Series::new(name.as_str().into(), values)
        };
        df.replace(name, trimmed)?;
    }

    for code_col in schema::CODE_COLUMNS {
        let Ok(col) = df.column(code_col) else {
            continue;
        };
        let series = col.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }
        let ca = series.str()?;
        let values: Vec<Option<String>> = ca
            .into_iter()
            .map(|v| v.map(|s| s.to_uppercase()))
            .collect();
        let upper = Series::new(code_col.into(), values);
        df.replace(code_col, upper)?;
    }

    debug!("Text standardization completed");
    Ok(())
}
