//! Canonical column names and the schema probe.
//!
//! The probe is taken once at pipeline entry; every later pass consults it
//! instead of re-checking column presence ad hoc.

use polars::prelude::*;
use std::collections::BTreeSet;

// Raw input columns.
pub const PHONE_NUMBER: &str = "phone_number";
pub const STAFF_CODE: &str = "staff_code";
pub const OWNING_UNIT: &str = "owning_unit";
pub const PROVINCE_NAME: &str = "province_name";
pub const PROVINCE_CODE: &str = "province_code";
pub const BTS_NAME: &str = "bts_name";
pub const SERVICE_CODE: &str = "service_code";
pub const LIFECYCLE_STATUS: &str = "lifecycle_status";
pub const TIME_START: &str = "time_start";
pub const TIME_END: &str = "time_end";
pub const DATE_ENTER_ACTIVE: &str = "date_enter_active";
pub const ACCT_EXPIRE_DATE: &str = "acct_expire_date";
pub const TOTAL_BALANCE: &str = "total_balance";

// Columns derived by the cleaner.
pub const HAS_SERVICE: &str = "has_service";
pub const ACCOUNT_AGE_DAYS: &str = "account_age_days";
pub const DAYS_TO_EXPIRE: &str = "days_to_expire";
pub const CHURN_RISK: &str = "churn_risk";
pub const BALANCE_SEGMENT: &str = "balance_segment";
pub const PHONE_VALID: &str = "phone_valid";

/// Identifier-style columns that are upper-cased during standardization.
pub const CODE_COLUMNS: [&str; 4] = [STAFF_CODE, PROVINCE_CODE, SERVICE_CODE, LIFECYCLE_STATUS];

/// All columns the cleaner adds to the frame.
pub const DERIVED_COLUMNS: [&str; 6] = [
    HAS_SERVICE,
    ACCOUNT_AGE_DAYS,
    DAYS_TO_EXPIRE,
    CHURN_RISK,
    BALANCE_SEGMENT,
    PHONE_VALID,
];

/// Sentinel for customers without a staff owner.
pub const UNASSIGNED_STAFF: &str = "UNASSIGNED";
/// Sentinel for records with no known base station.
pub const UNKNOWN_BTS: &str = "UNKNOWN_BTS";
/// Churn risk labels.
pub const CHURN_HIGH: &str = "High";
pub const CHURN_LOW: &str = "Low";
/// `days_to_expire` value used when the expiry column is absent entirely.
pub const EXPIRY_SENTINEL_DAYS: i64 = 999;

/// Column presence map, captured once per `clean()` call.
#[derive(Debug, Clone)]
pub struct SchemaProbe {
    present: BTreeSet<String>,
}

impl SchemaProbe {
    /// Probe the columns of a frame.
    pub fn of(df: &DataFrame) -> Self {
        let present = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        Self { present }
    }

    /// Whether the source frame carried the given column.
    pub fn has(&self, column: &str) -> bool {
        self.present.contains(column)
    }

    /// The subset of `columns` absent from the source frame.
    pub fn missing<'a>(&self, columns: &[&'a str]) -> Vec<&'a str> {
        columns
            .iter()
            .copied()
            .filter(|c| !self.has(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reports_presence() {
        let df = df![
            STAFF_CODE => [Some("NV01"), None],
            TOTAL_BALANCE => [100.0, 0.0],
        ]
        .unwrap();
        let probe = SchemaProbe::of(&df);

        assert!(probe.has(STAFF_CODE));
        assert!(probe.has(TOTAL_BALANCE));
        assert!(!probe.has(BTS_NAME));
    }

    #[test]
    fn test_probe_missing_subset() {
        let df = df![SERVICE_CODE => [Some("4G_DATA")]].unwrap();
        let probe = SchemaProbe::of(&df);

        let missing = probe.missing(&[SERVICE_CODE, BTS_NAME, OWNING_UNIT]);
        assert_eq!(missing, vec![BTS_NAME, OWNING_UNIT]);
    }

    #[test]
    fn test_probe_empty_frame() {
        let df = DataFrame::empty();
        let probe = SchemaProbe::of(&df);
        assert!(!probe.has(STAFF_CODE));
    }
}
