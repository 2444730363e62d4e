//! Rule-based insight generation.
//!
//! The rule set lives in one table so thresholds are auditable and testable
//! without touching the aggregation code. Every rule is evaluated on every
//! run, in table order.

use super::cohorts::StaffStats;
use super::views::{BalanceStats, ChurnStats, OverviewStats, ServiceStats};
use crate::types::{Insight, Severity};
use tracing::info;

/// Adoption below this fraction triggers the service-adoption insight.
pub const SERVICE_ADOPTION_FLOOR: f64 = 0.30;
/// High-churn share above this fraction is a critical finding.
pub const CHURN_CRITICAL_SHARE: f64 = 0.80;
/// Zero-balance share above this fraction triggers the balance insight.
pub const ZERO_BALANCE_SHARE: f64 = 0.30;

/// The views the rules read from.
pub(crate) struct RuleInputs<'a> {
    pub overview: &'a OverviewStats,
    pub balance: &'a BalanceStats,
    pub service: &'a ServiceStats,
    pub churn: &'a ChurnStats,
    pub staff: &'a StaffStats,
}

struct InsightRule {
    category: &'static str,
    severity: Severity,
    recommendation: &'static str,
    /// Returns the message when the rule fires.
    trigger: fn(&RuleInputs) -> Option<String>,
}

static RULES: [InsightRule; 4] = [
    InsightRule {
        category: "Service Adoption",
        severity: Severity::High,
        recommendation:
            "Launch targeted campaigns to increase service adoption among existing customers.",
        trigger: low_adoption,
    },
    InsightRule {
        category: "Churn Risk",
        severity: Severity::Critical,
        recommendation: "Implement urgent retention campaigns for customers expiring soon.",
        trigger: critical_churn,
    },
    InsightRule {
        category: "Balance Distribution",
        severity: Severity::Medium,
        recommendation: "Review balance top-up incentives to ensure customer engagement.",
        trigger: widespread_zero_balance,
    },
    InsightRule {
        category: "Staff Assignment",
        severity: Severity::Medium,
        recommendation: "Assign these customers to staff for better account management.",
        trigger: unassigned_customers,
    },
];

fn low_adoption(inputs: &RuleInputs) -> Option<String> {
    if inputs.overview.total_customers == 0 {
        return None;
    }
    let rate = inputs.service.adoption_rate;
    if rate < SERVICE_ADOPTION_FLOOR {
        Some(format!(
            "Low service adoption rate ({:.1}%): {} of {} customers have no active service.",
            rate * 100.0,
            inputs.service.customers_without_service,
            inputs.overview.total_customers
        ))
    } else {
        None
    }
}

fn critical_churn(inputs: &RuleInputs) -> Option<String> {
    let share = inputs.churn.high_risk_percentage;
    if share > CHURN_CRITICAL_SHARE {
        Some(format!(
            "{:.1}% of customers are at high churn risk.",
            share * 100.0
        ))
    } else {
        None
    }
}

fn widespread_zero_balance(inputs: &RuleInputs) -> Option<String> {
    let total = inputs.overview.total_customers;
    if total == 0 {
        return None;
    }
    let share = inputs.balance.customers_with_zero_balance as f64 / total as f64;
    if share > ZERO_BALANCE_SHARE {
        Some(format!(
            "{:.1}% of customers have a zero main-account balance.",
            share * 100.0
        ))
    } else {
        None
    }
}

fn unassigned_customers(inputs: &RuleInputs) -> Option<String> {
    let count = inputs.staff.unassigned_customers;
    if count > 0 {
        Some(format!(
            "{} customers are not assigned to any staff member.",
            count
        ))
    } else {
        None
    }
}

pub(crate) fn generate_insights(inputs: &RuleInputs) -> Vec<Insight> {
    info!("Generating business insights...");

    let mut insights = Vec::new();
    for rule in &RULES {
        if let Some(message) = (rule.trigger)(inputs) {
            insights.push(Insight {
                category: rule.category.to_string(),
                severity: rule.severity,
                message,
                recommendation: rule.recommendation.to_string(),
            });
        }
    }

    info!("{} business insights generated", insights.len());
    insights
}
