//! Core metric catalogue.
//!
//! Every metric the engine derives from issue aggregates, in both its
//! current-code and new-code (`new_` prefixed) form, plus the two project
//! level quality gate metrics. The catalogue is registered in the store at
//! initialization; the matrix loader restricts its metric query to these
//! keys.

use crate::types::{Rating, Severity, ValueType};

pub const VIOLATIONS: &str = "violations";
pub const BLOCKER_VIOLATIONS: &str = "blocker_violations";
pub const CRITICAL_VIOLATIONS: &str = "critical_violations";
pub const MAJOR_VIOLATIONS: &str = "major_violations";
pub const MINOR_VIOLATIONS: &str = "minor_violations";
pub const INFO_VIOLATIONS: &str = "info_violations";
pub const BUGS: &str = "bugs";
pub const CODE_SMELLS: &str = "code_smells";
pub const VULNERABILITIES: &str = "vulnerabilities";
pub const FALSE_POSITIVE_ISSUES: &str = "false_positive_issues";
pub const WONT_FIX_ISSUES: &str = "wont_fix_issues";
pub const OPEN_ISSUES: &str = "open_issues";
pub const REOPENED_ISSUES: &str = "reopened_issues";
pub const CONFIRMED_ISSUES: &str = "confirmed_issues";
pub const TECHNICAL_DEBT: &str = "technical_debt";
pub const RELIABILITY_REMEDIATION_EFFORT: &str = "reliability_remediation_effort";
pub const SECURITY_REMEDIATION_EFFORT: &str = "security_remediation_effort";
pub const RELIABILITY_RATING: &str = "reliability_rating";
pub const SECURITY_RATING: &str = "security_rating";

pub const NEW_VIOLATIONS: &str = "new_violations";
pub const NEW_BLOCKER_VIOLATIONS: &str = "new_blocker_violations";
pub const NEW_CRITICAL_VIOLATIONS: &str = "new_critical_violations";
pub const NEW_MAJOR_VIOLATIONS: &str = "new_major_violations";
pub const NEW_MINOR_VIOLATIONS: &str = "new_minor_violations";
pub const NEW_INFO_VIOLATIONS: &str = "new_info_violations";
pub const NEW_BUGS: &str = "new_bugs";
pub const NEW_CODE_SMELLS: &str = "new_code_smells";
pub const NEW_VULNERABILITIES: &str = "new_vulnerabilities";
pub const NEW_FALSE_POSITIVE_ISSUES: &str = "new_false_positive_issues";
pub const NEW_WONT_FIX_ISSUES: &str = "new_wont_fix_issues";
pub const NEW_OPEN_ISSUES: &str = "new_open_issues";
pub const NEW_REOPENED_ISSUES: &str = "new_reopened_issues";
pub const NEW_CONFIRMED_ISSUES: &str = "new_confirmed_issues";
pub const NEW_TECHNICAL_DEBT: &str = "new_technical_debt";
pub const NEW_RELIABILITY_REMEDIATION_EFFORT: &str = "new_reliability_remediation_effort";
pub const NEW_SECURITY_REMEDIATION_EFFORT: &str = "new_security_remediation_effort";
pub const NEW_RELIABILITY_RATING: &str = "new_reliability_rating";
pub const NEW_SECURITY_RATING: &str = "new_security_rating";

pub const ALERT_STATUS: &str = "alert_status";
pub const QUALITY_GATE_DETAILS: &str = "quality_gate_details";

/// Definition of a built-in metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub key: &'static str,
    pub value_type: ValueType,
}

/// The complete built-in catalogue. Counts are INT, efforts are work
/// minutes kept as LONG, ratings carry their A..E index as INT.
pub const CORE_METRICS: &[MetricDef] = &[
    MetricDef { key: VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: BLOCKER_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: CRITICAL_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: MAJOR_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: MINOR_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: INFO_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: BUGS, value_type: ValueType::Int },
    MetricDef { key: CODE_SMELLS, value_type: ValueType::Int },
    MetricDef { key: VULNERABILITIES, value_type: ValueType::Int },
    MetricDef { key: FALSE_POSITIVE_ISSUES, value_type: ValueType::Int },
    MetricDef { key: WONT_FIX_ISSUES, value_type: ValueType::Int },
    MetricDef { key: OPEN_ISSUES, value_type: ValueType::Int },
    MetricDef { key: REOPENED_ISSUES, value_type: ValueType::Int },
    MetricDef { key: CONFIRMED_ISSUES, value_type: ValueType::Int },
    MetricDef { key: TECHNICAL_DEBT, value_type: ValueType::Long },
    MetricDef { key: RELIABILITY_REMEDIATION_EFFORT, value_type: ValueType::Long },
    MetricDef { key: SECURITY_REMEDIATION_EFFORT, value_type: ValueType::Long },
    MetricDef { key: RELIABILITY_RATING, value_type: ValueType::Int },
    MetricDef { key: SECURITY_RATING, value_type: ValueType::Int },
    MetricDef { key: NEW_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: NEW_BLOCKER_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: NEW_CRITICAL_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: NEW_MAJOR_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: NEW_MINOR_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: NEW_INFO_VIOLATIONS, value_type: ValueType::Int },
    MetricDef { key: NEW_BUGS, value_type: ValueType::Int },
    MetricDef { key: NEW_CODE_SMELLS, value_type: ValueType::Int },
    MetricDef { key: NEW_VULNERABILITIES, value_type: ValueType::Int },
    MetricDef { key: NEW_FALSE_POSITIVE_ISSUES, value_type: ValueType::Int },
    MetricDef { key: NEW_WONT_FIX_ISSUES, value_type: ValueType::Int },
    MetricDef { key: NEW_OPEN_ISSUES, value_type: ValueType::Int },
    MetricDef { key: NEW_REOPENED_ISSUES, value_type: ValueType::Int },
    MetricDef { key: NEW_CONFIRMED_ISSUES, value_type: ValueType::Int },
    MetricDef { key: NEW_TECHNICAL_DEBT, value_type: ValueType::Long },
    MetricDef { key: NEW_RELIABILITY_REMEDIATION_EFFORT, value_type: ValueType::Long },
    MetricDef { key: NEW_SECURITY_REMEDIATION_EFFORT, value_type: ValueType::Long },
    MetricDef { key: NEW_RELIABILITY_RATING, value_type: ValueType::Int },
    MetricDef { key: NEW_SECURITY_RATING, value_type: ValueType::Int },
    MetricDef { key: ALERT_STATUS, value_type: ValueType::Level },
    MetricDef { key: QUALITY_GATE_DETAILS, value_type: ValueType::Data },
];

/// Keys of every built-in metric, in catalogue order.
pub fn core_metric_keys() -> Vec<&'static str> {
    CORE_METRICS.iter().map(|m| m.key).collect()
}

/// Rating derived from the worst unresolved severity.
pub fn rating_by_severity(severity: Severity) -> Rating {
    match severity {
        Severity::Blocker => Rating::E,
        Severity::Critical => Rating::D,
        Severity::Major => Rating::C,
        Severity::Minor => Rating::B,
        Severity::Info => Rating::A,
    }
}
