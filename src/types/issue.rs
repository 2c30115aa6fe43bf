use serde::{Deserialize, Serialize};

/// Rule type of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleType {
    CodeSmell,
    Bug,
    Vulnerability,
}

impl RuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::CodeSmell => "CODE_SMELL",
            RuleType::Bug => "BUG",
            RuleType::Vulnerability => "VULNERABILITY",
        }
    }

    pub fn parse(s: &str) -> Option<RuleType> {
        match s {
            "CODE_SMELL" => Some(RuleType::CodeSmell),
            "BUG" => Some(RuleType::Bug),
            "VULNERABILITY" => Some(RuleType::Vulnerability),
            _ => None,
        }
    }
}

/// Issue severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
            Severity::Blocker => "BLOCKER",
        }
    }

    pub fn parse(s: &str) -> Option<Severity> {
        match s {
            "INFO" => Some(Severity::Info),
            "MINOR" => Some(Severity::Minor),
            "MAJOR" => Some(Severity::Major),
            "CRITICAL" => Some(Severity::Critical),
            "BLOCKER" => Some(Severity::Blocker),
            _ => None,
        }
    }
}

/// Issue resolution constants. An issue with no resolution is unresolved.
pub mod resolutions {
    pub const FIXED: &str = "FIXED";
    pub const FALSE_POSITIVE: &str = "FALSE-POSITIVE";
    pub const WONT_FIX: &str = "WONT-FIX";
    pub const REMOVED: &str = "REMOVED";
}

/// Issue workflow status constants.
pub mod statuses {
    pub const OPEN: &str = "OPEN";
    pub const CONFIRMED: &str = "CONFIRMED";
    pub const REOPENED: &str = "REOPENED";
    pub const RESOLVED: &str = "RESOLVED";
    pub const CLOSED: &str = "CLOSED";
}

/// A detected rule violation on a component. The aggregation query groups
/// these into [`IssueGroup`]s; the engine itself never reads single rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kee: String,
    pub component_uuid: String,
    pub project_uuid: String,
    pub rule_type: RuleType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    pub status: String,
    /// Remediation effort in minutes.
    pub effort: f64,
    /// Creation date, epoch milliseconds.
    pub created_at: i64,
}

/// Issues of a component subtree collapsed by (rule type, severity,
/// resolution, status, in-leak), with their count and summed effort.
/// Produced by the store's aggregation query, never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueGroup {
    pub rule_type: RuleType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    pub status: String,
    pub in_leak: bool,
    pub count: i64,
    pub effort: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Minor);
        assert!(Severity::Minor < Severity::Major);
        assert!(Severity::Major < Severity::Critical);
        assert!(Severity::Critical < Severity::Blocker);
    }

    #[test]
    fn test_rule_type_parse() {
        assert_eq!(RuleType::parse("BUG"), Some(RuleType::Bug));
        assert_eq!(RuleType::parse("bug"), None);
    }
}
