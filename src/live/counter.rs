use crate::types::{IssueGroup, RuleType, Severity};

/// A pure fold over the issue groups of one component subtree.
///
/// Every operation takes `only_in_leak`: when true only groups of issues
/// created inside the leak period are counted. Where "unresolved" is
/// specified, groups with a resolution are skipped.
pub struct IssueCounter<'a> {
    groups: &'a [IssueGroup],
}

impl<'a> IssueCounter<'a> {
    pub fn new(groups: &'a [IssueGroup]) -> IssueCounter<'a> {
        IssueCounter { groups }
    }

    fn scoped(&self, only_in_leak: bool) -> impl Iterator<Item = &IssueGroup> {
        self.groups
            .iter()
            .filter(move |g| !only_in_leak || g.in_leak)
    }

    pub fn count_unresolved(&self, only_in_leak: bool) -> i64 {
        self.scoped(only_in_leak)
            .filter(|g| g.resolution.is_none())
            .map(|g| g.count)
            .sum()
    }

    pub fn count_unresolved_by_type(&self, rule_type: RuleType, only_in_leak: bool) -> i64 {
        self.scoped(only_in_leak)
            .filter(|g| g.resolution.is_none())
            .filter(|g| g.rule_type == rule_type)
            .map(|g| g.count)
            .sum()
    }

    pub fn count_unresolved_by_severity(&self, severity: Severity, only_in_leak: bool) -> i64 {
        self.scoped(only_in_leak)
            .filter(|g| g.resolution.is_none())
            .filter(|g| g.severity == severity)
            .map(|g| g.count)
            .sum()
    }

    pub fn count_by_resolution(&self, resolution: Option<&str>, only_in_leak: bool) -> i64 {
        self.scoped(only_in_leak)
            .filter(|g| g.resolution.as_deref() == resolution)
            .map(|g| g.count)
            .sum()
    }

    pub fn count_by_status(&self, status: &str, only_in_leak: bool) -> i64 {
        self.scoped(only_in_leak)
            .filter(|g| g.status == status)
            .map(|g| g.count)
            .sum()
    }

    pub fn effort_of_unresolved(&self, rule_type: RuleType, only_in_leak: bool) -> f64 {
        // Folded from +0.0 so an empty sum is positive zero; Sum's -0.0
        // identity would not compare equal under total_cmp to the +0.0
        // the store reads back.
        self.scoped(only_in_leak)
            .filter(|g| g.resolution.is_none())
            .filter(|g| g.rule_type == rule_type)
            .fold(0.0, |acc, g| acc + g.effort)
    }

    /// Highest severity among unresolved groups of the given type, or
    /// `None` when no such group exists.
    pub fn max_severity_of_unresolved(
        &self,
        rule_type: RuleType,
        only_in_leak: bool,
    ) -> Option<Severity> {
        self.scoped(only_in_leak)
            .filter(|g| g.resolution.is_none())
            .filter(|g| g.rule_type == rule_type)
            .map(|g| g.severity)
            .max()
    }
}
