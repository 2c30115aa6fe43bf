use crate::error::Result;
use crate::gate::QualityGateComputer;
use crate::live::{IssueCounter, MatrixLoader, MeasureMatrix};
use crate::store::DataStore;
use crate::types::*;

/// Recomputes the issue-derived measures of a component's ancestor chain
/// and the project's quality gate status, without re-running an analysis.
///
/// One `refresh` is one store transaction: either every touched measure,
/// `alert_status` and `quality_gate_details` become visible together, or
/// none does.
pub struct LiveMeasureComputer<'a> {
    store: &'a dyn DataStore,
}

impl<'a> LiveMeasureComputer<'a> {
    pub fn new(store: &'a dyn DataStore) -> LiveMeasureComputer<'a> {
        LiveMeasureComputer { store }
    }

    pub fn refresh(&self, component: &Component) -> Result<()> {
        let Some(last_analysis) = self.store.select_last_analysis(&component.project_uuid)? else {
            // project deleted concurrently
            tracing::debug!(
                "No analysis for project {}, skipping refresh of {}",
                component.project_uuid,
                component.uuid
            );
            return Ok(());
        };
        let leak_start = last_analysis.period_date;

        self.store.begin()?;
        match self.refresh_in_transaction(component, leak_start) {
            Ok(touched) => {
                self.store.commit()?;
                tracing::debug!(
                    "Refreshed {} live measures for {}",
                    touched,
                    component.uuid
                );
                Ok(())
            }
            Err(e) => {
                let _ = self.store.rollback();
                Err(e)
            }
        }
    }

    fn refresh_in_transaction(
        &self,
        component: &Component,
        leak_start: Option<i64>,
    ) -> Result<usize> {
        let mut matrix = MatrixLoader::new(self.store).load(component, &[])?;

        let chain = matrix.bottom_up_components().to_vec();
        for c in &chain {
            let groups = self.store.select_issue_groups(c, leak_start)?;
            let counter = IssueCounter::new(&groups);
            self.write_measures(&mut matrix, c, &counter)?;
            if leak_start.is_some() {
                self.write_leak_measures(&mut matrix, c, &counter)?;
            }
        }

        let touched: Vec<LiveMeasure> = matrix.touched().cloned().collect();
        for measure in &touched {
            self.store.insert_or_update_live_measure(measure)?;
        }

        let project = matrix.project();
        let project_measures: Vec<LiveMeasure> = touched
            .iter()
            .filter(|m| m.component_uuid == project.uuid)
            .cloned()
            .collect();
        QualityGateComputer::new(self.store).recalculate(project, &project_measures)?;

        Ok(touched.len())
    }

    /// Current-code measures, derived from the full issue population.
    fn write_measures(
        &self,
        matrix: &mut MeasureMatrix,
        c: &Component,
        counter: &IssueCounter<'_>,
    ) -> Result<()> {
        use crate::metrics::*;

        matrix.set_value(c, VIOLATIONS, counter.count_unresolved(false) as f64)?;
        matrix.set_value(
            c,
            BUGS,
            counter.count_unresolved_by_type(RuleType::Bug, false) as f64,
        )?;
        matrix.set_value(
            c,
            CODE_SMELLS,
            counter.count_unresolved_by_type(RuleType::CodeSmell, false) as f64,
        )?;
        matrix.set_value(
            c,
            VULNERABILITIES,
            counter.count_unresolved_by_type(RuleType::Vulnerability, false) as f64,
        )?;

        matrix.set_value(
            c,
            BLOCKER_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Blocker, false) as f64,
        )?;
        matrix.set_value(
            c,
            CRITICAL_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Critical, false) as f64,
        )?;
        matrix.set_value(
            c,
            MAJOR_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Major, false) as f64,
        )?;
        matrix.set_value(
            c,
            MINOR_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Minor, false) as f64,
        )?;
        matrix.set_value(
            c,
            INFO_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Info, false) as f64,
        )?;

        matrix.set_value(
            c,
            FALSE_POSITIVE_ISSUES,
            counter.count_by_resolution(Some(resolutions::FALSE_POSITIVE), false) as f64,
        )?;
        matrix.set_value(
            c,
            WONT_FIX_ISSUES,
            counter.count_by_resolution(Some(resolutions::WONT_FIX), false) as f64,
        )?;

        matrix.set_value(
            c,
            OPEN_ISSUES,
            counter.count_by_status(statuses::OPEN, false) as f64,
        )?;
        matrix.set_value(
            c,
            REOPENED_ISSUES,
            counter.count_by_status(statuses::REOPENED, false) as f64,
        )?;
        matrix.set_value(
            c,
            CONFIRMED_ISSUES,
            counter.count_by_status(statuses::CONFIRMED, false) as f64,
        )?;

        matrix.set_value(
            c,
            TECHNICAL_DEBT,
            counter.effort_of_unresolved(RuleType::CodeSmell, false),
        )?;
        matrix.set_value(
            c,
            RELIABILITY_REMEDIATION_EFFORT,
            counter.effort_of_unresolved(RuleType::Bug, false),
        )?;
        matrix.set_value(
            c,
            SECURITY_REMEDIATION_EFFORT,
            counter.effort_of_unresolved(RuleType::Vulnerability, false),
        )?;

        matrix.set_rating_value(
            c,
            RELIABILITY_RATING,
            rating_by_severity(
                counter
                    .max_severity_of_unresolved(RuleType::Bug, false)
                    .unwrap_or(Severity::Info),
            ),
        )?;
        matrix.set_rating_value(
            c,
            SECURITY_RATING,
            rating_by_severity(
                counter
                    .max_severity_of_unresolved(RuleType::Vulnerability, false)
                    .unwrap_or(Severity::Info),
            ),
        )?;

        Ok(())
    }

    /// New-code counterparts, written as variations on the `new_` metrics.
    /// Only called when the project has a leak period.
    fn write_leak_measures(
        &self,
        matrix: &mut MeasureMatrix,
        c: &Component,
        counter: &IssueCounter<'_>,
    ) -> Result<()> {
        use crate::metrics::*;

        matrix.set_variation(c, NEW_VIOLATIONS, counter.count_unresolved(true) as f64)?;
        matrix.set_variation(
            c,
            NEW_BUGS,
            counter.count_unresolved_by_type(RuleType::Bug, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_CODE_SMELLS,
            counter.count_unresolved_by_type(RuleType::CodeSmell, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_VULNERABILITIES,
            counter.count_unresolved_by_type(RuleType::Vulnerability, true) as f64,
        )?;

        matrix.set_variation(
            c,
            NEW_BLOCKER_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Blocker, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_CRITICAL_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Critical, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_MAJOR_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Major, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_MINOR_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Minor, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_INFO_VIOLATIONS,
            counter.count_unresolved_by_severity(Severity::Info, true) as f64,
        )?;

        matrix.set_variation(
            c,
            NEW_FALSE_POSITIVE_ISSUES,
            counter.count_by_resolution(Some(resolutions::FALSE_POSITIVE), true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_WONT_FIX_ISSUES,
            counter.count_by_resolution(Some(resolutions::WONT_FIX), true) as f64,
        )?;

        matrix.set_variation(
            c,
            NEW_OPEN_ISSUES,
            counter.count_by_status(statuses::OPEN, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_REOPENED_ISSUES,
            counter.count_by_status(statuses::REOPENED, true) as f64,
        )?;
        matrix.set_variation(
            c,
            NEW_CONFIRMED_ISSUES,
            counter.count_by_status(statuses::CONFIRMED, true) as f64,
        )?;

        matrix.set_variation(
            c,
            NEW_TECHNICAL_DEBT,
            counter.effort_of_unresolved(RuleType::CodeSmell, true),
        )?;
        matrix.set_variation(
            c,
            NEW_RELIABILITY_REMEDIATION_EFFORT,
            counter.effort_of_unresolved(RuleType::Bug, true),
        )?;
        matrix.set_variation(
            c,
            NEW_SECURITY_REMEDIATION_EFFORT,
            counter.effort_of_unresolved(RuleType::Vulnerability, true),
        )?;

        matrix.set_rating_variation(
            c,
            NEW_RELIABILITY_RATING,
            rating_by_severity(
                counter
                    .max_severity_of_unresolved(RuleType::Bug, true)
                    .unwrap_or(Severity::Info),
            ),
        )?;
        matrix.set_rating_variation(
            c,
            NEW_SECURITY_RATING,
            rating_by_severity(
                counter
                    .max_severity_of_unresolved(RuleType::Vulnerability, true)
                    .unwrap_or(Severity::Info),
            ),
        )?;

        Ok(())
    }
}
