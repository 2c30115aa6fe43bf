use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::gate::ConditionEvaluator;
use crate::metrics::{ALERT_STATUS, QUALITY_GATE_DETAILS};
use crate::store::DataStore;
use crate::types::{Component, Level, LiveMeasure, Metric, QualityGateCondition};

/// Recomputes a project's quality gate after a refresh touched some of its
/// measures.
///
/// Conditions on touched metrics are re-evaluated and their level stored
/// on the measure; conditions on untouched metrics reuse the previously
/// stored level. A measure with no stored level counts as OK — a project
/// that was never gated before starts clean rather than failing.
pub struct QualityGateComputer<'a> {
    store: &'a dyn DataStore,
}

/// Payload of the `quality_gate_details` measure.
#[derive(Debug, Serialize)]
struct GateDetails {
    level: String,
    conditions: Vec<ConditionDetail>,
    #[serde(rename = "ignoredConditions")]
    ignored_conditions: bool,
}

#[derive(Debug, Serialize)]
struct ConditionDetail {
    metric: String,
    op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<String>,
    level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<i32>,
}

impl<'a> QualityGateComputer<'a> {
    pub fn new(store: &'a dyn DataStore) -> QualityGateComputer<'a> {
        QualityGateComputer { store }
    }

    pub fn recalculate(&self, project: &Component, modified: &[LiveMeasure]) -> Result<()> {
        let Some(gate) = self.store.select_quality_gate_for_project(&project.uuid)? else {
            return Ok(());
        };
        let conditions = self.store.select_conditions_for_gate(gate.id)?;

        let alert_metric = self.metric_by_key(ALERT_STATUS)?;
        let details_metric = self.metric_by_key(QUALITY_GATE_DETAILS)?;

        let modified_by_metric: HashMap<i64, &LiveMeasure> =
            modified.iter().map(|m| (m.metric_id, m)).collect();

        let mut preload_ids: Vec<i64> = conditions
            .iter()
            .map(|c| c.metric_id)
            .filter(|id| !modified_by_metric.contains_key(id))
            .collect();
        preload_ids.push(alert_metric.id);
        preload_ids.push(details_metric.id);
        preload_ids.sort_unstable();
        preload_ids.dedup();
        let untouched_by_metric: HashMap<i64, LiveMeasure> = self
            .store
            .select_live_measures(std::slice::from_ref(&project.uuid), &preload_ids)?
            .into_iter()
            .map(|m| (m.metric_id, m))
            .collect();

        let condition_metric_ids: Vec<i64> = conditions.iter().map(|c| c.metric_id).collect();
        let metrics_by_id: HashMap<i64, Metric> = self
            .store
            .select_metrics_by_ids(&condition_metric_ids)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut global = Level::Ok;
        let mut ignored_conditions = false;
        let mut details = Vec::with_capacity(conditions.len());
        for condition in &conditions {
            let metric = metrics_by_id
                .get(&condition.metric_id)
                .ok_or_else(|| Error::MetricNotFound(condition.metric_id.to_string()))?;

            let (level, actual) = match modified_by_metric.get(&condition.metric_id) {
                Some(measure) => self.evaluate_touched(metric, condition, measure)?,
                None => {
                    ignored_conditions = true;
                    stored_level(condition, untouched_by_metric.get(&condition.metric_id))
                }
            };
            global = global.max(level);
            details.push(ConditionDetail {
                metric: metric.key.clone(),
                op: condition.operator.clone(),
                warning: condition.warning_threshold.clone(),
                error: condition.error_threshold.clone(),
                actual,
                level: level.as_str().to_string(),
                period: condition.period,
            });
        }

        tracing::debug!(
            "Quality gate '{}' recomputed for {}: {}",
            gate.name,
            project.uuid,
            global.as_str()
        );

        let mut alert = untouched_by_metric
            .get(&alert_metric.id)
            .cloned()
            .unwrap_or_else(|| LiveMeasure::new(&project.uuid, &project.uuid, alert_metric.id));
        alert.data = Some(global.as_str().to_string());
        self.store.insert_or_update_live_measure(&alert)?;

        let payload = GateDetails {
            level: global.as_str().to_string(),
            conditions: details,
            ignored_conditions,
        };
        let mut details_measure = untouched_by_metric
            .get(&details_metric.id)
            .cloned()
            .unwrap_or_else(|| LiveMeasure::new(&project.uuid, &project.uuid, details_metric.id));
        details_measure.data = Some(serde_json::to_string(&payload)?);
        self.store.insert_or_update_live_measure(&details_measure)?;

        Ok(())
    }

    /// Re-evaluates a condition on a measure modified by this refresh and
    /// persists the reached level on the measure itself.
    fn evaluate_touched(
        &self,
        metric: &Metric,
        condition: &QualityGateCondition,
        measure: &LiveMeasure,
    ) -> Result<(Level, Option<String>)> {
        let evaluation = ConditionEvaluator::evaluate(metric, condition, measure)?;
        let actual = evaluation.value.as_ref().map(ToString::to_string);

        let mut updated = measure.clone();
        updated.gate_status = Some(evaluation.level.as_str().to_string());
        updated.gate_text = actual.clone();
        self.store.update_live_measure(&updated)?;

        Ok((evaluation.level, actual))
    }

    fn metric_by_key(&self, key: &str) -> Result<Metric> {
        self.store
            .select_metric_by_key(key)?
            .ok_or_else(|| Error::MetricNotFound(key.to_string()))
    }
}

/// Level previously stored for a condition whose metric was not touched by
/// this refresh. A missing measure or a missing stored level reads as OK.
fn stored_level(
    condition: &QualityGateCondition,
    measure: Option<&LiveMeasure>,
) -> (Level, Option<String>) {
    let level = measure
        .and_then(|m| m.gate_status.as_deref())
        .and_then(Level::parse)
        .unwrap_or(Level::Ok);
    let actual = measure
        .and_then(|m| {
            if condition.period.is_some() {
                m.variation
            } else {
                m.value
            }
        })
        .map(format_number);
    (level, actual)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::store::SqliteStore;
    use crate::types::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn project() -> Component {
        Component {
            uuid: "P1".to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: ".".to_string(),
            name: "project".to_string(),
            qualifier: ComponentType::Project,
        }
    }

    fn setup() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store.create_component(&project()).unwrap();
        (temp, store)
    }

    fn bugs_gt_condition(store: &SqliteStore, warning: &str, error: &str) -> i64 {
        let bugs = store.select_metric_by_key(metrics::BUGS).unwrap().unwrap();
        let gate = store.create_quality_gate("Default").unwrap();
        store
            .create_gate_condition(&QualityGateCondition {
                id: 0,
                gate_id: gate.id,
                metric_id: bugs.id,
                operator: "GT".to_string(),
                warning_threshold: Some(warning.to_string()),
                error_threshold: Some(error.to_string()),
                period: None,
            })
            .unwrap();
        store.set_project_gate("P1", gate.id).unwrap();
        bugs.id
    }

    fn touched_bugs_measure(store: &SqliteStore, metric_id: i64, value: f64) -> LiveMeasure {
        let mut measure = LiveMeasure::new("P1", "P1", metric_id);
        measure.value = Some(value);
        store.insert_or_update_live_measure(&measure).unwrap();
        measure
    }

    fn alert_status(store: &SqliteStore) -> Option<String> {
        store
            .select_measure("P1", metrics::ALERT_STATUS)
            .unwrap()
            .and_then(|m| m.data)
    }

    #[test]
    fn test_no_gate_writes_nothing() {
        let (_temp, store) = setup();
        QualityGateComputer::new(&store)
            .recalculate(&project(), &[])
            .unwrap();
        assert_eq!(alert_status(&store), None);
    }

    #[test]
    fn test_touched_condition_levels() {
        let (_temp, store) = setup();
        let bugs_id = bugs_gt_condition(&store, "1", "2");

        for (value, expected) in [(0.0, "OK"), (2.0, "WARN"), (3.0, "ERROR")] {
            let measure = touched_bugs_measure(&store, bugs_id, value);
            QualityGateComputer::new(&store)
                .recalculate(&project(), &[measure])
                .unwrap();
            assert_eq!(alert_status(&store).as_deref(), Some(expected), "bugs={value}");
        }
    }

    #[test]
    fn test_touched_condition_persists_gate_status_on_measure() {
        let (_temp, store) = setup();
        let bugs_id = bugs_gt_condition(&store, "1", "2");
        let measure = touched_bugs_measure(&store, bugs_id, 3.0);

        QualityGateComputer::new(&store)
            .recalculate(&project(), &[measure])
            .unwrap();

        let stored = store.select_measure("P1", metrics::BUGS).unwrap().unwrap();
        assert_eq!(stored.gate_status.as_deref(), Some("ERROR"));
        assert_eq!(stored.gate_text.as_deref(), Some("3"));
    }

    #[test]
    fn test_untouched_condition_reads_stored_level_or_ok() {
        let (_temp, store) = setup();
        let bugs_id = bugs_gt_condition(&store, "1", "2");

        // Nothing touched, no stored measure: the condition reads as OK
        // and the payload flags the shortcut.
        QualityGateComputer::new(&store)
            .recalculate(&project(), &[])
            .unwrap();
        assert_eq!(alert_status(&store).as_deref(), Some("OK"));
        let details = store
            .select_measure("P1", metrics::QUALITY_GATE_DETAILS)
            .unwrap()
            .unwrap();
        let json: Value = serde_json::from_str(details.data.as_deref().unwrap()).unwrap();
        assert_eq!(json["ignoredConditions"], Value::Bool(true));

        // A stored WARN survives a refresh that does not touch bugs.
        let mut measure = LiveMeasure::new("P1", "P1", bugs_id);
        measure.value = Some(2.0);
        measure.gate_status = Some("WARN".to_string());
        store.insert_or_update_live_measure(&measure).unwrap();
        QualityGateComputer::new(&store)
            .recalculate(&project(), &[])
            .unwrap();
        assert_eq!(alert_status(&store).as_deref(), Some("WARN"));
    }

    #[test]
    fn test_details_payload_shape() {
        let (_temp, store) = setup();
        let bugs_id = bugs_gt_condition(&store, "1", "2");
        let measure = touched_bugs_measure(&store, bugs_id, 3.0);

        QualityGateComputer::new(&store)
            .recalculate(&project(), &[measure])
            .unwrap();

        let details = store
            .select_measure("P1", metrics::QUALITY_GATE_DETAILS)
            .unwrap()
            .unwrap();
        let json: Value = serde_json::from_str(details.data.as_deref().unwrap()).unwrap();
        assert_eq!(json["level"], "ERROR");
        assert_eq!(json["ignoredConditions"], Value::Bool(false));
        let condition = &json["conditions"][0];
        assert_eq!(condition["metric"], "bugs");
        assert_eq!(condition["op"], "GT");
        assert_eq!(condition["warning"], "1");
        assert_eq!(condition["error"], "2");
        assert_eq!(condition["actual"], "3");
        assert_eq!(condition["level"], "ERROR");
        assert!(condition.get("period").is_none());
    }

    #[test]
    fn test_duplicate_condition_metrics_share_one_preloaded_measure() {
        let (_temp, store) = setup();
        let bugs = store.select_metric_by_key(metrics::BUGS).unwrap().unwrap();
        let gate = store.create_quality_gate("Paranoid").unwrap();
        for (operator, error) in [("GT", "5"), ("EQ", "3")] {
            store
                .create_gate_condition(&QualityGateCondition {
                    id: 0,
                    gate_id: gate.id,
                    metric_id: bugs.id,
                    operator: operator.to_string(),
                    warning_threshold: None,
                    error_threshold: Some(error.to_string()),
                    period: None,
                })
                .unwrap();
        }
        store.set_project_gate("P1", gate.id).unwrap();

        let mut measure = LiveMeasure::new("P1", "P1", bugs.id);
        measure.value = Some(3.0);
        measure.gate_status = Some("ERROR".to_string());
        store.insert_or_update_live_measure(&measure).unwrap();

        // Both untouched conditions read the same stored measure.
        QualityGateComputer::new(&store)
            .recalculate(&project(), &[])
            .unwrap();
        assert_eq!(alert_status(&store).as_deref(), Some("ERROR"));
        let details = store
            .select_measure("P1", metrics::QUALITY_GATE_DETAILS)
            .unwrap()
            .unwrap();
        let json: Value = serde_json::from_str(details.data.as_deref().unwrap()).unwrap();
        assert_eq!(json["conditions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_global_level_is_max_over_conditions() {
        let (_temp, store) = setup();
        let bugs = store.select_metric_by_key(metrics::BUGS).unwrap().unwrap();
        let smells = store
            .select_metric_by_key(metrics::CODE_SMELLS)
            .unwrap()
            .unwrap();
        let gate = store.create_quality_gate("Strict").unwrap();
        for metric_id in [bugs.id, smells.id] {
            store
                .create_gate_condition(&QualityGateCondition {
                    id: 0,
                    gate_id: gate.id,
                    metric_id,
                    operator: "GT".to_string(),
                    warning_threshold: Some("1".to_string()),
                    error_threshold: Some("5".to_string()),
                    period: None,
                })
                .unwrap();
        }
        store.set_project_gate("P1", gate.id).unwrap();

        // bugs at WARN, code_smells at ERROR: global is ERROR.
        let bugs_measure = touched_bugs_measure(&store, bugs.id, 2.0);
        let smells_measure = touched_bugs_measure(&store, smells.id, 9.0);
        QualityGateComputer::new(&store)
            .recalculate(&project(), &[bugs_measure, smells_measure])
            .unwrap();
        assert_eq!(alert_status(&store).as_deref(), Some("ERROR"));
    }
}
