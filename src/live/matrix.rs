use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Component, LiveMeasure, Metric, Rating};

/// Sparse (component uuid × metric key) grid of draft measures for one
/// refresh, with per-cell dirty tracking.
///
/// Writes that do not change the stored value leave the cell untouched,
/// so `touched()` yields exactly the rows the refresh has to persist.
/// The matrix owns its draft measures until they are flushed.
pub struct MeasureMatrix {
    // direction is from file to project
    bottom_up: Vec<Component>,
    metrics_by_key: HashMap<String, Metric>,
    cells: HashMap<(String, String), MeasureCell>,
}

struct MeasureCell {
    measure: LiveMeasure,
    touched: bool,
}

impl MeasureMatrix {
    pub fn new(bottom_up: Vec<Component>, metrics: Vec<Metric>) -> MeasureMatrix {
        let metrics_by_key = metrics.into_iter().map(|m| (m.key.clone(), m)).collect();
        MeasureMatrix {
            bottom_up,
            metrics_by_key,
            cells: HashMap::new(),
        }
    }

    /// Places each preloaded measure as an untouched cell.
    pub fn init(&mut self, db_measures: Vec<LiveMeasure>) {
        let key_by_id: HashMap<i64, String> = self
            .metrics_by_key
            .values()
            .map(|m| (m.id, m.key.clone()))
            .collect();
        for measure in db_measures {
            let Some(metric_key) = key_by_id.get(&measure.metric_id) else {
                tracing::error!(
                    "Stored measure references metric id {} which is not in the matrix",
                    measure.metric_id
                );
                continue;
            };
            self.cells.insert(
                (measure.component_uuid.clone(), metric_key.clone()),
                MeasureCell {
                    measure,
                    touched: false,
                },
            );
        }
    }

    /// The component chain, leaf first.
    pub fn bottom_up_components(&self) -> &[Component] {
        &self.bottom_up
    }

    /// The root-most component of the chain.
    pub fn project(&self) -> &Component {
        self.bottom_up.last().expect("matrix chain is never empty")
    }

    pub fn set_value(&mut self, component: &Component, metric_key: &str, value: f64) -> Result<()> {
        self.change_cell(component, metric_key, |m| {
            if let Some(old) = m.value {
                if old.total_cmp(&value) == Ordering::Equal {
                    return false;
                }
                // Keep the leak boundary (value - variation) stable when
                // the current value moves.
                if let Some(old_variation) = m.variation {
                    m.variation = Some(value - (old - old_variation));
                }
            }
            m.value = Some(value);
            true
        })
    }

    pub fn set_text_value(
        &mut self,
        component: &Component,
        metric_key: &str,
        value: &str,
    ) -> Result<()> {
        self.change_cell(component, metric_key, |m| {
            if m.data.as_deref() == Some(value) {
                return false;
            }
            m.data = Some(value.to_string());
            true
        })
    }

    pub fn set_rating_value(
        &mut self,
        component: &Component,
        metric_key: &str,
        rating: Rating,
    ) -> Result<()> {
        self.change_cell(component, metric_key, |m| {
            if m.data.as_deref() == Some(rating.as_str()) && m.value == Some(rating.index()) {
                return false;
            }
            m.data = Some(rating.as_str().to_string());
            m.value = Some(rating.index());
            true
        })
    }

    pub fn set_variation(
        &mut self,
        component: &Component,
        metric_key: &str,
        variation: f64,
    ) -> Result<()> {
        self.change_cell(component, metric_key, |m| {
            if let Some(old) = m.variation {
                if old.total_cmp(&variation) == Ordering::Equal {
                    return false;
                }
            }
            m.variation = Some(variation);
            true
        })
    }

    pub fn set_rating_variation(
        &mut self,
        component: &Component,
        metric_key: &str,
        rating: Rating,
    ) -> Result<()> {
        self.set_variation(component, metric_key, rating.index())
    }

    /// Cells modified during this refresh.
    pub fn touched(&self) -> impl Iterator<Item = &LiveMeasure> {
        self.cells
            .values()
            .filter(|c| c.touched)
            .map(|c| &c.measure)
    }

    fn change_cell<F>(&mut self, component: &Component, metric_key: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut LiveMeasure) -> bool,
    {
        let metric = self
            .metrics_by_key
            .get(metric_key)
            .ok_or_else(|| Error::UnregisteredMetric(metric_key.to_string()))?;

        let cell = self
            .cells
            .entry((component.uuid.clone(), metric_key.to_string()))
            .or_insert_with(|| MeasureCell {
                measure: LiveMeasure::new(&component.uuid, &component.project_uuid, metric.id),
                touched: false,
            });
        if change(&mut cell.measure) {
            cell.touched = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentType, ValueType};

    fn file() -> Component {
        Component {
            uuid: "F1".to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: ".P1.".to_string(),
            name: "file.rs".to_string(),
            qualifier: ComponentType::File,
        }
    }

    fn project() -> Component {
        Component {
            uuid: "P1".to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: ".".to_string(),
            name: "project".to_string(),
            qualifier: ComponentType::Project,
        }
    }

    fn metric(id: i64, key: &str) -> Metric {
        Metric {
            id,
            key: key.to_string(),
            value_type: ValueType::Int,
        }
    }

    fn matrix() -> MeasureMatrix {
        MeasureMatrix::new(
            vec![file(), project()],
            vec![metric(1, "bugs"), metric(2, "new_bugs"), metric(3, "reliability_rating")],
        )
    }

    fn touched_count(matrix: &MeasureMatrix) -> usize {
        matrix.touched().count()
    }

    #[test]
    fn test_first_write_materialises_touched_cell() {
        let mut matrix = matrix();
        matrix.set_value(&file(), "bugs", 2.0).unwrap();

        let touched: Vec<&LiveMeasure> = matrix.touched().collect();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].component_uuid, "F1");
        assert_eq!(touched[0].metric_id, 1);
        assert_eq!(touched[0].value, Some(2.0));
    }

    #[test]
    fn test_no_op_write_is_not_touched() {
        let mut matrix = matrix();
        let mut preloaded = LiveMeasure::new("F1", "P1", 1);
        preloaded.value = Some(2.0);
        matrix.init(vec![preloaded]);

        matrix.set_value(&file(), "bugs", 2.0).unwrap();
        assert_eq!(touched_count(&matrix), 0);

        matrix.set_value(&file(), "bugs", 3.0).unwrap();
        assert_eq!(touched_count(&matrix), 1);
    }

    #[test]
    fn test_writing_same_value_twice_touches_once() {
        let mut matrix = matrix();
        matrix.set_value(&file(), "bugs", 2.0).unwrap();
        matrix.set_value(&file(), "bugs", 2.0).unwrap();
        assert_eq!(touched_count(&matrix), 1);
    }

    #[test]
    fn test_set_value_preserves_leak_boundary() {
        let mut matrix = matrix();
        let mut preloaded = LiveMeasure::new("F1", "P1", 1);
        preloaded.value = Some(5.0);
        preloaded.variation = Some(2.0);
        matrix.init(vec![preloaded]);

        // Boundary value is 5 - 2 = 3; raising the value to 7 keeps it.
        matrix.set_value(&file(), "bugs", 7.0).unwrap();
        let touched: Vec<&LiveMeasure> = matrix.touched().collect();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].value, Some(7.0));
        assert_eq!(touched[0].variation, Some(4.0));
    }

    #[test]
    fn test_set_variation_no_op() {
        let mut matrix = matrix();
        let mut preloaded = LiveMeasure::new("F1", "P1", 2);
        preloaded.variation = Some(1.0);
        matrix.init(vec![preloaded]);

        matrix.set_variation(&file(), "new_bugs", 1.0).unwrap();
        assert_eq!(touched_count(&matrix), 0);

        matrix.set_variation(&file(), "new_bugs", 2.0).unwrap();
        assert_eq!(touched_count(&matrix), 1);
    }

    #[test]
    fn test_set_rating_value() {
        let mut matrix = matrix();
        matrix
            .set_rating_value(&file(), "reliability_rating", Rating::E)
            .unwrap();

        let touched: Vec<&LiveMeasure> = matrix.touched().collect();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].data.as_deref(), Some("E"));
        assert_eq!(touched[0].value, Some(5.0));

        // Same rating again is a no-op.
        let mut matrix = MeasureMatrix::new(
            vec![file(), project()],
            vec![metric(3, "reliability_rating")],
        );
        let mut preloaded = LiveMeasure::new("F1", "P1", 3);
        preloaded.data = Some("E".to_string());
        preloaded.value = Some(5.0);
        matrix.init(vec![preloaded]);
        matrix
            .set_rating_value(&file(), "reliability_rating", Rating::E)
            .unwrap();
        assert_eq!(touched_count(&matrix), 0);
    }

    #[test]
    fn test_unregistered_metric_is_fatal() {
        let mut matrix = matrix();
        let result = matrix.set_value(&file(), "coverage", 80.0);
        assert!(matches!(result, Err(Error::UnregisteredMetric(_))));
    }

    #[test]
    fn test_project_is_last_of_chain() {
        let matrix = matrix();
        assert_eq!(matrix.project().uuid, "P1");
        let uuids: Vec<&str> = matrix
            .bottom_up_components()
            .iter()
            .map(|c| c.uuid.as_str())
            .collect();
        assert_eq!(uuids, vec!["F1", "P1"]);
    }
}
