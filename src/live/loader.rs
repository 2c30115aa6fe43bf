use crate::error::Result;
use crate::live::MeasureMatrix;
use crate::metrics;
use crate::store::DataStore;
use crate::types::Component;

/// Materialises a [`MeasureMatrix`] for one refresh: resolves the ancestor
/// chain of the triggering component, loads the metric catalogue and every
/// existing measure of (chain × metrics), and seeds the matrix.
pub struct MatrixLoader<'a> {
    store: &'a dyn DataStore,
}

impl<'a> MatrixLoader<'a> {
    pub fn new(store: &'a dyn DataStore) -> MatrixLoader<'a> {
        MatrixLoader { store }
    }

    pub fn load(
        &self,
        component: &Component,
        extra_metric_keys: &[&str],
    ) -> Result<MeasureMatrix> {
        let mut keys: Vec<&str> = metrics::core_metric_keys();
        for key in extra_metric_keys {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        let metrics = self.store.select_metrics_by_keys(&keys)?;
        let metric_ids: Vec<i64> = metrics.iter().map(|m| m.id).collect();

        let mut bottom_up = vec![component.clone()];
        bottom_up.extend(self.store.select_ancestors(component)?);
        let component_uuids: Vec<String> = bottom_up.iter().map(|c| c.uuid.clone()).collect();

        let mut matrix = MeasureMatrix::new(bottom_up, metrics);
        let db_measures = self
            .store
            .select_live_measures(&component_uuids, &metric_ids)?;
        tracing::debug!(
            "Loaded matrix for {}: {} components, {} stored measures",
            component.uuid,
            component_uuids.len(),
            db_measures.len()
        );
        matrix.init(db_measures);

        Ok(matrix)
    }
}
