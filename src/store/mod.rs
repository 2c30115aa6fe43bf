mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::metrics::MetricDef;
use crate::types::*;

/// DataStore defines the persistence interface of the engine.
///
/// The engine is embedded and blocking: one refresh runs to completion on
/// a single worker, wrapped in one `begin`/`commit` pair. Implementations
/// are expected to serialize concurrent writes and to roll back cleanly
/// when a refresh fails mid-way.
pub trait DataStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Component operations
    fn create_component(&self, component: &Component) -> Result<()>;
    /// Ancestors of the component ordered nearest-first, project root last.
    fn select_ancestors(&self, component: &Component) -> Result<Vec<Component>>;

    // Metric operations
    fn register_metrics(&self, defs: &[MetricDef]) -> Result<()>;
    fn select_metrics_by_keys(&self, keys: &[&str]) -> Result<Vec<Metric>>;
    fn select_metrics_by_ids(&self, ids: &[i64]) -> Result<Vec<Metric>>;
    fn select_metric_by_key(&self, key: &str) -> Result<Option<Metric>>;

    // Snapshot operations
    fn create_snapshot(&self, snapshot: &Snapshot) -> Result<()>;
    fn select_last_analysis(&self, project_uuid: &str) -> Result<Option<Snapshot>>;

    // Issue operations
    fn create_issue(&self, issue: &Issue) -> Result<()>;
    fn update_issue(&self, issue: &Issue) -> Result<()>;
    fn delete_issue(&self, kee: &str) -> Result<bool>;
    /// Aggregates the non-closed issues of the subtree rooted at the
    /// component by (rule type, severity, resolution, status, in-leak).
    /// An issue is in leak iff `leak_start` is set and its creation date
    /// is at or after it.
    fn select_issue_groups(
        &self,
        component: &Component,
        leak_start: Option<i64>,
    ) -> Result<Vec<IssueGroup>>;

    // Live measure operations
    fn select_live_measures(
        &self,
        component_uuids: &[String],
        metric_ids: &[i64],
    ) -> Result<Vec<LiveMeasure>>;
    fn select_measure(&self, component_uuid: &str, metric_key: &str)
    -> Result<Option<LiveMeasure>>;
    fn insert_live_measure(&self, measure: &LiveMeasure) -> Result<()>;
    /// Returns false when no row exists for (component, metric).
    fn update_live_measure(&self, measure: &LiveMeasure) -> Result<bool>;
    fn insert_or_update_live_measure(&self, measure: &LiveMeasure) -> Result<()>;
    fn delete_live_measures_by_project(&self, project_uuid: &str) -> Result<usize>;

    // Quality gate operations
    fn create_quality_gate(&self, name: &str) -> Result<QualityGate>;
    /// Inserts the condition and returns its assigned id.
    fn create_gate_condition(&self, condition: &QualityGateCondition) -> Result<i64>;
    fn set_project_gate(&self, project_uuid: &str, gate_id: i64) -> Result<()>;
    fn select_quality_gate_for_project(&self, project_uuid: &str) -> Result<Option<QualityGate>>;
    fn select_conditions_for_gate(&self, gate_id: i64) -> Result<Vec<QualityGateCondition>>;

    // Transaction scope
    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;
}
