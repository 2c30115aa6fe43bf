use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use uuid::Uuid;

use super::DataStore;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::metrics::{CORE_METRICS, MetricDef};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

/// Row ids of live measures are 16-char unique strings.
fn new_row_uuid() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn conversion_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, message.into())
}

fn row_to_component(row: &rusqlite::Row<'_>) -> rusqlite::Result<Component> {
    let qualifier: String = row.get(4)?;
    Ok(Component {
        uuid: row.get(0)?,
        project_uuid: row.get(1)?,
        uuid_path: row.get(2)?,
        name: row.get(3)?,
        qualifier: ComponentType::parse(&qualifier)
            .ok_or_else(|| conversion_err(4, format!("unknown component qualifier '{qualifier}'")))?,
    })
}

fn row_to_metric(row: &rusqlite::Row<'_>) -> rusqlite::Result<Metric> {
    let value_type: String = row.get(2)?;
    Ok(Metric {
        id: row.get(0)?,
        key: row.get(1)?,
        value_type: ValueType::parse(&value_type)
            .ok_or_else(|| conversion_err(2, format!("unknown metric value type '{value_type}'")))?,
    })
}

fn row_to_measure(row: &rusqlite::Row<'_>) -> rusqlite::Result<LiveMeasure> {
    Ok(LiveMeasure {
        uuid: row.get(0)?,
        component_uuid: row.get(1)?,
        project_uuid: row.get(2)?,
        metric_id: row.get(3)?,
        value: row.get(4)?,
        data: row.get(5)?,
        variation: row.get(6)?,
        gate_status: row.get(7)?,
        gate_text: row.get(8)?,
    })
}

const MEASURE_COLUMNS: &str = "uuid, component_uuid, project_uuid, metric_id, value, text_value, \
                               variation, gate_status, gate_text";

impl DataStore for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        self.register_metrics(CORE_METRICS)
    }

    // Component operations

    fn create_component(&self, component: &Component) -> Result<()> {
        self.conn().execute(
            "INSERT INTO components (uuid, project_uuid, uuid_path, name, qualifier)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                component.uuid,
                component.project_uuid,
                component.uuid_path,
                component.name,
                component.qualifier.as_str(),
            ],
        )?;
        Ok(())
    }

    fn select_ancestors(&self, component: &Component) -> Result<Vec<Component>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT uuid, project_uuid, uuid_path, name, qualifier FROM components WHERE uuid = ?1",
        )?;

        // uuid_path is ordered root-first; callers want nearest-first.
        let mut ancestors = Vec::new();
        for uuid in component.ancestor_uuids().into_iter().rev() {
            if let Some(ancestor) = stmt.query_row(params![uuid], row_to_component).optional()? {
                ancestors.push(ancestor);
            } else {
                tracing::error!("Ancestor '{uuid}' referenced by uuid_path does not exist");
            }
        }
        Ok(ancestors)
    }

    // Metric operations

    fn register_metrics(&self, defs: &[MetricDef]) -> Result<()> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO metrics (kee, value_type) VALUES (?1, ?2)")?;
        for def in defs {
            stmt.execute(params![def.key, def.value_type.as_str()])?;
        }
        Ok(())
    }

    fn select_metrics_by_keys(&self, keys: &[&str]) -> Result<Vec<Metric>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let sql = format!(
            "SELECT id, kee, value_type FROM metrics WHERE kee IN ({})",
            placeholders(keys.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(keys.iter()), row_to_metric)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn select_metrics_by_ids(&self, ids: &[i64]) -> Result<Vec<Metric>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let sql = format!(
            "SELECT id, kee, value_type FROM metrics WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_metric)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn select_metric_by_key(&self, key: &str) -> Result<Option<Metric>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, kee, value_type FROM metrics WHERE kee = ?1",
            params![key],
            row_to_metric,
        )
        .optional()
        .map_err(Error::from)
    }

    // Snapshot operations

    fn create_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.conn().execute(
            "INSERT INTO snapshots (uuid, project_uuid, period_date) VALUES (?1, ?2, ?3)
             ON CONFLICT(project_uuid) DO UPDATE SET period_date = excluded.period_date",
            params![snapshot.uuid, snapshot.project_uuid, snapshot.period_date],
        )?;
        Ok(())
    }

    fn select_last_analysis(&self, project_uuid: &str) -> Result<Option<Snapshot>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT uuid, project_uuid, period_date FROM snapshots WHERE project_uuid = ?1",
            params![project_uuid],
            |row| {
                Ok(Snapshot {
                    uuid: row.get(0)?,
                    project_uuid: row.get(1)?,
                    period_date: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Issue operations

    fn create_issue(&self, issue: &Issue) -> Result<()> {
        self.conn().execute(
            "INSERT INTO issues (kee, component_uuid, project_uuid, rule_type, severity,
                                 resolution, status, effort, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                issue.kee,
                issue.component_uuid,
                issue.project_uuid,
                issue.rule_type.as_str(),
                issue.severity.as_str(),
                issue.resolution,
                issue.status,
                issue.effort,
                issue.created_at,
            ],
        )?;
        Ok(())
    }

    fn update_issue(&self, issue: &Issue) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE issues SET rule_type = ?1, severity = ?2, resolution = ?3, status = ?4,
                               effort = ?5, created_at = ?6
             WHERE kee = ?7",
            params![
                issue.rule_type.as_str(),
                issue.severity.as_str(),
                issue.resolution,
                issue.status,
                issue.effort,
                issue.created_at,
                issue.kee,
            ],
        )?;
        if rows == 0 {
            return Err(Error::Database(rusqlite::Error::QueryReturnedNoRows));
        }
        Ok(())
    }

    fn delete_issue(&self, kee: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM issues WHERE kee = ?1", params![kee])?;
        Ok(rows > 0)
    }

    fn select_issue_groups(
        &self,
        component: &Component,
        leak_start: Option<i64>,
    ) -> Result<Vec<IssueGroup>> {
        let conn = self.conn();
        // Descendants carry the component's own path as a uuid_path prefix.
        let subtree_prefix = format!("{}{}.%", component.uuid_path, component.uuid);
        let mut stmt = conn.prepare(
            "SELECT i.rule_type, i.severity, i.resolution, i.status,
                    CASE WHEN ?2 IS NOT NULL AND i.created_at >= ?2 THEN 1 ELSE 0 END AS in_leak,
                    COUNT(*) AS issue_count,
                    COALESCE(SUM(i.effort), 0) AS effort
             FROM issues i
             WHERE i.status <> 'CLOSED'
               AND i.component_uuid IN (
                   SELECT uuid FROM components WHERE uuid = ?1 OR uuid_path LIKE ?3
               )
             GROUP BY i.rule_type, i.severity, i.resolution, i.status, in_leak",
        )?;

        let rows = stmt.query_map(
            params![component.uuid, leak_start, subtree_prefix],
            |row| {
                let rule_type: String = row.get(0)?;
                let severity: String = row.get(1)?;
                Ok(IssueGroup {
                    rule_type: RuleType::parse(&rule_type)
                        .ok_or_else(|| conversion_err(0, format!("unknown rule type '{rule_type}'")))?,
                    severity: Severity::parse(&severity)
                        .ok_or_else(|| conversion_err(1, format!("unknown severity '{severity}'")))?,
                    resolution: row.get(2)?,
                    status: row.get(3)?,
                    in_leak: row.get::<_, i64>(4)? != 0,
                    count: row.get(5)?,
                    effort: row.get(6)?,
                })
            },
        )?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Live measure operations

    fn select_live_measures(
        &self,
        component_uuids: &[String],
        metric_ids: &[i64],
    ) -> Result<Vec<LiveMeasure>> {
        if component_uuids.is_empty() || metric_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let sql = format!(
            "SELECT {MEASURE_COLUMNS} FROM live_measures
             WHERE component_uuid IN ({}) AND metric_id IN ({})",
            placeholders(component_uuids.len()),
            placeholders(metric_ids.len()),
        );
        let mut stmt = conn.prepare(&sql)?;
        let values: Vec<Value> = component_uuids
            .iter()
            .map(|u| Value::from(u.clone()))
            .chain(metric_ids.iter().map(|id| Value::from(*id)))
            .collect();
        let rows = stmt.query_map(params_from_iter(values), row_to_measure)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn select_measure(
        &self,
        component_uuid: &str,
        metric_key: &str,
    ) -> Result<Option<LiveMeasure>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT m.uuid, m.component_uuid, m.project_uuid, m.metric_id, m.value,
                    m.text_value, m.variation, m.gate_status, m.gate_text
             FROM live_measures m
             JOIN metrics mt ON mt.id = m.metric_id
             WHERE m.component_uuid = ?1 AND mt.kee = ?2",
            params![component_uuid, metric_key],
            row_to_measure,
        )
        .optional()
        .map_err(Error::from)
    }

    fn insert_live_measure(&self, measure: &LiveMeasure) -> Result<()> {
        let uuid = measure.uuid.clone().unwrap_or_else(new_row_uuid);
        let now = format_datetime(&Utc::now());
        self.conn().execute(
            "INSERT INTO live_measures (uuid, component_uuid, project_uuid, metric_id,
                                        value, text_value, variation, gate_status, gate_text,
                                        created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                uuid,
                measure.component_uuid,
                measure.project_uuid,
                measure.metric_id,
                measure.value,
                measure.data,
                measure.variation,
                measure.gate_status,
                measure.gate_text,
                now,
            ],
        )?;
        Ok(())
    }

    fn update_live_measure(&self, measure: &LiveMeasure) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE live_measures
             SET value = ?1, text_value = ?2, variation = ?3, gate_status = ?4, gate_text = ?5,
                 updated_at = ?8
             WHERE component_uuid = ?6 AND metric_id = ?7",
            params![
                measure.value,
                measure.data,
                measure.variation,
                measure.gate_status,
                measure.gate_text,
                measure.component_uuid,
                measure.metric_id,
                format_datetime(&Utc::now()),
            ],
        )?;
        Ok(rows == 1)
    }

    fn insert_or_update_live_measure(&self, measure: &LiveMeasure) -> Result<()> {
        if !self.update_live_measure(measure)? {
            self.insert_live_measure(measure)?;
        }
        Ok(())
    }

    fn delete_live_measures_by_project(&self, project_uuid: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM live_measures WHERE project_uuid = ?1",
            params![project_uuid],
        )?;
        Ok(rows)
    }

    // Quality gate operations

    fn create_quality_gate(&self, name: &str) -> Result<QualityGate> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO quality_gates (name) VALUES (?1)",
            params![name],
        )?;
        Ok(QualityGate {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn create_gate_condition(&self, condition: &QualityGateCondition) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO quality_gate_conditions (gate_id, metric_id, operator,
                                                  warning_threshold, error_threshold, period)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                condition.gate_id,
                condition.metric_id,
                condition.operator,
                condition.warning_threshold,
                condition.error_threshold,
                condition.period,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn set_project_gate(&self, project_uuid: &str, gate_id: i64) -> Result<()> {
        self.conn().execute(
            "INSERT INTO project_quality_gates (project_uuid, gate_id) VALUES (?1, ?2)
             ON CONFLICT(project_uuid) DO UPDATE SET gate_id = excluded.gate_id",
            params![project_uuid, gate_id],
        )?;
        Ok(())
    }

    fn select_quality_gate_for_project(&self, project_uuid: &str) -> Result<Option<QualityGate>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT g.id, g.name FROM quality_gates g
             JOIN project_quality_gates pg ON pg.gate_id = g.id
             WHERE pg.project_uuid = ?1",
            params![project_uuid],
            |row| {
                Ok(QualityGate {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn select_conditions_for_gate(&self, gate_id: i64) -> Result<Vec<QualityGateCondition>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, gate_id, metric_id, operator, warning_threshold, error_threshold, period
             FROM quality_gate_conditions WHERE gate_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![gate_id], |row| {
            Ok(QualityGateCondition {
                id: row.get(0)?,
                gate_id: row.get(1)?,
                metric_id: row.get(2)?,
                operator: row.get(3)?,
                warning_threshold: row.get(4)?,
                error_threshold: row.get(5)?,
                period: row.get(6)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Transaction scope

    fn begin(&self) -> Result<()> {
        self.conn().execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.conn().execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.conn().execute_batch("ROLLBACK")?;
        Ok(())
    }
}
