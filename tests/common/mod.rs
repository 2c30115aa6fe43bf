use livegate::live::LiveMeasureComputer;
use livegate::store::{DataStore, SqliteStore};
use livegate::types::*;
use tempfile::TempDir;

/// One project on a fresh SQLite store, with helpers to grow a component
/// tree, mutate its issue population and read back live measures.
pub struct Fixture {
    _temp: TempDir,
    pub store: SqliteStore,
    pub project: Component,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Fixture {
    /// Project without a leak period.
    pub fn new() -> Fixture {
        Fixture::with_period(None)
    }

    /// Project whose last analysis recorded the given leak period start.
    pub fn with_period(period_date: Option<i64>) -> Fixture {
        init_tracing();
        let temp = TempDir::new().expect("temp dir");
        let store = SqliteStore::new(temp.path().join("livegate.db")).expect("open store");
        store.initialize().expect("initialize store");

        let project = Component {
            uuid: "P1".to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: ".".to_string(),
            name: "project".to_string(),
            qualifier: ComponentType::Project,
        };
        store.create_component(&project).expect("create project");
        store
            .create_snapshot(&Snapshot {
                uuid: "S1".to_string(),
                project_uuid: "P1".to_string(),
                period_date,
            })
            .expect("create snapshot");

        Fixture {
            _temp: temp,
            store,
            project,
        }
    }

    pub fn add_directory(&self, uuid: &str) -> Component {
        let dir = Component {
            uuid: uuid.to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: ".P1.".to_string(),
            name: uuid.to_lowercase(),
            qualifier: ComponentType::Directory,
        };
        self.store.create_component(&dir).expect("create directory");
        dir
    }

    pub fn add_file(&self, uuid: &str, parent: &Component) -> Component {
        let file = Component {
            uuid: uuid.to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: format!("{}{}.", parent.uuid_path, parent.uuid),
            name: uuid.to_lowercase(),
            qualifier: ComponentType::File,
        };
        self.store.create_component(&file).expect("create file");
        file
    }

    pub fn add_issue(
        &self,
        kee: &str,
        component: &Component,
        rule_type: RuleType,
        severity: Severity,
        created_at: i64,
    ) -> Issue {
        let issue = Issue {
            kee: kee.to_string(),
            component_uuid: component.uuid.clone(),
            project_uuid: "P1".to_string(),
            rule_type,
            severity,
            resolution: None,
            status: statuses::OPEN.to_string(),
            effort: 10.0,
            created_at,
        };
        self.store.create_issue(&issue).expect("create issue");
        issue
    }

    pub fn resolve_issue(&self, issue: &mut Issue, resolution: &str) {
        issue.resolution = Some(resolution.to_string());
        issue.status = statuses::RESOLVED.to_string();
        self.store.update_issue(issue).expect("update issue");
    }

    pub fn add_gate_on(
        &self,
        metric_key: &str,
        operator: &str,
        warning: Option<&str>,
        error: Option<&str>,
    ) {
        let metric = self
            .store
            .select_metric_by_key(metric_key)
            .expect("select metric")
            .expect("metric registered");
        let gate = self.store.create_quality_gate("Default").expect("create gate");
        self.store
            .create_gate_condition(&QualityGateCondition {
                id: 0,
                gate_id: gate.id,
                metric_id: metric.id,
                operator: operator.to_string(),
                warning_threshold: warning.map(str::to_string),
                error_threshold: error.map(str::to_string),
                period: None,
            })
            .expect("create condition");
        self.store
            .set_project_gate("P1", gate.id)
            .expect("associate gate");
    }

    pub fn refresh(&self, component: &Component) {
        LiveMeasureComputer::new(&self.store)
            .refresh(component)
            .expect("refresh");
    }

    pub fn measure(&self, component: &Component, metric_key: &str) -> Option<LiveMeasure> {
        self.store
            .select_measure(&component.uuid, metric_key)
            .expect("select measure")
    }

    pub fn value(&self, component: &Component, metric_key: &str) -> Option<f64> {
        self.measure(component, metric_key).and_then(|m| m.value)
    }

    pub fn data(&self, component: &Component, metric_key: &str) -> Option<String> {
        self.measure(component, metric_key).and_then(|m| m.data)
    }

    pub fn variation(&self, component: &Component, metric_key: &str) -> Option<f64> {
        self.measure(component, metric_key).and_then(|m| m.variation)
    }

    pub fn alert_status(&self) -> Option<String> {
        self.data(&self.project, livegate::metrics::ALERT_STATUS)
    }

    /// (metric key, value, variation, updated_at) of every persisted
    /// measure row except the two gate metrics, which are rewritten on
    /// every gate recomputation. Used to observe that a refresh wrote no
    /// measure.
    pub fn measure_rows(&self) -> Vec<(String, Option<f64>, Option<f64>, String)> {
        let conn = self.store.connection();
        let mut stmt = conn
            .prepare(
                "SELECT mt.kee, m.value, m.variation, m.updated_at
                 FROM live_measures m JOIN metrics mt ON mt.id = m.metric_id
                 WHERE mt.kee NOT IN ('alert_status', 'quality_gate_details')
                 ORDER BY m.component_uuid, mt.kee",
            )
            .expect("prepare");
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .expect("query");
        rows.collect::<Result<Vec<_>, _>>().expect("collect")
    }
}
