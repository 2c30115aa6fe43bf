pub const SCHEMA: &str = r#"
-- Component tree: files, directories, modules and project roots.
-- uuid_path is the dotted chain of ancestor uuids, root first, e.g.
-- '.P1.D1.' for a file under directory D1 of project P1. Roots carry '.'.
CREATE TABLE IF NOT EXISTS components (
    uuid TEXT PRIMARY KEY,
    project_uuid TEXT NOT NULL,
    uuid_path TEXT NOT NULL,
    name TEXT NOT NULL,
    qualifier TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Metric catalogue. Numeric ids keep live_measures and gate conditions
-- compact.
CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kee TEXT NOT NULL UNIQUE,
    value_type TEXT NOT NULL
);

-- Last-analysis marker, one row per project. period_date (epoch ms) is
-- the start of the leak period; NULL means no leak period is defined.
CREATE TABLE IF NOT EXISTS snapshots (
    uuid TEXT PRIMARY KEY,
    project_uuid TEXT NOT NULL UNIQUE,
    period_date INTEGER,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Issue rows, the source of the aggregation query. effort is remediation
-- work in minutes, created_at epoch ms.
CREATE TABLE IF NOT EXISTS issues (
    kee TEXT PRIMARY KEY,
    component_uuid TEXT NOT NULL REFERENCES components(uuid) ON DELETE CASCADE,
    project_uuid TEXT NOT NULL,
    rule_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    resolution TEXT,
    status TEXT NOT NULL,
    effort REAL NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

-- One live measure per (component, metric). value/variation encode the
-- current value and the new-code delta together; gate_status/gate_text
-- are only filled on measures backing a quality gate condition.
CREATE TABLE IF NOT EXISTS live_measures (
    uuid TEXT PRIMARY KEY,
    component_uuid TEXT NOT NULL,
    project_uuid TEXT NOT NULL,
    metric_id INTEGER NOT NULL REFERENCES metrics(id),
    value REAL,
    text_value TEXT,
    variation REAL,
    gate_status TEXT,
    gate_text TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(component_uuid, metric_id)
);

CREATE TABLE IF NOT EXISTS quality_gates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS quality_gate_conditions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    gate_id INTEGER NOT NULL REFERENCES quality_gates(id) ON DELETE CASCADE,
    metric_id INTEGER NOT NULL REFERENCES metrics(id),
    operator TEXT NOT NULL,
    warning_threshold TEXT,
    error_threshold TEXT,
    period INTEGER
);

-- A project is associated with at most one gate.
CREATE TABLE IF NOT EXISTS project_quality_gates (
    project_uuid TEXT PRIMARY KEY,
    gate_id INTEGER NOT NULL REFERENCES quality_gates(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_components_project ON components(project_uuid);
CREATE INDEX IF NOT EXISTS idx_components_uuid_path ON components(uuid_path);
CREATE INDEX IF NOT EXISTS idx_issues_component ON issues(component_uuid);
CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_uuid);
CREATE INDEX IF NOT EXISTS idx_live_measures_project ON live_measures(project_uuid);
CREATE INDEX IF NOT EXISTS idx_gate_conditions_gate ON quality_gate_conditions(gate_id);
"#;
