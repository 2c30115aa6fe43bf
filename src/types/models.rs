use serde::{Deserialize, Serialize};

/// Kind of node in the component tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentType {
    File,
    Directory,
    Module,
    Project,
}

impl ComponentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::File => "FILE",
            ComponentType::Directory => "DIRECTORY",
            ComponentType::Module => "MODULE",
            ComponentType::Project => "PROJECT",
        }
    }

    pub fn parse(s: &str) -> Option<ComponentType> {
        match s {
            "FILE" => Some(ComponentType::File),
            "DIRECTORY" => Some(ComponentType::Directory),
            "MODULE" => Some(ComponentType::Module),
            "PROJECT" => Some(ComponentType::Project),
            _ => None,
        }
    }
}

/// A node of the component tree (file, directory, module or project root).
///
/// `uuid_path` is the dotted chain of ancestor uuids from the project root
/// down to the parent, e.g. `.P1.D1.` for a file inside directory `D1` of
/// project `P1`. The project root carries `.`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub uuid: String,
    pub project_uuid: String,
    pub uuid_path: String,
    pub name: String,
    pub qualifier: ComponentType,
}

impl Component {
    /// Ancestor uuids ordered root-first, excluding the component itself.
    pub fn ancestor_uuids(&self) -> Vec<&str> {
        self.uuid_path
            .split('.')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Value type of a metric. The condition evaluator is the one place where
/// every arm is matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Int,
    Long,
    Double,
    Text,
    Level,
    Data,
    NoValue,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Boolean => "BOOLEAN",
            ValueType::Int => "INT",
            ValueType::Long => "LONG",
            ValueType::Double => "DOUBLE",
            ValueType::Text => "STRING",
            ValueType::Level => "LEVEL",
            ValueType::Data => "DATA",
            ValueType::NoValue => "NO_VALUE",
        }
    }

    pub fn parse(s: &str) -> Option<ValueType> {
        match s {
            "BOOLEAN" => Some(ValueType::Boolean),
            "INT" => Some(ValueType::Int),
            "LONG" => Some(ValueType::Long),
            "DOUBLE" => Some(ValueType::Double),
            "STRING" => Some(ValueType::Text),
            "LEVEL" => Some(ValueType::Level),
            "DATA" => Some(ValueType::Data),
            "NO_VALUE" => Some(ValueType::NoValue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: i64,
    pub key: String,
    pub value_type: ValueType,
}

/// One persisted measure cell per (component, metric), kept in sync with
/// the issue population between analyses.
///
/// `value` and `variation` together encode the current value and the
/// new-code delta: when `variation` is set, `value - variation` is the
/// value at the leak period boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveMeasure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub component_uuid: String,
    pub project_uuid: String,
    pub metric_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_text: Option<String>,
}

impl LiveMeasure {
    pub fn new(component_uuid: &str, project_uuid: &str, metric_id: i64) -> LiveMeasure {
        LiveMeasure {
            uuid: None,
            component_uuid: component_uuid.to_string(),
            project_uuid: project_uuid.to_string(),
            metric_id,
            value: None,
            data: None,
            variation: None,
            gate_status: None,
            gate_text: None,
        }
    }
}

/// Last-analysis marker of a project. An issue is in the leak period iff
/// its creation date is at or after `period_date`; without a period date
/// nothing is in leak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub uuid: String,
    pub project_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_date: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGate {
    pub id: i64,
    pub name: String,
}

/// A single gate condition: metric, operator and warn/error thresholds.
/// `period` restricts the condition to the new-code variation when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGateCondition {
    pub id: i64,
    pub gate_id: i64,
    pub metric_id: i64,
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_threshold: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Ne => "NE",
            Operator::Gt => "GT",
            Operator::Lt => "LT",
        }
    }

    pub fn parse(s: &str) -> Option<Operator> {
        match s {
            "EQ" => Some(Operator::Eq),
            "NE" => Some(Operator::Ne),
            "GT" => Some(Operator::Gt),
            "LT" => Some(Operator::Lt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestor_uuids() {
        let file = Component {
            uuid: "F1".to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: ".P1.D1.".to_string(),
            name: "file.rs".to_string(),
            qualifier: ComponentType::File,
        };
        assert_eq!(file.ancestor_uuids(), vec!["P1", "D1"]);

        let project = Component {
            uuid: "P1".to_string(),
            project_uuid: "P1".to_string(),
            uuid_path: ".".to_string(),
            name: "project".to_string(),
            qualifier: ComponentType::Project,
        };
        assert!(project.ancestor_uuids().is_empty());
    }

    #[test]
    fn test_value_type_round_trip() {
        for vt in [
            ValueType::Boolean,
            ValueType::Int,
            ValueType::Long,
            ValueType::Double,
            ValueType::Text,
            ValueType::Level,
            ValueType::Data,
            ValueType::NoValue,
        ] {
            assert_eq!(ValueType::parse(vt.as_str()), Some(vt));
        }
        assert_eq!(ValueType::parse("FLOAT"), None);
    }
}
