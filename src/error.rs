use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("metric {0} not registered in measure matrix")]
    UnregisteredMetric(String),

    #[error("metric {0} not found")]
    MetricNotFound(String),

    #[error("conditions on DATA metrics are not supported")]
    DataConditionUnsupported,

    #[error("conditions are not supported for metric type {0}")]
    ConditionTypeUnsupported(String),

    #[error("leak period conditions are not supported for metric type {0}")]
    PeriodConditionTypeUnsupported(String),

    #[error("unable to parse threshold '{value}' to compare against {metric_key}")]
    UnparseableThreshold { metric_key: String, value: String },

    #[error("unsupported operator '{0}'")]
    UnknownOperator(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
