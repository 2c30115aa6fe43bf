use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::types::{Level, LiveMeasure, Metric, Operator, QualityGateCondition, ValueType};

/// Value extracted from a measure, typed by the metric's value type. Both
/// the measure side and the threshold side of a condition are parsed into
/// this form before comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureValue {
    Boolean(bool),
    Int(i64),
    Long(i64),
    Double(f64),
    Text(String),
}

impl MeasureValue {
    fn compare(&self, other: &MeasureValue) -> Option<Ordering> {
        match (self, other) {
            (MeasureValue::Boolean(a), MeasureValue::Boolean(b)) => Some(a.cmp(b)),
            (MeasureValue::Int(a), MeasureValue::Int(b)) => Some(a.cmp(b)),
            (MeasureValue::Long(a), MeasureValue::Long(b)) => Some(a.cmp(b)),
            (MeasureValue::Double(a), MeasureValue::Double(b)) => Some(a.total_cmp(b)),
            (MeasureValue::Text(a), MeasureValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureValue::Boolean(v) => write!(f, "{}", if *v { 1 } else { 0 }),
            MeasureValue::Int(v) | MeasureValue::Long(v) => write!(f, "{v}"),
            MeasureValue::Double(v) => write!(f, "{v}"),
            MeasureValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Outcome of one condition: the reached level and the value the measure
/// was compared as. The value is absent when a period condition found no
/// variation on the measure.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub level: Level,
    pub value: Option<MeasureValue>,
}

/// Evaluates a single quality gate condition against a live measure.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    pub fn evaluate(
        metric: &Metric,
        condition: &QualityGateCondition,
        measure: &LiveMeasure,
    ) -> Result<Evaluation> {
        if metric.value_type == ValueType::Data {
            return Err(Error::DataConditionUnsupported);
        }
        let operator = Operator::parse(&condition.operator)
            .ok_or_else(|| Error::UnknownOperator(condition.operator.clone()))?;

        let Some(measured) = extract_value(metric, condition, measure)? else {
            return Ok(Evaluation {
                level: Level::Ok,
                value: None,
            });
        };

        for (threshold, level) in [
            (&condition.error_threshold, Level::Error),
            (&condition.warning_threshold, Level::Warn),
        ] {
            let Some(threshold) = threshold.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            let parsed = parse_threshold(metric, threshold)?;
            if reaches_threshold(&measured, &parsed, operator, metric)? {
                return Ok(Evaluation {
                    level,
                    value: Some(measured),
                });
            }
        }

        Ok(Evaluation {
            level: Level::Ok,
            value: Some(measured),
        })
    }
}

/// Coerces the measure to the metric's value type. Period conditions read
/// the variation; everything else reads the principal value. An absent
/// slot yields `None`, which the caller maps to OK.
fn extract_value(
    metric: &Metric,
    condition: &QualityGateCondition,
    measure: &LiveMeasure,
) -> Result<Option<MeasureValue>> {
    if condition.period.is_some() {
        let Some(variation) = measure.variation else {
            return Ok(None);
        };
        return match metric.value_type {
            ValueType::Boolean => Ok(Some(MeasureValue::Boolean(variation.trunc() as i64 == 1))),
            ValueType::Int => Ok(Some(MeasureValue::Int(variation.trunc() as i64))),
            ValueType::Long => Ok(Some(MeasureValue::Long(variation.trunc() as i64))),
            ValueType::Double => Ok(Some(MeasureValue::Double(variation))),
            ValueType::NoValue | ValueType::Text | ValueType::Level | ValueType::Data => Err(
                Error::PeriodConditionTypeUnsupported(metric.value_type.as_str().to_string()),
            ),
        };
    }

    match metric.value_type {
        ValueType::Boolean => Ok(measure.value.map(|v| MeasureValue::Boolean(v == 1.0))),
        ValueType::Int => Ok(measure.value.map(|v| MeasureValue::Int(v.trunc() as i64))),
        ValueType::Long => Ok(measure.value.map(|v| MeasureValue::Long(v.trunc() as i64))),
        ValueType::Double => Ok(measure.value.map(MeasureValue::Double)),
        ValueType::Text | ValueType::Level => {
            Ok(measure.data.clone().map(MeasureValue::Text))
        }
        ValueType::NoValue | ValueType::Data => Err(Error::ConditionTypeUnsupported(
            metric.value_type.as_str().to_string(),
        )),
    }
}

/// Parses a threshold string following the metric's value type.
fn parse_threshold(metric: &Metric, threshold: &str) -> Result<MeasureValue> {
    let unparseable = || Error::UnparseableThreshold {
        metric_key: metric.key.clone(),
        value: threshold.to_string(),
    };
    match metric.value_type {
        ValueType::Boolean => {
            let parsed: i64 = threshold.parse().map_err(|_| unparseable())?;
            Ok(MeasureValue::Boolean(parsed == 1))
        }
        ValueType::Int => Ok(MeasureValue::Int(parse_integer(threshold).ok_or_else(unparseable)?)),
        ValueType::Long => {
            Ok(MeasureValue::Long(threshold.parse().map_err(|_| unparseable())?))
        }
        ValueType::Double => {
            Ok(MeasureValue::Double(threshold.parse().map_err(|_| unparseable())?))
        }
        ValueType::Text | ValueType::Level => Ok(MeasureValue::Text(threshold.to_string())),
        ValueType::NoValue | ValueType::Data => Err(Error::ConditionTypeUnsupported(
            metric.value_type.as_str().to_string(),
        )),
    }
}

/// Integer thresholds tolerate a decimal tail, which is cut off.
fn parse_integer(value: &str) -> Option<i64> {
    let integer_part = value.split('.').next().unwrap_or(value);
    integer_part.parse().ok()
}

fn reaches_threshold(
    measured: &MeasureValue,
    threshold: &MeasureValue,
    operator: Operator,
    metric: &Metric,
) -> Result<bool> {
    let comparison = measured.compare(threshold).ok_or_else(|| {
        Error::ConditionTypeUnsupported(metric.value_type.as_str().to_string())
    })?;
    Ok(match operator {
        Operator::Eq => comparison == Ordering::Equal,
        Operator::Ne => comparison != Ordering::Equal,
        Operator::Gt => comparison == Ordering::Greater,
        Operator::Lt => comparison == Ordering::Less,
    })
}
