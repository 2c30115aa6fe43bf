mod computer;
mod evaluator;

pub use computer::QualityGateComputer;
pub use evaluator::{ConditionEvaluator, Evaluation, MeasureValue};
