//! Predicate evaluation
//!
//! A query's filters are a flat list of conditions joined with AND: a record
//! matches when every condition holds, whether the conditions name
//! different fields or repeat the same one.

use crate::error::ValidationError;
use std::fmt;
use storage::{Field, FieldKind, FieldValue, SensorRecord};

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl CompareOp {
    /// Parse a wire keyword (`eq`, `gte`, `gt`, `lte`, `lt`)
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "eq" => Some(CompareOp::Eq),
            "gte" => Some(CompareOp::Gte),
            "gt" => Some(CompareOp::Gt),
            "lte" => Some(CompareOp::Lte),
            "lt" => Some(CompareOp::Lt),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Gte => "gte",
            CompareOp::Gt => "gt",
            CompareOp::Lte => "lte",
            CompareOp::Lt => "lt",
        }
    }

    fn compare(self, actual: f64, bound: f64) -> bool {
        match self {
            CompareOp::Eq => actual == bound,
            CompareOp::Gte => actual >= bound,
            CompareOp::Gt => actual > bound,
            CompareOp::Lte => actual <= bound,
            CompareOp::Lt => actual < bound,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Threshold a field is compared against
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
}

/// One validated `field op operand` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: Field,
    op: CompareOp,
    operand: Operand,
}

impl Condition {
    /// Build a condition, rejecting operands that cannot apply to the field.
    ///
    /// Numeric fields take numeric thresholds with any operator. The
    /// categorical `visibility` field only supports `eq` against a code.
    pub fn new(field: Field, op: CompareOp, operand: Operand) -> Result<Self, ValidationError> {
        let fits = match (field.kind(), &operand) {
            (FieldKind::Numeric, Operand::Number(n)) => n.is_finite(),
            (FieldKind::Categorical, Operand::Text(_)) => op == CompareOp::Eq,
            _ => false,
        };

        if !fits {
            return Err(ValidationError::TypeMismatch {
                field: field.name().to_string(),
                operator: op.keyword().to_string(),
                expected: match field.kind() {
                    FieldKind::Numeric => "a finite number",
                    FieldKind::Categorical => "`eq` with a string code",
                },
            });
        }

        Ok(Self { field, op, operand })
    }

    /// Shorthand for a numeric condition
    pub fn numeric(field: Field, op: CompareOp, bound: f64) -> Result<Self, ValidationError> {
        Self::new(field, op, Operand::Number(bound))
    }

    /// Check a single record against this condition
    pub fn matches(&self, record: &SensorRecord) -> bool {
        match (record.value(self.field), &self.operand) {
            (FieldValue::Number(actual), Operand::Number(bound)) => self.op.compare(actual, *bound),
            (FieldValue::Text(actual), Operand::Text(expected)) => {
                self.op == CompareOp::Eq && actual == expected
            }
            _ => false,
        }
    }
}

/// True iff `record` satisfies every condition
pub fn matches_all(record: &SensorRecord, conditions: &[Condition]) -> bool {
    conditions.iter().all(|c| c.matches(record))
}
