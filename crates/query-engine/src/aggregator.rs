//! Aggregation over a filtered record set

use crate::error::ValidationError;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use storage::{Field, FieldKind, SensorRecord};

/// Reduction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateOp {
    /// Parse an operator name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SUM" => Some(AggregateOp::Sum),
            "AVG" => Some(AggregateOp::Avg),
            "MIN" => Some(AggregateOp::Min),
            "MAX" => Some(AggregateOp::Max),
            "COUNT" => Some(AggregateOp::Count),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateOp::Sum => "SUM",
            AggregateOp::Avg => "AVG",
            AggregateOp::Min => "MIN",
            AggregateOp::Max => "MAX",
            AggregateOp::Count => "COUNT",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated aggregate request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateSpec {
    field: Field,
    op: AggregateOp,
}

impl AggregateSpec {
    /// Only `COUNT` applies to the categorical `visibility` column
    pub fn new(field: Field, op: AggregateOp) -> Result<Self, ValidationError> {
        if field.kind() == FieldKind::Categorical && op != AggregateOp::Count {
            return Err(ValidationError::UnsupportedAggregate {
                field: field.name().to_string(),
                operator: op.name().to_string(),
            });
        }
        Ok(Self { field, op })
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn op(&self) -> AggregateOp {
        self.op
    }
}

/// Reduced value of one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateValue {
    Count(u64),
    Number(f64),
    /// AVG, MIN or MAX over no records
    Empty,
}

impl Serialize for AggregateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AggregateValue::Count(n) => serializer.serialize_u64(*n),
            AggregateValue::Number(n) => serializer.serialize_f64(*n),
            AggregateValue::Empty => serializer.serialize_none(),
        }
    }
}

/// Synthetic row holding only the aggregated column.
///
/// Serializes as `{"<column>": value}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateRow {
    pub field: Field,
    pub value: AggregateValue,
}

impl Serialize for AggregateRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field.name(), &self.value)?;
        map.end()
    }
}

/// Reduce the named column of `records`
pub fn aggregate(records: &[&SensorRecord], spec: &AggregateSpec) -> AggregateRow {
    let field = spec.field;
    let values = move || records.iter().filter_map(move |r| r.value(field).as_number());

    let value = match spec.op {
        AggregateOp::Count => AggregateValue::Count(records.len() as u64),
        AggregateOp::Sum => AggregateValue::Number(values().fold(0.0, |acc, v| acc + v)),
        AggregateOp::Avg => {
            if records.is_empty() {
                AggregateValue::Empty
            } else {
                AggregateValue::Number(values().fold(0.0, |acc, v| acc + v) / records.len() as f64)
            }
        }
        AggregateOp::Min => values()
            .reduce(f64::min)
            .map_or(AggregateValue::Empty, AggregateValue::Number),
        AggregateOp::Max => values()
            .reduce(f64::max)
            .map_or(AggregateValue::Empty, AggregateValue::Number),
    };

    AggregateRow { field, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humidity_rows(values: &[f64]) -> Vec<SensorRecord> {
        values
            .iter()
            .map(|&humidity| SensorRecord {
                humidity,
                visibility: "G".to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn run(records: &[SensorRecord], field: Field, op: AggregateOp) -> AggregateValue {
        let refs: Vec<_> = records.iter().collect();
        aggregate(&refs, &AggregateSpec::new(field, op).unwrap()).value
    }

    #[test]
    fn test_sum() {
        let rows = humidity_rows(&[20.0, 30.0, 20.0, 40.0, 50.0]);
        assert_eq!(run(&rows, Field::Humidity, AggregateOp::Sum), AggregateValue::Number(160.0));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        assert_eq!(run(&[], Field::Humidity, AggregateOp::Sum), AggregateValue::Number(0.0));
    }

    #[test]
    fn test_avg_min_max_count() {
        let rows = humidity_rows(&[20.0, 30.0, 40.0]);
        assert_eq!(run(&rows, Field::Humidity, AggregateOp::Avg), AggregateValue::Number(30.0));
        assert_eq!(run(&rows, Field::Humidity, AggregateOp::Min), AggregateValue::Number(20.0));
        assert_eq!(run(&rows, Field::Humidity, AggregateOp::Max), AggregateValue::Number(40.0));
        assert_eq!(run(&rows, Field::Visibility, AggregateOp::Count), AggregateValue::Count(3));
    }

    #[test]
    fn test_empty_avg_min_max() {
        assert_eq!(run(&[], Field::Humidity, AggregateOp::Avg), AggregateValue::Empty);
        assert_eq!(run(&[], Field::Humidity, AggregateOp::Min), AggregateValue::Empty);
        assert_eq!(run(&[], Field::Humidity, AggregateOp::Max), AggregateValue::Empty);
        assert_eq!(run(&[], Field::Humidity, AggregateOp::Count), AggregateValue::Count(0));
    }

    #[test]
    fn test_visibility_only_counts() {
        assert!(matches!(
            AggregateSpec::new(Field::Visibility, AggregateOp::Sum),
            Err(ValidationError::UnsupportedAggregate { .. })
        ));
        assert!(AggregateSpec::new(Field::Visibility, AggregateOp::Count).is_ok());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(AggregateOp::parse("SUM"), Some(AggregateOp::Sum));
        assert_eq!(AggregateOp::parse("avg"), Some(AggregateOp::Avg));
        assert_eq!(AggregateOp::parse("median"), None);
    }

    #[test]
    fn test_row_serializes_single_column() {
        let row = AggregateRow {
            field: Field::Humidity,
            value: AggregateValue::Number(160.0),
        };
        assert_eq!(serde_json::to_value(row).unwrap(), serde_json::json!({"humidity": 160.0}));

        let empty = AggregateRow {
            field: Field::Rainfall,
            value: AggregateValue::Empty,
        };
        assert_eq!(serde_json::to_value(empty).unwrap(), serde_json::json!({"rainfall": null}));
    }
}
