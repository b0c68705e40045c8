//! Result sorting
//!
//! Orders records by a single column. Sort is stable: equal keys keep the
//! order they were ingested in, for both directions.

use std::cmp::Ordering;
use storage::{Field, FieldValue, SensorRecord};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parse `ascending`/`descending` (or `asc`/`desc`)
    pub fn parse(order: &str) -> Option<Self> {
        match order {
            "ascending" | "asc" => Some(SortOrder::Ascending),
            "descending" | "desc" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Field,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: Field) -> Self {
        Self {
            field,
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(field: Field) -> Self {
        Self {
            field,
            order: SortOrder::Descending,
        }
    }
}

/// Sorts records in place according to `spec`
pub fn sort_records(records: &mut [&SensorRecord], spec: &SortSpec) {
    records.sort_by(|a, b| {
        let ordering = compare_values(a.value(spec.field), b.value(spec.field));
        match spec.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(&b),
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        // A column never mixes kinds
        _ => Ordering::Equal,
    }
}
