//! Query execution
//!
//! Pipeline: filter, then either aggregate (which short-circuits sort and
//! limit) or sort followed by limit.

use crate::aggregator::{aggregate, AggregateRow};
use crate::error::QueryError;
use crate::predicate::matches_all;
use crate::request::Query;
use crate::sorter::sort_records;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::sync::Arc;
use storage::{RecordStore, SensorRecord};
use tracing::debug;

/// Result of one query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Matching records, in the requested order
    Records(Vec<SensorRecord>),
    /// Single synthetic aggregate row
    Aggregate(AggregateRow),
}

impl QueryOutput {
    /// Number of rows returned to the caller
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Records(records) => records.len(),
            QueryOutput::Aggregate(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Always serializes as a JSON array; an aggregate is a one-element array.
impl Serialize for QueryOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueryOutput::Records(records) => records.serialize(serializer),
            QueryOutput::Aggregate(row) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(row)?;
                seq.end()
            }
        }
    }
}

/// Run a validated query over an in-memory record set
pub fn execute(records: &[SensorRecord], query: &Query) -> QueryOutput {
    let mut matched: Vec<&SensorRecord> = records
        .iter()
        .filter(|r| matches_all(r, &query.filters))
        .collect();

    if let Some(spec) = &query.aggregate {
        debug!(
            "Aggregating {} of {} over {} of {} records",
            spec.op(),
            spec.field(),
            matched.len(),
            records.len()
        );
        return QueryOutput::Aggregate(aggregate(&matched, spec));
    }

    if let Some(spec) = &query.sort {
        sort_records(&mut matched, spec);
    }

    let total_matched = matched.len();
    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }

    debug!(
        "Query matched {} of {} records, returning {}",
        total_matched,
        records.len(),
        matched.len()
    );
    QueryOutput::Records(matched.into_iter().cloned().collect())
}

/// Executes queries against a record store
pub struct QueryEngine<S: RecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecordStore + ?Sized> QueryEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Run `query` against a fresh snapshot of the store
    pub fn run(&self, query: &Query) -> Result<QueryOutput, QueryError> {
        let snapshot = self.store.snapshot()?;
        Ok(execute(&snapshot, query))
    }
}

impl<S: RecordStore + ?Sized> Clone for QueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{AggregateOp, AggregateSpec, AggregateValue};
    use crate::predicate::{CompareOp, Condition};
    use crate::sorter::SortSpec;
    use storage::{Field, Repository};

    fn fixture() -> Vec<SensorRecord> {
        let rows = [
            (1690967790, 14.1, 6.11, 20.0, 23.0, "M"),
            (1690999756, 16.2, 4.23, 30.0, 12.0, "M"),
            (1691012723, 15.7, 3.56, 20.0, 11.0, "G"),
            (1691032353, 17.6, 2.19, 40.0, 18.0, "VG"),
            (1691054751, 19.5, 1.20, 50.0, 7.0, "E"),
        ];
        rows.iter()
            .map(|&(timestamp, temperature, rainfall, humidity, wind_speed, visibility)| SensorRecord {
                timestamp,
                temperature,
                rainfall,
                humidity,
                wind_speed,
                visibility: visibility.to_string(),
            })
            .collect()
    }

    fn records(output: QueryOutput) -> Vec<SensorRecord> {
        match output {
            QueryOutput::Records(records) => records,
            QueryOutput::Aggregate(row) => panic!("expected records, got {row:?}"),
        }
    }

    #[test]
    fn test_no_clauses_returns_store_order() {
        let data = fixture();
        assert_eq!(records(execute(&data, &Query::new())), data);
    }

    #[test]
    fn test_filter_gte() {
        let query = Query::new().with_filter(Condition::numeric(Field::Humidity, CompareOp::Gte, 30.0).unwrap());
        let result = records(execute(&fixture(), &query));
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|r| r.humidity >= 30.0));
    }

    #[test]
    fn test_filter_equality_intersection() {
        let query = Query::new()
            .with_filter(Condition::numeric(Field::Humidity, CompareOp::Eq, 30.0).unwrap())
            .with_filter(Condition::numeric(Field::Rainfall, CompareOp::Eq, 4.23).unwrap());
        let result = records(execute(&fixture(), &query));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].temperature, 16.2);
    }

    #[test]
    fn test_aggregate_sum() {
        let query = Query::new().with_aggregate(AggregateSpec::new(Field::Humidity, AggregateOp::Sum).unwrap());
        let output = execute(&fixture(), &query);
        assert_eq!(output.len(), 1);
        assert_eq!(
            output,
            QueryOutput::Aggregate(AggregateRow {
                field: Field::Humidity,
                value: AggregateValue::Number(160.0),
            })
        );
    }

    #[test]
    fn test_aggregate_respects_filters() {
        let query = Query::new()
            .with_filter(Condition::numeric(Field::Humidity, CompareOp::Gte, 100.0).unwrap())
            .with_aggregate(AggregateSpec::new(Field::Humidity, AggregateOp::Sum).unwrap());
        match execute(&fixture(), &query) {
            QueryOutput::Aggregate(row) => assert_eq!(row.value, AggregateValue::Number(0.0)),
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_short_circuits_sort_and_limit() {
        let query = Query::new()
            .with_sort(SortSpec::asc(Field::Temperature))
            .with_limit(0)
            .with_aggregate(AggregateSpec::new(Field::Humidity, AggregateOp::Max).unwrap());
        let output = execute(&fixture(), &query);
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_sort_then_limit() {
        let query = Query::new().with_sort(SortSpec::desc(Field::Temperature)).with_limit(2);
        let result = records(execute(&fixture(), &query));
        let temps: Vec<f64> = result.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![19.5, 17.6]);
    }

    #[test]
    fn test_output_serializes_as_array() {
        let query = Query::new().with_aggregate(AggregateSpec::new(Field::Humidity, AggregateOp::Sum).unwrap());
        let json = serde_json::to_value(execute(&fixture(), &query)).unwrap();
        assert_eq!(json, serde_json::json!([{"humidity": 160.0}]));

        let json = serde_json::to_value(execute(&[], &Query::new())).unwrap();
        assert_eq!(json, serde_json::json!([]));
    }

    #[test]
    fn test_engine_reads_store_snapshot() {
        let repo = Arc::new(Repository::new());
        repo.append(fixture()).unwrap();

        let engine = QueryEngine::new(repo.clone());
        assert_eq!(engine.run(&Query::new()).unwrap().len(), 5);

        repo.append(fixture()).unwrap();
        assert_eq!(engine.run(&Query::new()).unwrap().len(), 10);
    }

    #[test]
    fn test_engine_over_trait_object() {
        let repo: Arc<dyn RecordStore> = Arc::new(Repository::new());
        repo.append(fixture()).unwrap();
        let engine = QueryEngine::new(repo);
        assert_eq!(engine.run(&Query::new()).unwrap().len(), 5);
    }
}
