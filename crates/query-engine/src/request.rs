//! Query requests
//!
//! `SearchRequest` mirrors the JSON body accepted by the search endpoint.
//! It is validated into a [`Query`] before any record is read, so unknown
//! fields, operators and malformed clauses never reach execution.

use crate::aggregator::{AggregateOp, AggregateSpec};
use crate::error::ValidationError;
use crate::predicate::{CompareOp, Condition, Operand};
use crate::sorter::{SortOrder, SortSpec};
use serde::Deserialize;
use serde_json::{Map, Value};
use storage::Field;

/// Search request as it arrives on the wire
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchRequest {
    /// Field name to `{operator: threshold}` clause
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,
    #[serde(default)]
    pub sort: Option<SortRequest>,
    #[serde(default)]
    pub aggregate: Option<AggregateRequest>,
    /// Maximum number of records returned
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortRequest {
    pub column: String,
    /// Defaults to ascending
    #[serde(default)]
    pub order: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateRequest {
    pub column: String,
    pub operator: String,
}

/// Validated query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Condition>,
    pub sort: Option<SortSpec>,
    pub aggregate: Option<AggregateSpec>,
    pub limit: Option<usize>,
}

impl Query {
    /// Query returning every record in store order
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON request body
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let request: SearchRequest =
            serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::try_from(request)
    }

    pub fn with_filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_aggregate(mut self, aggregate: AggregateSpec) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl TryFrom<SearchRequest> for Query {
    type Error = ValidationError;

    fn try_from(request: SearchRequest) -> Result<Self, Self::Error> {
        let mut filters = Vec::new();
        if let Some(clauses) = request.filters {
            for (name, clause) in clauses {
                let field = parse_field(&name)?;
                parse_clause(field, clause, &mut filters)?;
            }
        }

        let sort = request
            .sort
            .map(|sort| {
                let field = parse_field(&sort.column)?;
                let order = match sort.order.as_deref() {
                    None => SortOrder::Ascending,
                    Some(order) => SortOrder::parse(order)
                        .ok_or_else(|| ValidationError::UnknownSortOrder(order.to_string()))?,
                };
                Ok::<_, ValidationError>(SortSpec { field, order })
            })
            .transpose()?;

        let aggregate = request
            .aggregate
            .map(|agg| {
                let field = parse_field(&agg.column)?;
                let op = AggregateOp::parse(&agg.operator)
                    .ok_or_else(|| ValidationError::UnknownAggregate(agg.operator.clone()))?;
                AggregateSpec::new(field, op)
            })
            .transpose()?;

        Ok(Query {
            filters,
            sort,
            aggregate,
            limit: request.limit,
        })
    }
}

fn parse_field(name: &str) -> Result<Field, ValidationError> {
    Field::from_name(name).ok_or_else(|| ValidationError::UnknownField(name.to_string()))
}

fn parse_clause(field: Field, clause: Value, out: &mut Vec<Condition>) -> Result<(), ValidationError> {
    let Value::Object(ops) = clause else {
        return Err(ValidationError::MalformedClause {
            field: field.name().to_string(),
            reason: "expected an object of operator to threshold".to_string(),
        });
    };

    if ops.is_empty() {
        return Err(ValidationError::EmptyClause(field.name().to_string()));
    }

    for (keyword, threshold) in ops {
        let op = CompareOp::from_keyword(&keyword).ok_or_else(|| ValidationError::UnknownOperator {
            field: field.name().to_string(),
            operator: keyword.clone(),
        })?;

        let operand = match threshold {
            Value::Number(n) => n.as_f64().map(Operand::Number),
            Value::String(s) => Some(Operand::Text(s)),
            _ => None,
        };
        let operand = operand.ok_or_else(|| ValidationError::MalformedClause {
            field: field.name().to_string(),
            reason: format!("threshold for `{}` must be a number or string", keyword),
        })?;

        out.push(Condition::new(field, op, operand)?);
    }

    Ok(())
}
