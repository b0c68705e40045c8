//! Query Error Types

use storage::StorageError;
use thiserror::Error;

/// Request rejected before any record is read
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Body is not a well-formed query request
    #[error("Malformed query: {0}")]
    Malformed(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown operator `{operator}` for field {field}")]
    UnknownOperator { field: String, operator: String },

    /// Clause is not a map of operator to threshold
    #[error("Malformed clause for field {field}: {reason}")]
    MalformedClause { field: String, reason: String },

    #[error("Empty clause for field {0}")]
    EmptyClause(String),

    /// Threshold type does not fit the field
    #[error("Operator `{operator}` on field {field} expects {expected}")]
    TypeMismatch {
        field: String,
        operator: String,
        expected: &'static str,
    },

    #[error("Unknown sort order: {0}")]
    UnknownSortOrder(String),

    #[error("Unknown aggregate operator: {0}")]
    UnknownAggregate(String),

    /// Operator exists but cannot reduce this field
    #[error("Aggregate {operator} is not supported on field {field}")]
    UnsupportedAggregate { field: String, operator: String },
}

/// Errors while executing a query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
