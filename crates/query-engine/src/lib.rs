//! Sensor Query Engine
//!
//! Filters, sorts and aggregates stored sensor records:
//! - Predicate evaluation (`eq`, `gte`, `gt`, `lte`, `lt`)
//! - Stable single-column sort
//! - SUM / AVG / MIN / MAX / COUNT reductions
//! - Request validation at the boundary

mod aggregator;
mod engine;
mod error;
mod predicate;
mod request;
mod sorter;

pub use aggregator::{aggregate, AggregateOp, AggregateRow, AggregateSpec, AggregateValue};
pub use engine::{execute, QueryEngine, QueryOutput};
pub use error::{QueryError, ValidationError};
pub use predicate::{matches_all, CompareOp, Condition, Operand};
pub use request::{AggregateRequest, Query, SearchRequest, SortRequest};
pub use sorter::{sort_records, SortOrder, SortSpec};
