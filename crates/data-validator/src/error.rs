//! Ingestion Error Types

use thiserror::Error;

/// Errors while ingesting an uploaded CSV body
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Body contained no header line
    #[error("Upload is empty: expected a header line")]
    EmptyInput,

    /// Header does not name the expected columns in order
    #[error("Header mismatch: expected `{expected}`, got `{found}`")]
    HeaderMismatch { expected: String, found: String },

    /// Value could not be parsed
    #[error("Line {line}: invalid data format: {message}")]
    InvalidFormat { line: u64, message: String },

    /// Row has fewer columns than the header
    #[error("Line {line}: missing required field: {field}")]
    MissingField { line: u64, field: &'static str },

    /// Value out of allowed range
    #[error("Line {line}: {field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        line: u64,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
