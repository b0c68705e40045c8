//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::IngestError;
use query_engine::{QueryError, ValidationError};
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not logged in")]
    Unauthorized,

    /// Body could not be decoded
    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Validation(e) => ApiError::Validation(e),
            QueryError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::Ingest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::BadRequest("eof".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ValidationError::UnknownField("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(IngestError::EmptyInput).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(StorageError::DatabaseError("poisoned".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_query_error_maps_to_validation() {
        let err = ApiError::from(QueryError::Validation(ValidationError::EmptyClause("humidity".into())));
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), "Empty clause for field humidity");
    }
}
