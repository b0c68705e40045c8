//! Sensor Routes

use axum::{body::Bytes, extract::State, Json};
use query_engine::{Query, QueryOutput};
use serde::Serialize;
use std::time::Instant;
use storage::RecordStore;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::SharedState;

/// Response for the upload endpoint
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Records added by this upload
    pub ingested: usize,
    /// Records stored after the upload
    pub total: usize,
}

/// Ingest a CSV body. Either every line is stored or none is.
pub async fn upload(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<UploadResponse>, ApiError> {
    let records = state.ingestor.parse(&body)?;
    let ingested = state.store.append(records)?;
    let total = state.store.count();

    metrics::counter!("sensor_records_ingested_total").increment(ingested as u64);
    info!("Ingested {} records ({} stored)", ingested, total);

    Ok(Json(UploadResponse { ingested, total }))
}

/// Filter, sort and aggregate stored records
pub async fn search(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<QueryOutput>, ApiError> {
    let started = Instant::now();
    metrics::counter!("sensor_queries_total").increment(1);

    let result = Query::from_json(&body)
        .map_err(ApiError::from)
        .and_then(|query| state.engine.run(&query).map_err(ApiError::from));

    match result {
        Ok(output) => {
            metrics::histogram!("sensor_query_duration_seconds").record(started.elapsed().as_secs_f64());
            debug!("Search returned {} rows", output.len());
            Ok(Json(output))
        }
        Err(e) => {
            metrics::counter!("sensor_query_errors_total").increment(1);
            debug!("Search rejected: {}", e);
            Err(e)
        }
    }
}
