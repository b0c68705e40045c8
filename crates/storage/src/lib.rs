//! Storage Layer
//!
//! Holds ingested sensor readings in memory and hands out consistent
//! snapshots to readers.

mod record;
mod repository;

pub use record::{Field, FieldKind, FieldValue, SensorRecord};
pub use repository::{RecordStore, Repository, Snapshot};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}
