//! Repository Implementation

use crate::{SensorRecord, StorageError};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Immutable view of the store at one point in time
pub type Snapshot = Arc<Vec<SensorRecord>>;

/// Source of sensor records for the query engine
pub trait RecordStore: Send + Sync {
    /// Consistent view of every stored record, in ingestion order
    fn snapshot(&self) -> Result<Snapshot, StorageError>;

    /// Append a batch atomically, returning the number of records added
    fn append(&self, batch: Vec<SensorRecord>) -> Result<usize, StorageError>;

    /// Number of records currently stored
    fn count(&self) -> usize;
}

/// In-memory append-only repository.
///
/// Records are never removed. Readers clone the inner `Arc` and never block
/// writers for longer than the pointer copy. Writers copy the vector only
/// while a snapshot is still held elsewhere.
pub struct Repository {
    records: RwLock<Snapshot>,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            records: RwLock::new(Arc::new(Vec::new())),
        }
    }
}

impl RecordStore for Repository {
    fn snapshot(&self) -> Result<Snapshot, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        Ok(Arc::clone(&records))
    }

    fn append(&self, batch: Vec<SensorRecord>) -> Result<usize, StorageError> {
        let added = batch.len();
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        let log = Arc::make_mut(&mut records);
        log.extend(batch);

        debug!("Appended {} records ({} stored)", added, log.len());
        Ok(added)
    }

    fn count(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
