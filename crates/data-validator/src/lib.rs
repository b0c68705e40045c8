//! Sensor Data Ingestion
//!
//! Parses uploaded CSV bodies into sensor records and range-checks every
//! reading before anything reaches the store.

mod error;
mod parser;
mod validator;

pub use error::IngestError;
pub use parser::{CsvIngestor, EXPECTED_HEADER};
pub use validator::{ValidationConfig, Validator};
