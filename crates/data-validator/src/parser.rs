//! CSV Upload Parser

use crate::error::IngestError;
use crate::validator::Validator;
use csv::{ReaderBuilder, StringRecord, Trim};
use storage::{Field, SensorRecord};
use tracing::{debug, warn};

/// Header every upload must start with
pub const EXPECTED_HEADER: &str = "timestamp,temperature,rainfall,humidity,wind_speed,visibility";

/// Turns an uploaded CSV body into validated sensor records.
///
/// The whole body is parsed before anything is returned, so a single bad
/// line rejects the upload.
#[derive(Debug, Clone, Default)]
pub struct CsvIngestor {
    validator: Validator,
}

impl CsvIngestor {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Parse and validate every data line of `body`
    pub fn parse(&self, body: &str) -> Result<Vec<SensorRecord>, IngestError> {
        if body.trim().is_empty() {
            return Err(IngestError::EmptyInput);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(body.as_bytes());

        let header = reader.headers().map_err(|e| IngestError::InvalidFormat {
            line: 1,
            message: e.to_string(),
        })?;
        check_header(header)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| IngestError::InvalidFormat {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;
            if row.iter().all(str::is_empty) {
                continue;
            }

            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let record = parse_row(line, &row)?;
            self.validator.validate_record(line, &record)?;
            records.push(record);
        }

        debug!("Parsed {} records from upload", records.len());
        Ok(records)
    }
}

fn check_header(header: &StringRecord) -> Result<(), IngestError> {
    let found = header.iter().collect::<Vec<_>>().join(",");
    if found != EXPECTED_HEADER {
        warn!("Rejected upload with header `{}`", found);
        return Err(IngestError::HeaderMismatch {
            expected: EXPECTED_HEADER.to_string(),
            found,
        });
    }
    Ok(())
}

fn parse_row(line: u64, row: &StringRecord) -> Result<SensorRecord, IngestError> {
    if row.len() > Field::ALL.len() {
        return Err(IngestError::InvalidFormat {
            line,
            message: format!("expected {} columns, got {}", Field::ALL.len(), row.len()),
        });
    }

    let timestamp = column(line, row, Field::Timestamp)?;
    let timestamp = timestamp.parse::<i64>().map_err(|e| IngestError::InvalidFormat {
        line,
        message: format!("timestamp `{}`: {}", timestamp, e),
    })?;
    let temperature = number(line, row, Field::Temperature)?;
    let rainfall = number(line, row, Field::Rainfall)?;
    let humidity = number(line, row, Field::Humidity)?;
    let wind_speed = number(line, row, Field::WindSpeed)?;

    let visibility = column(line, row, Field::Visibility)?;
    if visibility.is_empty() {
        return Err(IngestError::MissingField {
            line,
            field: Field::Visibility.name(),
        });
    }

    Ok(SensorRecord {
        timestamp,
        temperature,
        rainfall,
        humidity,
        wind_speed,
        visibility: visibility.to_string(),
    })
}

fn column<'r>(line: u64, row: &'r StringRecord, field: Field) -> Result<&'r str, IngestError> {
    let index = Field::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or(Field::ALL.len());
    row.get(index).ok_or(IngestError::MissingField {
        line,
        field: field.name(),
    })
}

fn number(line: u64, row: &StringRecord, field: Field) -> Result<f64, IngestError> {
    let raw = column(line, row, field)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(IngestError::InvalidFormat {
            line,
            message: format!("{} `{}` is not a finite number", field, raw),
        }),
        Err(e) => Err(IngestError::InvalidFormat {
            line,
            message: format!("{} `{}`: {}", field, raw, e),
        }),
    }
}
