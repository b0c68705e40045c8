//! Range Checking for Sensor Readings

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use storage::SensorRecord;

/// Validation configuration.
///
/// Range checks are off unless `enabled` is set; every well-formed numeric
/// line is accepted by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject readings outside the ranges below
    pub enabled: bool,
    /// Temperature valid range (°C)
    pub temperature_range: (f64, f64),
    /// Rainfall valid range (mm)
    pub rainfall_range: (f64, f64),
    /// Relative humidity valid range (%)
    pub humidity_range: (f64, f64),
    /// Wind speed valid range (km/h)
    pub wind_speed_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            temperature_range: (-90.0, 60.0),
            rainfall_range: (0.0, 2000.0),
            humidity_range: (0.0, 100.0),
            wind_speed_range: (0.0, 500.0),
        }
    }
}

/// Range validator for parsed readings
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        line: u64,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), IngestError> {
        if value < range.0 || value > range.1 {
            Err(IngestError::OutOfRange {
                line,
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate every bounded column of a record
    pub fn validate_record(&self, line: u64, record: &SensorRecord) -> Result<(), IngestError> {
        if !self.config.enabled {
            return Ok(());
        }
        self.validate_range(line, "temperature", record.temperature, self.config.temperature_range)?;
        self.validate_range(line, "rainfall", record.rainfall, self.config.rainfall_range)?;
        self.validate_range(line, "humidity", record.humidity, self.config.humidity_range)?;
        self.validate_range(line, "wind_speed", record.wind_speed, self.config.wind_speed_range)?;
        Ok(())
    }
}
