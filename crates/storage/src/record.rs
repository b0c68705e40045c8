//! Sensor Record Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single weather sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    /// Air temperature (°C)
    pub temperature: f64,
    /// Rainfall (mm)
    pub rainfall: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Wind speed (km/h)
    pub wind_speed: f64,
    /// Visibility code (e.g. M, G, VG, E)
    pub visibility: String,
}

impl SensorRecord {
    /// Read the value of a column
    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Timestamp => FieldValue::Number(self.timestamp as f64),
            Field::Temperature => FieldValue::Number(self.temperature),
            Field::Rainfall => FieldValue::Number(self.rainfall),
            Field::Humidity => FieldValue::Number(self.humidity),
            Field::WindSpeed => FieldValue::Number(self.wind_speed),
            Field::Visibility => FieldValue::Text(&self.visibility),
        }
    }
}

impl Default for SensorRecord {
    fn default() -> Self {
        Self {
            timestamp: 0,
            temperature: 0.0,
            rainfall: 0.0,
            humidity: 0.0,
            wind_speed: 0.0,
            visibility: String::new(),
        }
    }
}

/// Column of a sensor record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    Temperature,
    Rainfall,
    Humidity,
    WindSpeed,
    Visibility,
}

/// Whether a column holds numbers or category codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

impl Field {
    /// All columns, in CSV order
    pub const ALL: [Field; 6] = [
        Field::Timestamp,
        Field::Temperature,
        Field::Rainfall,
        Field::Humidity,
        Field::WindSpeed,
        Field::Visibility,
    ];

    /// Column name as it appears on the wire and in CSV headers
    pub fn name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Temperature => "temperature",
            Field::Rainfall => "rainfall",
            Field::Humidity => "humidity",
            Field::WindSpeed => "wind_speed",
            Field::Visibility => "visibility",
        }
    }

    /// Look up a column by name
    pub fn from_name(name: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Visibility => FieldKind::Categorical,
            _ => FieldKind::Numeric,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed value of one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl FieldValue<'_> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}
