//! Reading - one accepted temperature/humidity sample

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an accepted reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    /// Parsed from a device line
    Device,
    /// Produced by the synthetic generator while no device is present
    Synthetic,
}

impl ReadingSource {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Synthetic => "synthetic",
        }
    }
}

/// Accepted sensor reading
///
/// Immutable once constructed. Temperature and humidity are always present;
/// derived fields are optional because not every device firmware reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature in °C
    pub temperature: f64,

    /// Relative humidity in %
    pub humidity: f64,

    /// Apparent temperature in °C
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_index: Option<f64>,

    /// Air quality in ppm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<f64>,

    /// Acceptance instant
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Create a reading stamped with the current time
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
            heat_index: None,
            air_quality: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_heat_index(mut self, heat_index: Option<f64>) -> Self {
        self.heat_index = heat_index;
        self
    }

    pub fn with_air_quality(mut self, air_quality: Option<f64>) -> Self {
        self.air_quality = air_quality;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Round to one decimal place, the precision the device reports
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
