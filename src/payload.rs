//! Wire payload for published readings.
//!
//! The JSON topic carries exactly two keys, both rounded to one decimal:
//!
//! ```json
//! {"temperature_celsius": 23.5, "humidity_percent": 55.0}
//! ```

use crate::sensor::Reading;
use serde::{Deserialize, Serialize};

/// One published reading, rounded for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
}

impl TelemetryPayload {
    /// Derive the wire payload from a validated reading.
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            temperature_celsius: round_to_tenth(reading.temperature_celsius()),
            humidity_percent: round_to_tenth(reading.humidity_percent()),
        }
    }

    /// Serialize to the UTF-8 JSON published on the data topic.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Bare one-decimal string carried by the per-metric topics.
pub fn metric_string(value: f64) -> String {
    format!("{value:.1}")
}
