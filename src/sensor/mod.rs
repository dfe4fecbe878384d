//! Sensor reading and validation.
//!
//! The `SensorReader` trait is the seam between the poll loop and the
//! hardware driver, so tests can script readings without a device attached.
//! The production implementation lives in [`dht22`].

use async_trait::async_trait;
use thiserror::Error;

pub mod dht22;

pub use dht22::Dht22Sensor;

/// A validated temperature/humidity pair.
///
/// Construction fails unless both fields are finite, so holding a `Reading`
/// means both measurements are present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    temperature_celsius: f64,
    humidity_percent: f64,
}

impl Reading {
    /// Build a reading, rejecting incomplete measurements.
    pub fn try_new(temperature_celsius: f64, humidity_percent: f64) -> Result<Self, SensorError> {
        if !temperature_celsius.is_finite() || !humidity_percent.is_finite() {
            return Err(SensorError::IncompleteReading);
        }
        Ok(Self {
            temperature_celsius,
            humidity_percent,
        })
    }

    pub fn temperature_celsius(&self) -> f64 {
        self.temperature_celsius
    }

    pub fn humidity_percent(&self) -> f64 {
        self.humidity_percent
    }

    /// Fahrenheit equivalent, for the status log line only.
    pub fn temperature_fahrenheit(&self) -> f64 {
        self.temperature_celsius * 9.0 / 5.0 + 32.0
    }
}

/// Per-read sensor faults.
///
/// All variants are transient: the caller logs them and waits for the next
/// scheduled cycle. None of them should end the process.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("checksum mismatch in sensor response")]
    Checksum,

    #[error("sensor did not respond in time")]
    Timeout,

    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("incomplete reading from sensor")]
    IncompleteReading,

    #[error("sensor read task failed: {0}")]
    Task(String),
}

/// Trait for acquiring one reading per poll cycle.
#[async_trait]
pub trait SensorReader: Send {
    /// Acquire and validate a single reading.
    async fn read(&mut self) -> Result<Reading, SensorError>;
}
