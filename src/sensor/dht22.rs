//! DHT22 sensor bound to a Raspberry Pi GPIO pin.
//!
//! Wraps the `dht22_pi` driver. The single-wire protocol is timing-critical
//! and blocking, so every read runs on the blocking thread pool rather than
//! an executor thread. Checksum and timing faults are expected occasionally
//! under normal operation and map to transient [`SensorError`] values.

use super::{Reading, SensorError, SensorReader};
use async_trait::async_trait;
use dht22_pi::ReadingError;

/// Production sensor reader over a fixed GPIO pin binding.
#[derive(Debug, Clone, Copy)]
pub struct Dht22Sensor {
    pin: u8,
}

impl Dht22Sensor {
    /// Bind to a BCM GPIO pin.
    pub fn new(pin: u8) -> Self {
        Self { pin }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

#[async_trait]
impl SensorReader for Dht22Sensor {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        let pin = self.pin;
        let result = tokio::task::spawn_blocking(move || dht22_pi::read(pin))
            .await
            .map_err(|e| SensorError::Task(e.to_string()))?;

        match result {
            Ok(raw) => Reading::try_new(f64::from(raw.temperature), f64::from(raw.humidity)),
            Err(ReadingError::Checksum) => Err(SensorError::Checksum),
            Err(ReadingError::Timeout) => Err(SensorError::Timeout),
            Err(ReadingError::Gpio(e)) => Err(SensorError::Gpio(format!("{e:?}"))),
        }
    }
}
