//! Process-level error type for the bridge.
//!
//! Only the startup and shutdown paths surface these; per-cycle sensor and
//! publish failures are logged and contained inside the poll loop.

use thiserror::Error;

/// Errors that can end the process.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("sensor error: {0}")]
    Sensor(#[from] crate::sensor::SensorError),

    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::mqtt::MqttError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
