//! DHT22 → MQTT telemetry bridge.
//!
//! Samples a DHT22 temperature/humidity sensor on a Raspberry Pi GPIO pin
//! at a fixed interval, validates and rounds each reading, and publishes it
//! as JSON to an MQTT broker:
//!
//! ```json
//! {"temperature_celsius": 23.5, "humidity_percent": 55.0}
//! ```
//!
//! The broker connection is established once; a background task owns all
//! network I/O while the poll loop stays sequential. Transient sensor
//! faults and publish failures are contained within their cycle - only an
//! interrupt signal ends the process, through a single teardown path.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use dht_bridge::config::BridgeConfig;
//! use dht_bridge::sensor::Dht22Sensor;
//! use dht_bridge::transport::{mqtt::MqttPublisher, Publisher};
//! use dht_bridge::Bridge;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::load_from_file("bridge.toml".as_ref())?;
//!
//! let sensor = Dht22Sensor::new(config.sensor.gpio_pin);
//! let mut publisher = MqttPublisher::new("dht-bridge", &config.mqtt)?;
//! publisher.connect().await?;
//!
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let mut bridge = Bridge::new(sensor, publisher, &config);
//! bridge.run(shutdown_rx).await;
//! bridge.shutdown().await?;
//! # drop(shutdown_tx);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod payload;
pub mod sensor;
pub mod testing;
pub mod transport;

pub use bridge::{Bridge, CycleOutcome};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use payload::TelemetryPayload;
pub use sensor::{Reading, SensorError};
pub use transport::mqtt::MqttPublisher;
