//! Transport layer for broker communication.
//!
//! The `Publisher` trait abstracts the broker session so the poll loop can
//! be driven against a mock in tests. The production implementation is MQTT.

use crate::payload::TelemetryPayload;

pub mod mqtt;

/// Measurement kinds carried by the reserved per-metric topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
}

/// Trait for the broker session owned by the bridge.
///
/// Publishes are best-effort: a currently-down connection must not surface
/// as an error that outlives the poll cycle, and no call here may block
/// waiting for broker acknowledgment.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start the broker session. Returns once the background I/O task is
    /// running; the eventual connect result is observed on the state channel
    /// and logged, never awaited here.
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Stop the background I/O task and disconnect. Called exactly once,
    /// after the poll loop has exited.
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Queue the combined JSON payload on the data topic.
    async fn publish_reading(&self, payload: &TelemetryPayload) -> Result<(), Self::Error>;

    /// Queue a single measurement as a bare one-decimal string on its
    /// reserved topic.
    async fn publish_metric(&self, metric: Metric, value: f64) -> Result<(), Self::Error>;

    /// Current session state, if the session has been started.
    fn connection_state(&self) -> Option<mqtt::ConnectionState>;

    fn is_connected(&self) -> bool {
        matches!(self.connection_state(), Some(mqtt::ConnectionState::Connected))
    }
}
