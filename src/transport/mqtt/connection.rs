//! Pure connection state, option and topic construction for the MQTT session.

use crate::config::MqttSection;
use rumqttc::v5::MqttOptions;
use rumqttc::Transport as RumqttcTransport;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Connection state for the broker session
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Initial state - attempting to connect
    Connecting,
    /// Successfully connected and ready for operations
    Connected,
    /// Disconnected with reason; the client keeps retrying in the background
    Disconnected(String),
}

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Session already started")]
    AlreadyStarted,
}

/// Build MQTT options from the config section.
pub fn configure_mqtt_options(
    device_id: &str,
    config: &MqttSection,
) -> Result<MqttOptions, MqttError> {
    // Parse broker URL to extract host and port
    let url = Url::parse(&config.broker_url)
        .map_err(|_| MqttError::InvalidBrokerUrl(config.broker_url.clone()))?;

    let host = url
        .host_str()
        .ok_or_else(|| MqttError::InvalidBrokerUrl(config.broker_url.clone()))?;
    let port = url
        .port()
        .unwrap_or(if url.scheme() == "mqtts" { 8883 } else { 1883 });

    // Unique client ID per connection attempt to prevent broker conflicts
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let client_id = format!("{device_id}-{timestamp}");
    let mut mqtt_options = MqttOptions::new(client_id, host, port);

    if url.scheme() == "mqtts" {
        mqtt_options.set_transport(RumqttcTransport::tls_with_default_config());
    }

    // Credentials come from the environment, never from the config file
    if let Some(username_env) = &config.username_env {
        if let Ok(username) = std::env::var(username_env) {
            let password = config
                .password_env
                .as_ref()
                .and_then(|env_name| std::env::var(env_name).ok())
                .unwrap_or_default();
            mqtt_options.set_credentials(&username, &password);
        }
    }

    mqtt_options.set_keep_alive(Duration::from_secs(config.keepalive_secs));

    Ok(mqtt_options)
}

/// Topic layout under a common prefix.
///
/// Only the data topic is emitted by default; the per-metric topics are
/// reserved extension points enabled with `mqtt.per_metric_topics`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSet {
    prefix: String,
}

impl TopicSet {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// Combined JSON topic: `{prefix}/data`
    pub fn data(&self) -> String {
        format!("{}/data", self.prefix)
    }

    /// Reserved per-metric topic: `{prefix}/temperature`
    pub fn temperature(&self) -> String {
        format!("{}/temperature", self.prefix)
    }

    /// Reserved per-metric topic: `{prefix}/humidity`
    pub fn humidity(&self) -> String {
        format!("{}/humidity", self.prefix)
    }
}
