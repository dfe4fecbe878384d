//! Configuration for the DHT22 → MQTT bridge.
//!
//! Loaded from a TOML file with `[sensor]`, `[mqtt]` and `[poll]` sections.
//! Broker credentials are referenced indirectly through environment variable
//! names so the file itself never carries secrets.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub sensor: SensorSection,
    pub mqtt: MqttSection,
    #[serde(default)]
    pub poll: PollSection,
}

/// Sensor wiring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorSection {
    /// BCM GPIO pin the DHT22 data line is wired to.
    #[serde(default = "default_gpio_pin")]
    pub gpio_pin: u8,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            gpio_pin: default_gpio_pin(),
        }
    }
}

fn default_gpio_pin() -> u8 {
    21
}

/// Broker connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// Broker URL with scheme and optional port (`mqtt://` or `mqtts://`).
    pub broker_url: String,
    /// Environment variable containing the username
    pub username_env: Option<String>,
    /// Environment variable containing the password
    pub password_env: Option<String>,
    /// Keepalive interval in seconds (default: 60)
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// Topic prefix for all published messages
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    /// Also publish each measurement on its own `{prefix}/temperature` and
    /// `{prefix}/humidity` topic (default: off, JSON topic only)
    #[serde(default)]
    pub per_metric_topics: bool,
}

fn default_keepalive_secs() -> u64 {
    60
}

fn default_topic_prefix() -> String {
    "raspberry/dht22".to_string()
}

/// Poll loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollSection {
    /// Seconds between sensor readings (default: 5)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

impl BridgeConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field consistency beyond what serde checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.mqtt.broker_url).map_err(|_| {
            ConfigError::InvalidConfig(format!("invalid broker URL: {}", self.mqtt.broker_url))
        })?;
        if url.scheme() != "mqtt" && url.scheme() != "mqtts" {
            return Err(ConfigError::InvalidConfig(format!(
                "broker URL scheme must be mqtt or mqtts, got {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidConfig(
                "broker URL has no host".to_string(),
            ));
        }
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "poll.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.mqtt.keepalive_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "mqtt.keepalive_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Interval between poll cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            [mqtt]
            broker_url = "mqtt://10.4.137.107:1883"
        "#
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: BridgeConfig = toml::from_str(minimal_toml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.sensor.gpio_pin, 21);
        assert_eq!(config.mqtt.keepalive_secs, 60);
        assert_eq!(config.mqtt.topic_prefix, "raspberry/dht22");
        assert!(!config.mqtt.per_metric_topics);
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_full_config_overrides() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [sensor]
            gpio_pin = 4

            [mqtt]
            broker_url = "mqtts://broker.example.com"
            username_env = "MQTT_USER"
            password_env = "MQTT_PASS"
            keepalive_secs = 30
            topic_prefix = "attic/dht22"
            per_metric_topics = true

            [poll]
            interval_secs = 10
        "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.sensor.gpio_pin, 4);
        assert_eq!(config.mqtt.keepalive_secs, 30);
        assert_eq!(config.mqtt.topic_prefix, "attic/dht22");
        assert!(config.mqtt.per_metric_topics);
        assert_eq!(config.poll.interval_secs, 10);
    }

    #[test]
    fn test_missing_broker_url_is_rejected() {
        let result: Result<BridgeConfig, _> = toml::from_str("[mqtt]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_broker_scheme_is_rejected() {
        let mut config: BridgeConfig = toml::from_str(minimal_toml()).unwrap();
        config.mqtt.broker_url = "http://broker:1883".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config: BridgeConfig = toml::from_str(minimal_toml()).unwrap();
        config.poll.interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }
}
