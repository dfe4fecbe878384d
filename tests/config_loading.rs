//! Configuration loading from TOML files on disk.

use dht_bridge::config::{BridgeConfig, ConfigError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_minimal_file_applies_defaults() {
    let file = write_config(
        r#"
        [mqtt]
        broker_url = "mqtt://10.4.137.107:1883"
    "#,
    );

    let config = BridgeConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.sensor.gpio_pin, 21);
    assert_eq!(config.mqtt.keepalive_secs, 60);
    assert_eq!(config.mqtt.topic_prefix, "raspberry/dht22");
    assert_eq!(config.poll.interval_secs, 5);
}

#[test]
fn test_load_full_file() {
    let file = write_config(
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
    );

    let config = BridgeConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.sensor.gpio_pin, 4);
    assert_eq!(config.mqtt.username_env.as_deref(), Some("MQTT_USER"));
    assert!(config.mqtt.per_metric_topics);
    assert_eq!(config.poll.interval_secs, 10);
}

#[test]
fn test_missing_file_is_a_read_error() {
    let result = BridgeConfig::load_from_file("/nonexistent/bridge.toml".as_ref());
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let file = write_config("[mqtt\nbroker_url = ");
    let result = BridgeConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_bad_broker_scheme_fails_validation() {
    let file = write_config(
        r#"
        [mqtt]
        broker_url = "http://broker:1883"
    "#,
    );

    let result = BridgeConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_zero_poll_interval_fails_validation() {
    let file = write_config(
        r#"
        [mqtt]
        broker_url = "mqtt://localhost"

        [poll]
        interval_secs = 0
    "#,
    );

    let result = BridgeConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}
