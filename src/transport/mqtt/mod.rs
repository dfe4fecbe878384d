//! MQTT implementation of the publisher session.

mod client;
mod connection;

pub use client::MqttPublisher;
pub use connection::{configure_mqtt_options, ConnectionState, MqttError, TopicSet};
