//! Mock sensor and publisher implementations.
//!
//! Enable driving the poll loop in tests without a wired sensor or a
//! running broker.

use crate::payload::{metric_string, TelemetryPayload};
use crate::sensor::{Reading, SensorError, SensorReader};
use crate::transport::mqtt::{ConnectionState, MqttError, TopicSet};
use crate::transport::{Metric, Publisher};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type PublishedMessage = (String, Vec<u8>);

/// Sensor that replays a scripted sequence of results.
///
/// Once the script is exhausted every further read times out, so tests that
/// over-run their script fail loudly instead of publishing surprises.
pub struct MockSensor {
    script: VecDeque<Result<Reading, SensorError>>,
}

impl MockSensor {
    pub fn new(script: Vec<Result<Reading, SensorError>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// Script of identical successful readings.
    pub fn repeating(reading: Reading, count: usize) -> Self {
        Self::new((0..count).map(|_| Ok(reading)).collect())
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl SensorReader for MockSensor {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        self.script.pop_front().unwrap_or(Err(SensorError::Timeout))
    }
}

/// Publisher that records every queued message.
#[derive(Debug, Clone)]
pub struct MockPublisher {
    pub published: Arc<Mutex<Vec<PublishedMessage>>>,
    pub connect_calls: Arc<Mutex<u32>>,
    pub disconnect_calls: Arc<Mutex<u32>>,
    pub should_fail: bool,
    topics: TopicSet,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            connect_calls: Arc::new(Mutex::new(0)),
            disconnect_calls: Arc::new(Mutex::new(0)),
            should_fail: false,
            topics: TopicSet::new("raspberry/dht22"),
        }
    }
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub async fn get_published(&self) -> Vec<PublishedMessage> {
        self.published.lock().await.clone()
    }

    pub async fn disconnect_count(&self) -> u32 {
        *self.disconnect_calls.lock().await
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    type Error = MqttError;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        *self.connect_calls.lock().await += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        *self.disconnect_calls.lock().await += 1;
        Ok(())
    }

    async fn publish_reading(&self, payload: &TelemetryPayload) -> Result<(), Self::Error> {
        if self.should_fail {
            return Err(MqttError::PublishFailed(
                "mock publish failure".to_string().into(),
            ));
        }
        let body = serde_json::to_vec(payload)?;
        self.published.lock().await.push((self.topics.data(), body));
        Ok(())
    }

    async fn publish_metric(&self, metric: Metric, value: f64) -> Result<(), Self::Error> {
        if self.should_fail {
            return Err(MqttError::PublishFailed(
                "mock publish failure".to_string().into(),
            ));
        }
        let topic = match metric {
            Metric::Temperature => self.topics.temperature(),
            Metric::Humidity => self.topics.humidity(),
        };
        self.published
            .lock()
            .await
            .push((topic, metric_string(value).into_bytes()));
        Ok(())
    }

    fn connection_state(&self) -> Option<ConnectionState> {
        Some(ConnectionState::Connected)
    }
}
