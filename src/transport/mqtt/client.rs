//! Broker session lifecycle and background I/O for the MQTT publisher.
//!
//! `connect()` spawns the event-loop task and returns without waiting for
//! CONNACK; the connect result is logged by the task and published on a
//! watch channel. All socket I/O, keepalive pings and reconnect attempts
//! happen on that task - the poll loop never touches the network directly.

use super::connection::{configure_mqtt_options, ConnectionState, MqttError, TopicSet};
use crate::config::MqttSection;
use crate::payload::{metric_string, TelemetryPayload};
use crate::transport::{Metric, Publisher};
use async_trait::async_trait;
use rumqttc::v5::mqttbytes::v5::{ConnectReturnCode, Packet};
use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::{AsyncClient, Event, EventLoop};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// MQTT publisher session for sensor telemetry.
///
/// The event loop sits behind a mutex until `connect()` moves it onto the
/// background task; `EventLoop` itself is not `Sync`, and the publisher must
/// be shareable across tasks.
pub struct MqttPublisher {
    client: AsyncClient,
    event_loop: Mutex<Option<EventLoop>>,
    topics: TopicSet,
    event_loop_handle: Option<JoinHandle<()>>,
    state_rx: Option<watch::Receiver<ConnectionState>>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl MqttPublisher {
    /// Build a session from config; nothing touches the network until
    /// `connect()`.
    pub fn new(device_id: &str, config: &MqttSection) -> Result<Self, MqttError> {
        let mqtt_options = configure_mqtt_options(device_id, config)?;
        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        Ok(Self {
            client,
            event_loop: Mutex::new(Some(event_loop)),
            topics: TopicSet::new(&config.topic_prefix),
            event_loop_handle: None,
            state_rx: None,
            shutdown_tx: None,
        })
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    /// Watch the session state; the initial connect result shows up here.
    pub fn state_watch(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.state_rx.clone()
    }

    /// Next state after a CONNACK with the given return code.
    fn state_for_connack(code: &ConnectReturnCode) -> ConnectionState {
        match code {
            ConnectReturnCode::Success => ConnectionState::Connected,
            other => ConnectionState::Disconnected(format!("connect refused: {other:?}")),
        }
    }

    fn handle_incoming(packet: &Packet, state_tx: &watch::Sender<ConnectionState>) {
        match packet {
            Packet::ConnAck(ack) => {
                match ack.code {
                    ConnectReturnCode::Success => info!("connected to MQTT broker"),
                    code => error!(?code, "broker refused connection"),
                }
                let _ = state_tx.send(Self::state_for_connack(&ack.code));
            }
            Packet::Disconnect(_) => {
                warn!("broker closed the connection");
                let _ = state_tx.send(ConnectionState::Disconnected(
                    "disconnected by broker".to_string(),
                ));
            }
            other => {
                debug!(target: "mqtt_transport", "MQTT event: {other:?}");
            }
        }
    }

    fn queue_publish(&self, topic: String, body: Vec<u8>) -> Result<(), MqttError> {
        // QoS 0, fire-and-forget. try_publish never waits on the bounded
        // request channel: with the broker down long enough to fill it, the
        // publish fails here and the caller skips the cycle instead of
        // suspending the poll loop.
        self.client
            .try_publish(&topic, QoS::AtMostOnce, false, body)
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))?;
        debug!(target: "mqtt_transport", topic = %topic, "queued publish");
        Ok(())
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    type Error = MqttError;

    async fn connect(&mut self) -> Result<(), MqttError> {
        let mut event_loop = self
            .event_loop
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(MqttError::AlreadyStarted)?;

        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        self.state_rx = Some(state_rx);
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            info!("MQTT event loop started");
            loop {
                tokio::select! {
                    // Shutdown signal takes priority over event processing
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("shutdown signal received, stopping MQTT event loop");
                            break;
                        }
                    }
                    event = event_loop.poll() => {
                        match event {
                            Ok(Event::Incoming(packet)) => {
                                Self::handle_incoming(&packet, &state_tx);
                            }
                            Ok(Event::Outgoing(_)) => {}
                            Err(e) => {
                                warn!(error = %e, "MQTT connection error, client will retry");
                                let _ = state_tx.send(
                                    ConnectionState::Disconnected(e.to_string()),
                                );
                                // Damp the retry rate; the next poll re-dials.
                                tokio::time::sleep(Duration::from_secs(1)).await;
                            }
                        }
                    }
                }
            }
            info!("MQTT event loop stopped");
        });

        self.event_loop_handle = Some(handle);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), MqttError> {
        // Best-effort DISCONNECT packet. A full or closed request channel
        // means the session is already down; waiting on it here could hang
        // after the event loop has stopped draining.
        if let Err(e) = self.client.try_disconnect() {
            debug!(target: "mqtt_transport", error = %e, "disconnect request not queued");
        }

        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }

        if let Some(handle) = self.event_loop_handle.take() {
            match tokio::time::timeout(Duration::from_secs(2), handle).await {
                Ok(Ok(())) => info!("MQTT event loop shut down cleanly"),
                Ok(Err(e)) if !e.is_cancelled() => {
                    warn!(error = %e, "MQTT event loop ended with error");
                }
                Err(_) => warn!("MQTT event loop did not stop in time"),
                _ => {}
            }
        }

        info!("disconnected from MQTT broker");
        Ok(())
    }

    async fn publish_reading(&self, payload: &TelemetryPayload) -> Result<(), MqttError> {
        let body = serde_json::to_vec(payload)?;
        self.queue_publish(self.topics.data(), body)
    }

    async fn publish_metric(&self, metric: Metric, value: f64) -> Result<(), MqttError> {
        let topic = match metric {
            Metric::Temperature => self.topics.temperature(),
            Metric::Humidity => self.topics.humidity(),
        };
        self.queue_publish(topic, metric_string(value).into_bytes())
    }

    fn connection_state(&self) -> Option<ConnectionState> {
        self.state_rx.as_ref().map(|rx| rx.borrow().clone())
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        // Stop the background task if disconnect() was never called.
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_mqtt_config() -> MqttSection {
        MqttSection {
            broker_url: "mqtt://localhost:1883".to_string(),
            username_env: None,
            password_env: None,
            keepalive_secs: 60,
            topic_prefix: "raspberry/dht22".to_string(),
            per_metric_topics: false,
        }
    }

    #[test]
    fn test_state_for_connack_success() {
        assert_eq!(
            MqttPublisher::state_for_connack(&ConnectReturnCode::Success),
            ConnectionState::Connected
        );
    }

    #[test]
    fn test_state_for_connack_failure_carries_code() {
        let state = MqttPublisher::state_for_connack(&ConnectReturnCode::NotAuthorized);
        match state {
            ConnectionState::Disconnected(reason) => {
                assert!(reason.contains("NotAuthorized"), "got: {reason}");
            }
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[test]
    fn test_connection_state_before_connect() {
        let publisher = MqttPublisher::new("dht-bridge-test", &test_mqtt_config()).unwrap();
        assert!(publisher.connection_state().is_none());
        assert!(!publisher.is_connected());
    }

    #[tokio::test]
    async fn test_connect_is_nonblocking_and_single_use() {
        let mut publisher = MqttPublisher::new("dht-bridge-test", &test_mqtt_config()).unwrap();

        // Returns immediately even though no broker is listening
        publisher.connect().await.unwrap();
        assert!(publisher.connection_state().is_some());

        // Second start is rejected
        assert!(matches!(
            publisher.connect().await,
            Err(MqttError::AlreadyStarted)
        ));

        publisher.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_without_connect() {
        let mut publisher = MqttPublisher::new("dht-bridge-test", &test_mqtt_config()).unwrap();
        assert!(publisher.disconnect().await.is_ok());
    }

    #[test]
    fn test_publisher_is_shareable_across_tasks() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MqttPublisher>();
    }

    #[tokio::test]
    async fn test_publish_with_full_queue_fails_instead_of_blocking() {
        // No connect(), so nothing drains the request channel and it fills
        // after a handful of publishes, as during a long broker outage.
        let publisher = MqttPublisher::new("dht-bridge-test", &test_mqtt_config()).unwrap();
        let payload = TelemetryPayload {
            temperature_celsius: 23.5,
            humidity_percent: 55.0,
        };

        let attempts = async {
            for _ in 0..20 {
                if let Err(e) = publisher.publish_reading(&payload).await {
                    return Some(e);
                }
            }
            None
        };

        let first_error = tokio::time::timeout(Duration::from_secs(2), attempts)
            .await
            .expect("publish must return, not wait for queue capacity");
        assert!(matches!(first_error, Some(MqttError::PublishFailed(_))));
    }

    #[tokio::test]
    async fn test_disconnect_with_full_queue_does_not_hang() {
        let mut publisher = MqttPublisher::new("dht-bridge-test", &test_mqtt_config()).unwrap();
        for _ in 0..20 {
            let _ = publisher.publish_metric(Metric::Temperature, 21.0).await;
        }

        tokio::time::timeout(Duration::from_secs(2), publisher.disconnect())
            .await
            .expect("disconnect must return with a full request queue")
            .unwrap();
    }
}
