//! Fixed-interval poll loop composing the sensor reader and publisher
//! session.
//!
//! Each cycle reads the sensor once, rounds both measurements to one
//! decimal, and queues the JSON payload for publishing. Sensor and publish
//! failures are contained within the cycle: they are logged and the loop
//! sleeps until the next scheduled read. Only the shutdown flag ends the
//! loop.

use crate::config::BridgeConfig;
use crate::payload::TelemetryPayload;
use crate::sensor::SensorReader;
use crate::transport::{Metric, Publisher};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Outcome of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Reading acquired and queued for publishing.
    Published,
    /// Sensor read failed or was incomplete; nothing published.
    SkippedSensorError,
    /// Reading acquired but the publish could not be queued.
    SkippedPublishError,
}

/// The poll loop with its two injected collaborators.
pub struct Bridge<S, P> {
    sensor: S,
    publisher: P,
    interval: Duration,
    per_metric_topics: bool,
}

impl<S, P> Bridge<S, P>
where
    S: SensorReader,
    P: Publisher,
{
    pub fn new(sensor: S, publisher: P, config: &BridgeConfig) -> Self {
        Self {
            sensor,
            publisher,
            interval: config.poll_interval(),
            per_metric_topics: config.mqtt.per_metric_topics,
        }
    }

    /// Run cycles until the shutdown flag flips.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "poll loop started"
        );

        while !*shutdown.borrow() {
            self.cycle().await;
            if !Self::interruptible_sleep(&mut shutdown, self.interval).await {
                break;
            }
        }

        info!("poll loop stopped");
    }

    /// One Idle → Reading → Publishing pass. Every failure is contained
    /// here; the caller only decides when the next cycle starts.
    pub async fn cycle(&mut self) -> CycleOutcome {
        let reading = match self.sensor.read().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, "sensor read failed, skipping cycle");
                return CycleOutcome::SkippedSensorError;
            }
        };

        info!(
            "Temp={:.1}°C  {:.1}°F    Humidity={:.1}%",
            reading.temperature_celsius(),
            reading.temperature_fahrenheit(),
            reading.humidity_percent(),
        );

        let payload = TelemetryPayload::from_reading(&reading);
        if let Err(e) = self.publisher.publish_reading(&payload).await {
            warn!(error = %e, "telemetry publish failed, skipping cycle");
            return CycleOutcome::SkippedPublishError;
        }

        if self.per_metric_topics {
            if let Err(e) = self
                .publisher
                .publish_metric(Metric::Temperature, payload.temperature_celsius)
                .await
            {
                warn!(error = %e, "temperature publish failed");
            }
            if let Err(e) = self
                .publisher
                .publish_metric(Metric::Humidity, payload.humidity_percent)
                .await
            {
                warn!(error = %e, "humidity publish failed");
            }
        }

        CycleOutcome::Published
    }

    /// Sleep for the poll interval, waking early on shutdown.
    /// Returns false when shutdown was requested (or the channel closed).
    async fn interruptible_sleep(shutdown: &mut watch::Receiver<bool>, interval: Duration) -> bool {
        tokio::select! {
            changed = shutdown.changed() => changed.is_ok() && !*shutdown.borrow(),
            _ = tokio::time::sleep(interval) => true,
        }
    }

    /// Tear down the publisher session; invoked exactly once after the loop
    /// has exited. The sensor pin binding is released when `self` drops.
    pub async fn shutdown(mut self) -> Result<(), P::Error> {
        info!("disconnecting from MQTT broker...");
        self.publisher.disconnect().await
    }
}
