//! Telemetry service: sensor reading and heartbeat ingestion and queries.

use greenhouse_domain::error::GreenhouseError;
use greenhouse_domain::heartbeat::Heartbeat;
use greenhouse_domain::query::QueryWindow;
use greenhouse_domain::reading::{ReadingInput, SensorReading};
use greenhouse_domain::time::now;

use crate::ports::BoundedLog;

/// Application service writing to and reading from the telemetry logs.
pub struct TelemetryService<R, H> {
    readings: R,
    heartbeats: H,
}

impl<R, H> TelemetryService<R, H>
where
    R: BoundedLog<SensorReading>,
    H: BoundedLog<Heartbeat>,
{
    /// Create a new service backed by the reading and heartbeat logs.
    pub fn new(readings: R, heartbeats: H) -> Self {
        Self {
            readings,
            heartbeats,
        }
    }

    /// Validate, normalize and store a submitted reading.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhouseError::Validation`] when a required field is
    /// missing or the reading is not numeric, or a storage error.
    #[tracing::instrument(skip(self, input))]
    pub async fn record_reading(
        &self,
        input: ReadingInput,
    ) -> Result<SensorReading, GreenhouseError> {
        let reading = SensorReading::from_input(input, now())
            .inspect_err(|err| tracing::warn!(%err, "rejected sensor reading"))?;
        let stored = self.readings.append(reading).await?;
        tracing::debug!(
            sensor = %stored.sensor.name,
            sensor_type = %stored.sensor.sensor_type,
            reading = stored.reading,
            "reading recorded"
        );
        Ok(stored)
    }

    /// Record a controller heartbeat.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the log.
    pub async fn record_heartbeat(&self) -> Result<Heartbeat, GreenhouseError> {
        self.heartbeats.append(Heartbeat::at(now())).await
    }

    /// Readings of one sensor type within `window`, by sensor name then
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the log.
    #[tracing::instrument(skip(self))]
    pub async fn query_readings(
        &self,
        sensor_type: &str,
        window: QueryWindow,
    ) -> Result<Vec<SensorReading>, GreenhouseError> {
        if window.is_inverted() {
            tracing::debug!("inverted window, nothing to query");
            return Ok(Vec::new());
        }
        self.readings.query(&sensor_type.to_string(), window).await
    }

    /// Heartbeats within `window`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the log.
    #[tracing::instrument(skip(self))]
    pub async fn query_heartbeats(
        &self,
        window: QueryWindow,
    ) -> Result<Vec<Heartbeat>, GreenhouseError> {
        if window.is_inverted() {
            return Ok(Vec::new());
        }
        self.heartbeats.query(&(), window).await
    }
}
