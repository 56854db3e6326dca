//! In-memory store implementation.

use std::sync::Arc;

use parking_lot::RwLock;
use time::OffsetDateTime;
use tracing::debug;

use glucolink_types::{DeviceInfo, GlucoseTargets, Measurement, SensorConfig, UserPreferences};

use crate::error::{Error, Result};
use crate::traits::MeasurementStore;

/// Thread-safe in-memory store.
///
/// A single reader-writer lock guards all state: reads run concurrently,
/// writes are exclusive and hold the lock only for the in-memory mutation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    measurements: Vec<Arc<Measurement>>,
    sensors: Vec<Arc<SensorConfig>>,
    user_preferences: Option<Arc<UserPreferences>>,
    device_info: Option<Arc<DeviceInfo>>,
    glucose_targets: Option<Arc<GlucoseTargets>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored measurements.
    pub fn len(&self) -> usize {
        self.inner.read().measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().measurements.is_empty()
    }
}

impl MeasurementStore for MemoryStore {
    fn save_measurement(&self, measurement: Measurement) -> Result<bool> {
        let mut inner = self.inner.write();

        if inner
            .measurements
            .iter()
            .any(|m| m.timestamp == measurement.timestamp)
        {
            debug!(timestamp = %measurement.timestamp, "Skipping duplicate measurement");
            return Ok(false);
        }

        inner.measurements.push(Arc::new(measurement));
        Ok(true)
    }

    fn get_latest_measurement(&self) -> Result<Arc<Measurement>> {
        self.inner
            .read()
            .measurements
            .iter()
            .max_by_key(|m| m.timestamp)
            .cloned()
            .ok_or(Error::NotFound("measurement"))
    }

    fn get_all_measurements(&self) -> Result<Vec<Arc<Measurement>>> {
        Ok(self.inner.read().measurements.clone())
    }

    fn get_measurements_by_time_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Arc<Measurement>>> {
        Ok(self
            .inner
            .read()
            .measurements
            .iter()
            .filter(|m| m.timestamp >= start && m.timestamp <= end)
            .cloned()
            .collect())
    }

    fn save_sensor(&self, sensor: SensorConfig) -> Result<()> {
        if sensor.serial_number.is_empty() {
            return Err(Error::MissingArgument("sensor.serial_number"));
        }

        let mut inner = self.inner.write();
        let sensor = Arc::new(sensor);

        match inner
            .sensors
            .iter_mut()
            .find(|s| s.serial_number == sensor.serial_number)
        {
            Some(existing) => *existing = sensor,
            None => {
                debug!(serial = %sensor.serial_number, "New sensor");
                inner.sensors.push(sensor);
            }
        }
        Ok(())
    }

    fn get_active_sensor(&self) -> Result<Arc<SensorConfig>> {
        let inner = self.inner.read();
        inner
            .sensors
            .iter()
            .rev()
            .find(|s| s.is_active)
            .or_else(|| inner.sensors.last())
            .cloned()
            .ok_or(Error::NotFound("sensor"))
    }

    fn get_all_sensors(&self) -> Result<Vec<Arc<SensorConfig>>> {
        Ok(self.inner.read().sensors.clone())
    }

    fn save_user_preferences(&self, preferences: UserPreferences) -> Result<()> {
        self.inner.write().user_preferences = Some(Arc::new(preferences));
        Ok(())
    }

    fn get_user_preferences(&self) -> Result<Arc<UserPreferences>> {
        self.inner
            .read()
            .user_preferences
            .clone()
            .ok_or(Error::NotFound("user preferences"))
    }

    fn save_device_info(&self, info: DeviceInfo) -> Result<()> {
        self.inner.write().device_info = Some(Arc::new(info));
        Ok(())
    }

    fn get_device_info(&self) -> Result<Arc<DeviceInfo>> {
        self.inner
            .read()
            .device_info
            .clone()
            .ok_or(Error::NotFound("device info"))
    }

    fn save_glucose_targets(&self, targets: GlucoseTargets) -> Result<()> {
        self.inner.write().glucose_targets = Some(Arc::new(targets));
        Ok(())
    }

    fn get_glucose_targets(&self) -> Result<Arc<GlucoseTargets>> {
        self.inner
            .read()
            .glucose_targets
            .clone()
            .ok_or(Error::NotFound("glucose targets"))
    }
}
