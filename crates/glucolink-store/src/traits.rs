//! Storage capability shared by every backend.
//!
//! This module provides the [`MeasurementStore`] trait so ingestion and query
//! code can be written once and run against the in-memory store today and a
//! durable backend later.

use std::sync::Arc;

use time::OffsetDateTime;

use glucolink_types::{DeviceInfo, GlucoseTargets, Measurement, SensorConfig, UserPreferences};

use crate::error::Result;

/// Repository of measurements and configuration snapshots.
///
/// Implementations must be safe to call from any number of threads at once.
/// A successful save is visible to every later read from any thread.
///
/// Individual records are returned as shared immutable views (`Arc`);
/// collections are returned as fresh `Vec`s that callers may modify freely
/// without touching stored state.
///
/// # Example
///
/// ```
/// use glucolink_store::{MeasurementStore, MemoryStore};
///
/// fn latest_mg_dl(store: &dyn MeasurementStore) -> Option<i32> {
///     store.get_latest_measurement().ok().map(|m| m.value_mg_dl)
/// }
///
/// assert_eq!(latest_mg_dl(&MemoryStore::new()), None);
/// ```
pub trait MeasurementStore: Send + Sync {
    // --- Measurements ---

    /// Save a measurement unless one with the same `timestamp` exists.
    ///
    /// Returns `true` if the measurement was stored and `false` if it was a
    /// duplicate. The first write for a timestamp wins.
    fn save_measurement(&self, measurement: Measurement) -> Result<bool>;

    /// The measurement with the greatest `timestamp`.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) when empty.
    fn get_latest_measurement(&self) -> Result<Arc<Measurement>>;

    /// Copy of every stored measurement, in storage order.
    fn get_all_measurements(&self) -> Result<Vec<Arc<Measurement>>>;

    /// Measurements with `start <= timestamp <= end`, in storage order.
    fn get_measurements_by_time_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Arc<Measurement>>>;

    /// Copy of every stored measurement, oldest first.
    fn get_all_measurements_sorted(&self) -> Result<Vec<Arc<Measurement>>> {
        let mut measurements = self.get_all_measurements()?;
        measurements.sort_by_key(|m| m.timestamp);
        Ok(measurements)
    }

    // --- Sensors ---

    /// Insert or replace the sensor with the same serial number.
    fn save_sensor(&self, sensor: SensorConfig) -> Result<()>;

    /// The active sensor, or the most recently added one if none is active.
    fn get_active_sensor(&self) -> Result<Arc<SensorConfig>>;

    /// Copy of every known sensor.
    fn get_all_sensors(&self) -> Result<Vec<Arc<SensorConfig>>>;

    // --- Singleton snapshots ---

    fn save_user_preferences(&self, preferences: UserPreferences) -> Result<()>;
    fn get_user_preferences(&self) -> Result<Arc<UserPreferences>>;

    fn save_device_info(&self, info: DeviceInfo) -> Result<()>;
    fn get_device_info(&self) -> Result<Arc<DeviceInfo>>;

    fn save_glucose_targets(&self, targets: GlucoseTargets) -> Result<()>;
    fn get_glucose_targets(&self) -> Result<Arc<GlucoseTargets>>;
}

/// Type alias for a store shared across tasks.
pub type SharedStore = Arc<dyn MeasurementStore>;
