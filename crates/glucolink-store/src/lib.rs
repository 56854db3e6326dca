//! Concurrent storage for glucose measurements and configuration snapshots.
//!
//! This crate provides the [`MeasurementStore`] capability and an in-memory
//! implementation, [`MemoryStore`].
//!
//! # Features
//!
//! - Dedup on measurement timestamp (first write wins)
//! - Latest-value and inclusive time-range queries
//! - Sensor upsert keyed by serial number
//! - Replace-on-write snapshots for device info, user preferences and targets
//! - Safe for any number of concurrent readers and writers
//!
//! # Example
//!
//! ```
//! use glucolink_store::{MeasurementStore, MemoryStore};
//! use glucolink_types::build_from_connections_payload;
//!
//! let store = MemoryStore::new();
//! let raw = br#"{"data": [{"patientId": "p1", "glucoseMeasurement": {
//!     "FactoryTimestamp": "1/1/2026 1:52:27 PM", "Timestamp": "1/1/2026 2:52:27 PM",
//!     "ValueInMgPerDl": 115, "Value": 115, "GlucoseUnits": 1}}]}"#;
//!
//! let measurement = build_from_connections_payload(raw).unwrap();
//! store.save_measurement(measurement)?;
//!
//! let latest = store.get_latest_measurement()?;
//! assert_eq!(latest.value_mg_dl, 115);
//! # Ok::<(), glucolink_store::Error>(())
//! ```

mod error;
mod memory;
mod traits;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use traits::{MeasurementStore, SharedStore};
