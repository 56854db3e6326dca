//! Measurement model and wire types for LibreLinkUp glucose data.
//!
//! This crate provides the types shared by the API client (glucolink-core),
//! the storage layer (glucolink-store) and the service (glucolink-service).
//!
//! # Features
//!
//! - Vendor timestamp parsing (`M/D/YYYY h:mm:ss AM|PM`)
//! - The canonical [`Measurement`] record and its trend/status enums
//! - Configuration snapshots: sensor, reader device, user preferences, targets
//! - Transfer structures for the LibreLinkUp JSON API
//! - Terminal presentation (trend glyphs, status colors via owo-colors)
//!
//! # Example
//!
//! ```
//! use glucolink_types::{build_from_connections_payload, PayloadError};
//!
//! match build_from_connections_payload(br#"{"data": []}"#) {
//!     Ok(m) => println!("{}", m.render()),
//!     Err(PayloadError::EmptyResult) => println!("no patient connected"),
//!     Err(e) => eprintln!("bad payload: {e}"),
//! }
//! ```

pub mod error;
pub mod payload;
pub mod presentation;
pub mod timestamp;
pub mod types;
pub mod wire;

pub use error::{ParseError, ParseResult, PayloadError, PayloadResult};
pub use payload::{
    GraphSnapshot, build_from_connections_payload, build_from_graph_payload, current_measurement,
};
pub use timestamp::{parse_timestamp, parse_timestamp_trusted};
pub use types::{
    DeviceInfo, GlucoseTargets, GlucoseUnit, MG_DL_PER_MMOL, Measurement, RecordKind,
    SensorConfig, StatusColor, TrendArrow, UserPreferences,
};
