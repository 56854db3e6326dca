//! Background LibreLinkUp collector and glucose status API.
//!
//! This crate provides a service that:
//! - Logs in to LibreLinkUp and polls the current reading on a schedule
//! - Backfills about twelve hours of history on startup
//! - Keeps readings, sensor and target snapshots in a shared store
//! - Exposes a small REST API over the stored data
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Collector health (200 healthy, 503 otherwise)
//! - `GET /api/glucose/latest` - Latest reading with trend symbol
//! - `GET /api/glucose?from=&to=` - Readings in an RFC 3339 range
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/glucolink/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [api]
//! base_url = "https://api-eu.libreview.io"
//! timeout_secs = 30
//!
//! [account]
//! email = "me@example.com"
//! password = "..."
//!
//! [collector]
//! poll_interval = 60
//! backfill = true
//! ```
//!
//! Credentials can also come from `GLUCOLINK_EMAIL` and `GLUCOLINK_PASSWORD`.

pub mod api;
pub mod collector;
pub mod config;
pub mod state;

pub use collector::{Collector, CollectorError, CollectorStats};
pub use config::{
    AccountConfig, ApiConfig, CollectorConfig, Config, ConfigError, ServerConfig, ValidationError,
};
pub use state::{AppState, HealthState, HealthStatus, StatusProducer};
