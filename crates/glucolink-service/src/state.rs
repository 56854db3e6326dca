//! Application state shared across handlers.
//!
//! Handlers never talk to the collector directly. They read glucose data from
//! the shared store and ask a [`StatusProducer`] for the current health.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use glucolink_store::SharedStore;

use crate::collector::CollectorStats;

/// Zero-argument callback that reports service health.
pub type StatusProducer = Arc<dyn Fn() -> HealthStatus + Send + Sync>;

/// Shared application state.
pub struct AppState {
    /// Measurement store, also written by the collector.
    pub store: SharedStore,
    /// Health callback for `/api/health`.
    pub status: StatusProducer,
}

impl AppState {
    pub fn new(store: SharedStore, status: StatusProducer) -> Arc<Self> {
        Arc::new(Self { store, status })
    }
}

/// Coarse health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Fresh data is flowing.
    Healthy,
    /// Data was fetched before but is now stale.
    Degraded,
    /// No fetch has ever succeeded.
    Unhealthy,
}

/// Status value served by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Collector statistics, absent when the collector is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector: Option<CollectorStats>,
}

impl HealthStatus {
    pub fn new(status: HealthState, collector: Option<CollectorStats>) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: OffsetDateTime::now_utc(),
            collector,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }
}

/// Producer for API-only mode, where there is no collector to go stale.
pub fn always_healthy() -> StatusProducer {
    Arc::new(|| HealthStatus::new(HealthState::Healthy, None))
}
