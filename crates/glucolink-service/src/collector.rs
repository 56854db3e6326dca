//! Background ingestion from LibreLinkUp into the store.
//!
//! Each cycle fetches the connections snapshot, normalizes the current reading
//! and saves it together with the sensor, target and device snapshots. The
//! first successful cycle optionally backfills roughly twelve hours of history
//! from the graph endpoint.
//!
//! Failures are logged and the cycle is skipped. An authentication failure
//! drops the session so the next cycle logs in again.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use glucolink_core::{AuthSession, LinkUpClient};
use glucolink_core::wire::{ConnectionsResponse, GraphResponse};
use glucolink_store::SharedStore;
use glucolink_types::{
    DeviceInfo, GlucoseTargets, GraphSnapshot, Measurement, PayloadError, SensorConfig,
    UserPreferences,
};

use crate::config::{AccountConfig, CollectorConfig};
use crate::state::{HealthState, HealthStatus, StatusProducer};

/// Number of poll intervals after which data counts as stale.
pub const STALE_AFTER_INTERVALS: u32 = 3;

/// Running totals for the collector.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectorStats {
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_success: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_failure: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u32,
    /// New measurements written (duplicates excluded).
    pub measurements_saved: u64,
}

impl CollectorStats {
    fn record_success(&mut self, saved: usize, now: OffsetDateTime) {
        self.last_success = Some(now);
        self.success_count += 1;
        self.consecutive_failures = 0;
        self.measurements_saved += saved as u64;
    }

    fn record_failure(&mut self, error: &CollectorError, now: OffsetDateTime) {
        self.last_failure = Some(now);
        self.last_error = Some(error.to_string());
        self.failure_count += 1;
        self.consecutive_failures += 1;
    }
}

/// Classify freshness from the last successful fetch.
///
/// Healthy within [`STALE_AFTER_INTERVALS`] poll intervals, degraded after
/// that, unhealthy if nothing ever succeeded.
pub fn health_state(
    stats: &CollectorStats,
    poll_interval: Duration,
    now: OffsetDateTime,
) -> HealthState {
    let Some(last_success) = stats.last_success else {
        return HealthState::Unhealthy;
    };

    let stale_after = time::Duration::try_from(poll_interval * STALE_AFTER_INTERVALS)
        .unwrap_or(time::Duration::MAX);

    if now - last_success <= stale_after {
        HealthState::Healthy
    } else {
        HealthState::Degraded
    }
}

/// Collector errors.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("API request failed: {0}")]
    Api(#[from] glucolink_core::Error),
    #[error("Unusable payload: {0}")]
    Payload(#[from] PayloadError),
    #[error("Failed to store: {0}")]
    Store(#[from] glucolink_store::Error),
}

impl CollectorError {
    /// The account has no patient connection.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, CollectorError::Payload(e) if e.is_empty_result())
    }
}

/// Polls LibreLinkUp and writes into the store.
pub struct Collector {
    client: LinkUpClient,
    store: SharedStore,
    account: AccountConfig,
    poll_interval: Duration,
    backfill_pending: bool,
    session: Option<AuthSession>,
    stats: Arc<RwLock<CollectorStats>>,
}

impl Collector {
    pub fn new(
        client: LinkUpClient,
        store: SharedStore,
        account: AccountConfig,
        config: &CollectorConfig,
    ) -> Self {
        Self {
            client,
            store,
            account,
            poll_interval: config.poll_interval(),
            backfill_pending: config.backfill,
            session: None,
            stats: Arc::new(RwLock::new(CollectorStats::default())),
        }
    }

    /// Snapshot of the running totals.
    pub fn stats(&self) -> CollectorStats {
        self.stats.read().clone()
    }

    /// Health callback backed by this collector's statistics.
    ///
    /// Stays valid after the collector has been moved into its task.
    pub fn status_producer(&self) -> StatusProducer {
        let stats = Arc::clone(&self.stats);
        let poll_interval = self.poll_interval;
        Arc::new(move || {
            let snapshot = stats.read().clone();
            let state = health_state(&snapshot, poll_interval, OffsetDateTime::now_utc());
            HealthStatus::new(state, Some(snapshot))
        })
    }

    /// Whether the graph history still has to be loaded.
    pub fn backfill_pending(&self) -> bool {
        self.backfill_pending
    }

    /// Poll until `cancel` fires.
    ///
    /// The first cycle runs immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            backfill = self.backfill_pending,
            "Starting collector"
        );

        let mut timer = interval(self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            match self.run_cycle(&cancel).await {
                Ok(saved) => debug!(saved, "Collection cycle complete"),
                Err(CollectorError::Api(e)) if cancel.is_cancelled() => {
                    debug!("Cycle aborted by shutdown: {}", e);
                    break;
                }
                Err(e) => self.log_failure(&e),
            }
        }

        info!("Collector stopped");
    }

    /// Run one fetch-normalize-store cycle and update the statistics.
    ///
    /// Returns the number of new measurements stored.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<usize, CollectorError> {
        let result = self.collect(cancel).await;
        let now = OffsetDateTime::now_utc();

        match &result {
            Ok(saved) => self.stats.write().record_success(*saved, now),
            Err(e) => {
                if matches!(e, CollectorError::Api(api) if api.is_auth()) {
                    warn!("Session rejected, will log in again next cycle");
                    self.session = None;
                }
                self.stats.write().record_failure(e, now);
            }
        }

        result
    }

    async fn collect(&mut self, cancel: &CancellationToken) -> Result<usize, CollectorError> {
        let (token, account_id) = {
            let session = self.ensure_session(cancel).await?;
            (session.token.clone(), session.account_id.clone())
        };

        let connections = self.client.connections(&token, &account_id, cancel).await?;
        let mut saved = self.store_connections(&connections)?;

        if self.backfill_pending {
            // store_connections succeeded, so there is at least one connection.
            if let Some(connection) = connections.data.first() {
                let graph = self
                    .client
                    .graph(&token, &account_id, &connection.patient_id, cancel)
                    .await?;
                saved += self.store_graph(&graph)?;
                self.backfill_pending = false;
            }
        }

        Ok(saved)
    }

    async fn ensure_session(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<&AuthSession, CollectorError> {
        let session = match self.session.take() {
            Some(session) if !session.is_expired(OffsetDateTime::now_utc()) => session,
            previous => {
                if previous.is_some() {
                    info!("Session expired, logging in again");
                }
                let session = self
                    .client
                    .authenticate(&self.account.email, &self.account.password, cancel)
                    .await?;
                info!(user_id = %session.user_id, "Logged in to LibreLinkUp");
                self.store
                    .save_user_preferences(UserPreferences::from(&session.user))?;
                session
            }
        };

        Ok(self.session.insert(session))
    }

    fn store_connections(&self, response: &ConnectionsResponse) -> Result<usize, CollectorError> {
        let connection = response.data.first().ok_or(PayloadError::EmptyResult)?;
        let measurement = Measurement::from_glucose_item(&connection.glucose_measurement)?;

        debug!(
            mg_dl = measurement.value_mg_dl,
            trend = measurement.trend_symbol(),
            "Current reading"
        );

        let saved = usize::from(self.store.save_measurement(measurement)?);

        self.store
            .save_glucose_targets(GlucoseTargets::from(connection))?;
        if let Some(sensor) = &connection.sensor {
            self.store
                .save_sensor(SensorConfig::from_wire(sensor, OffsetDateTime::now_utc())?)?;
        }
        if let Some(device) = &connection.patient_device {
            self.store.save_device_info(DeviceInfo::from(device))?;
        }

        Ok(saved)
    }

    fn store_graph(&self, response: &GraphResponse) -> Result<usize, CollectorError> {
        let snapshot = GraphSnapshot::from_response(response)?;
        let detected_at = OffsetDateTime::now_utc();

        for active in &response.data.active_sensors {
            self.store
                .save_sensor(SensorConfig::from_wire(&active.sensor, detected_at)?)?;
        }
        if let Some(active) = response.data.active_sensors.last() {
            self.store.save_device_info(DeviceInfo::from(&active.device))?;
        }
        self.store.save_glucose_targets(snapshot.targets)?;

        let mut saved = 0;
        for measurement in snapshot.into_measurements() {
            if self.store.save_measurement(measurement)? {
                saved += 1;
            }
        }

        info!(saved, "Backfilled graph history");
        Ok(saved)
    }

    fn log_failure(&self, e: &CollectorError) {
        let failures = self.stats.read().consecutive_failures;

        if e.is_empty_result() {
            warn!("Account has no patient connection; nothing to collect");
        } else if failures <= 3 {
            warn!("Collection failed: {} (attempt {})", e, failures);
        } else if failures == 4 {
            error!(
                "Collection failed {} times in a row, will keep trying silently",
                failures
            );
        }
    }
}
