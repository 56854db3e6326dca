//! REST API endpoints for the glucolink service.
//!
//! - `GET /api/health`: status from the [`StatusProducer`](crate::state::StatusProducer).
//!   200 when healthy, 503 otherwise.
//! - `GET /api/glucose/latest`: newest stored reading, 404 when empty.
//! - `GET /api/glucose?from=&to=`: readings within an inclusive RFC 3339
//!   range, oldest first. Defaults to the last 24 hours.
//!
//! Other methods on these paths answer 405.
//!
//! All errors are returned as `{"error": "..."}` via [`AppError`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use glucolink_types::Measurement;

use crate::state::{AppState, HealthStatus};

/// Window used when `from` is omitted.
pub const DEFAULT_RANGE: time::Duration = time::Duration::hours(24);

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/glucose/latest", get(latest))
        .route("/api/glucose", get(range))
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthStatus>) {
    let status = (state.status)();
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// A reading with its presentation fields.
#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub trend_symbol: &'static str,
}

impl From<&Measurement> for ReadingResponse {
    fn from(measurement: &Measurement) -> Self {
        Self {
            trend_symbol: measurement.trend_symbol(),
            measurement: measurement.clone(),
        }
    }
}

async fn latest(State(state): State<Arc<AppState>>) -> Result<Json<ReadingResponse>, AppError> {
    let measurement = state.store.get_latest_measurement()?;
    Ok(Json(ReadingResponse::from(measurement.as_ref())))
}

/// Query parameters for `/api/glucose`.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,
}

impl RangeQuery {
    /// Resolve defaults and check ordering.
    pub fn bounds(&self, now: OffsetDateTime) -> Result<(OffsetDateTime, OffsetDateTime), AppError> {
        let to = self.to.unwrap_or(now);
        let from = self.from.unwrap_or(to - DEFAULT_RANGE);

        if from > to {
            return Err(AppError::BadRequest(format!(
                "'from' ({}) must not be after 'to' ({})",
                from, to
            )));
        }
        Ok((from, to))
    }
}

/// Time-range query response.
#[derive(Debug, Serialize)]
pub struct RangeResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: OffsetDateTime,
    pub count: usize,
    pub data: Vec<ReadingResponse>,
}

async fn range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<RangeResponse>, AppError> {
    let (from, to) = params.bounds(OffsetDateTime::now_utc())?;

    let mut measurements = state.store.get_measurements_by_time_range(from, to)?;
    measurements.sort_by_key(|m| m.timestamp);

    let data: Vec<_> = measurements
        .iter()
        .map(|m| ReadingResponse::from(m.as_ref()))
        .collect();

    Ok(Json(RangeResponse {
        from,
        to,
        count: data.len(),
        data,
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Store(glucolink_store::Error),
}

impl From<glucolink_store::Error> for AppError {
    fn from(e: glucolink_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
