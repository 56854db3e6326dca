//! Building measurements from raw API payloads.

use crate::error::{PayloadError, PayloadResult};
use crate::types::{GlucoseTargets, Measurement};
use crate::wire::{ConnectionsResponse, GraphResponse};

/// Decode a `GET /llu/connections` body and build the current measurement of
/// the first connection.
///
/// # Errors
///
/// - [`PayloadError::Decode`] if `raw` is not JSON of the expected shape
///   (this includes empty input and `null`).
/// - [`PayloadError::EmptyResult`] if `data` is an empty array, which is what
///   the API returns when the account follows no patient.
/// - [`PayloadError::Timestamp`] if a timestamp is malformed.
///
/// ```
/// use glucolink_types::{build_from_connections_payload, PayloadError};
///
/// let err = build_from_connections_payload(br#"{"data": []}"#).unwrap_err();
/// assert!(matches!(err, PayloadError::EmptyResult));
/// ```
pub fn build_from_connections_payload(raw: &[u8]) -> PayloadResult<Measurement> {
    let response: ConnectionsResponse = serde_json::from_slice(raw)?;
    current_measurement(&response)
}

/// Current measurement of the first connection in an already decoded response.
///
/// # Errors
///
/// See [`build_from_connections_payload`].
pub fn current_measurement(response: &ConnectionsResponse) -> PayloadResult<Measurement> {
    let connection = response.data.first().ok_or(PayloadError::EmptyResult)?;
    Measurement::from_glucose_item(&connection.glucose_measurement)
}

/// Everything the graph endpoint tells us, in model form.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    /// The live reading.
    pub current: Measurement,
    /// Roughly twelve hours of historical points, in upstream order.
    pub history: Vec<Measurement>,
    pub targets: GlucoseTargets,
}

impl GraphSnapshot {
    /// Convert a decoded graph response.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Timestamp`] if any point has a malformed timestamp.
    pub fn from_response(response: &GraphResponse) -> PayloadResult<Self> {
        let data = &response.data;
        let current = Measurement::from_glucose_item(&data.connection.glucose_measurement)?;
        let history = data
            .graph_data
            .iter()
            .map(Measurement::from_glucose_item)
            .collect::<PayloadResult<Vec<_>>>()?;

        Ok(Self {
            current,
            history,
            targets: GlucoseTargets::from(&data.connection),
        })
    }

    /// All readings, historical first, then the current one.
    pub fn into_measurements(self) -> impl Iterator<Item = Measurement> {
        self.history.into_iter().chain(std::iter::once(self.current))
    }
}

/// Decode a `GET /llu/connections/{id}/graph` body.
///
/// # Errors
///
/// Returns [`PayloadError::Decode`] for malformed JSON and
/// [`PayloadError::Timestamp`] for malformed timestamps.
pub fn build_from_graph_payload(raw: &[u8]) -> PayloadResult<GraphSnapshot> {
    let response: GraphResponse = serde_json::from_slice(raw)?;
    GraphSnapshot::from_response(&response)
}
