//! Transfer structures for the LibreLinkUp HTTP API.
//!
//! These mirror the JSON bodies returned by the upstream service. Field names
//! follow the vendor's mixed casing through explicit `serde` renames; the
//! canonical model types live in [`crate::types`].

use serde::{Deserialize, Serialize};

/// Body sent to `POST /llu/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from `POST /llu/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub data: LoginData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: UserData,
    pub auth_ticket: AuthTicket,
}

/// Account holder profile returned at login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub ui_language: String,
    /// Preferred unit of measure: `"0"` for mmol/L, `"1"` for mg/dL.
    pub uom: String,
    pub date_format: String,
    pub time_format: String,
}

/// Bearer token issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTicket {
    pub token: String,
    /// Expiry as a Unix timestamp (seconds).
    #[serde(default)]
    pub expires: i64,
    /// Validity in milliseconds.
    #[serde(default)]
    pub duration: i64,
}

/// Response from `GET /llu/connections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsResponse {
    pub data: Vec<Connection>,
}

/// One patient connection with its latest reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Lower target bound in mg/dL.
    #[serde(default)]
    pub target_low: f64,
    /// Upper target bound in mg/dL.
    #[serde(default)]
    pub target_high: f64,
    #[serde(default)]
    pub uom: i64,
    #[serde(default)]
    pub sensor: Option<SensorData>,
    pub glucose_measurement: GlucoseItem,
    #[serde(default)]
    pub patient_device: Option<PatientDevice>,
}

/// A single glucose reading as sent by the vendor.
///
/// The same shape is used for the current measurement and for graph points;
/// graph points simply omit the trend fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlucoseItem {
    #[serde(rename = "FactoryTimestamp")]
    pub factory_timestamp: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    /// `0` for historical points, `1` for the current reading.
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(rename = "ValueInMgPerDl")]
    pub value_in_mg_per_dl: f64,
    /// `1..=5` when a trend is known; `0` or missing otherwise.
    #[serde(rename = "TrendArrow", default)]
    pub trend_arrow: Option<i64>,
    #[serde(rename = "TrendMessage", default)]
    pub trend_message: Option<String>,
    #[serde(rename = "MeasurementColor", default)]
    pub measurement_color: i64,
    #[serde(rename = "GlucoseUnits", default)]
    pub glucose_units: i64,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "isHigh", default)]
    pub is_high: bool,
    #[serde(rename = "isLow", default)]
    pub is_low: bool,
}

/// Sensor block of a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorData {
    #[serde(rename = "deviceId", default)]
    pub device_id: String,
    #[serde(rename = "sn")]
    pub serial_number: String,
    /// Activation time as a Unix timestamp (seconds).
    #[serde(rename = "a")]
    pub activated_at: i64,
    #[serde(rename = "w", default)]
    pub warranty_days: u32,
    #[serde(rename = "pt", default)]
    pub product_type: i64,
}

/// Reader or phone app that uploads the patient's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDevice {
    #[serde(rename = "did")]
    pub device_id: String,
    #[serde(rename = "dtid", default)]
    pub device_type_id: i64,
    #[serde(rename = "v", default)]
    pub version: String,
    /// Low alarm limit in mg/dL.
    #[serde(rename = "ll", default)]
    pub low_limit: f64,
    /// High alarm limit in mg/dL.
    #[serde(rename = "hl", default)]
    pub high_limit: f64,
    #[serde(rename = "fixedLowAlarmValues", default)]
    pub fixed_low_alarm_values: Option<FixedLowAlarmValues>,
    #[serde(default)]
    pub alarms: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedLowAlarmValues {
    pub mgdl: f64,
    pub mmoll: f64,
}

/// Response from `GET /llu/connections/{patientId}/graph`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphResponse {
    pub data: GraphData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub connection: Connection,
    #[serde(default)]
    pub active_sensors: Vec<ActiveSensor>,
    #[serde(default)]
    pub graph_data: Vec<GlucoseItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSensor {
    pub sensor: SensorData,
    pub device: PatientDevice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glucose_item_minimal() {
        let json = r#"{
            "FactoryTimestamp": "1/1/2026 1:52:27 PM",
            "Timestamp": "1/1/2026 2:52:27 PM",
            "ValueInMgPerDl": 108,
            "Value": 108
        }"#;
        let item: GlucoseItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, 0);
        assert!(item.trend_arrow.is_none());
        assert!(item.trend_message.is_none());
        assert_eq!(item.measurement_color, 0);
        assert!(!item.is_high);
    }

    #[test]
    fn test_login_response() {
        let json = r#"{
            "status": 0,
            "data": {
                "user": {"id": "abc-123", "firstName": "Ada", "uom": "1"},
                "authTicket": {"token": "tok", "expires": 1767225600, "duration": 15552000000}
            }
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.user.id, "abc-123");
        assert_eq!(resp.data.user.first_name, "Ada");
        assert_eq!(resp.data.user.last_name, "");
        assert_eq!(resp.data.auth_ticket.token, "tok");
    }

    #[test]
    fn test_login_request_serializes() {
        let body = LoginRequest {
            email: "a@example.com",
            password: "secret",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["email"], "a@example.com");
        assert_eq!(json["password"], "secret");
    }

    #[test]
    fn test_sensor_data_renames() {
        let json = r#"{"deviceId": "", "sn": "0M0008B8CM", "a": 1767225600, "w": 60, "pt": 4, "s": false}"#;
        let sensor: SensorData = serde_json::from_str(json).unwrap();
        assert_eq!(sensor.serial_number, "0M0008B8CM");
        assert_eq!(sensor.activated_at, 1_767_225_600);
        assert_eq!(sensor.warranty_days, 60);
        assert_eq!(sensor.product_type, 4);
    }
}
