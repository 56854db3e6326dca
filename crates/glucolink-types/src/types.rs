//! Core types for glucose data.

use core::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{PayloadError, PayloadResult};
use crate::timestamp::parse_timestamp;
use crate::wire::{Connection, GlucoseItem, PatientDevice, SensorData, UserData};

/// Conversion factor between mg/dL and mmol/L used by the vendor.
pub const MG_DL_PER_MMOL: f64 = 18.0;

/// Direction of glucose change reported by the sensor.
///
/// Variants are ordered by rate of change, from falling fastest to rising
/// fastest, so `TrendArrow::Fall < TrendArrow::Rise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrendArrow {
    RapidFall = 1,
    Fall = 2,
    Steady = 3,
    Rise = 4,
    RapidRise = 5,
}

impl TrendArrow {
    /// Map a vendor trend code to a trend.
    ///
    /// `0` means "not provided". Any code outside `1..=5` is treated the same
    /// way, so the result is `None` for both.
    ///
    /// ```
    /// use glucolink_types::TrendArrow;
    ///
    /// assert_eq!(TrendArrow::from_code(3), Some(TrendArrow::Steady));
    /// assert_eq!(TrendArrow::from_code(0), None);
    /// assert_eq!(TrendArrow::from_code(6), None);
    /// ```
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TrendArrow::RapidFall),
            2 => Some(TrendArrow::Fall),
            3 => Some(TrendArrow::Steady),
            4 => Some(TrendArrow::Rise),
            5 => Some(TrendArrow::RapidRise),
            _ => None,
        }
    }

    /// The vendor code for this trend.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TrendArrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendArrow::RapidFall => write!(f, "Falling quickly"),
            TrendArrow::Fall => write!(f, "Falling"),
            TrendArrow::Steady => write!(f, "Steady"),
            TrendArrow::Rise => write!(f, "Rising"),
            TrendArrow::RapidRise => write!(f, "Rising quickly"),
        }
    }
}

/// Range classification the vendor attaches to each reading.
///
/// Ordered by severity: `Unknown < Normal < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatusColor {
    /// Code not recognised.
    #[default]
    Unknown = 0,
    /// In range (green).
    Normal = 1,
    /// Approaching a limit (yellow/orange).
    Warning = 2,
    /// Out of range (red).
    Critical = 3,
}

impl StatusColor {
    /// Map a raw `MeasurementColor` code. Anything other than `1..=3` is `Unknown`.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => StatusColor::Normal,
            2 => StatusColor::Warning,
            3 => StatusColor::Critical,
            _ => StatusColor::Unknown,
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusColor::Unknown => write!(f, "Unknown"),
            StatusColor::Normal => write!(f, "Normal"),
            StatusColor::Warning => write!(f, "Warning"),
            StatusColor::Critical => write!(f, "Critical"),
        }
    }
}

/// Unit the patient has chosen for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GlucoseUnit {
    #[default]
    #[serde(rename = "mmol/L")]
    MmolPerL,
    #[serde(rename = "mg/dL")]
    MgPerDl,
}

impl GlucoseUnit {
    /// Map a vendor unit code: `1` is mg/dL, everything else mmol/L.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            GlucoseUnit::MgPerDl
        } else {
            GlucoseUnit::MmolPerL
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            GlucoseUnit::MmolPerL => "mmol/L",
            GlucoseUnit::MgPerDl => "mg/dL",
        }
    }
}

impl fmt::Display for GlucoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Whether a reading is the live value or a point from the history graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Historical,
    Current,
}

impl RecordKind {
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            RecordKind::Current
        } else {
            RecordKind::Historical
        }
    }
}

/// A single glucose reading.
///
/// Two measurements are the same reading iff their `timestamp` values are
/// equal; the store uses that as its dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Phone time of the reading, tagged as UTC (see [`crate::timestamp`]).
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Sensor time of the reading in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub factory_timestamp: OffsetDateTime,
    /// Glucose in mmol/L.
    pub value_mmol: f64,
    /// Glucose in mg/dL.
    pub value_mg_dl: i32,
    /// Trend at the time of the reading. Absent for historical points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendArrow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_message: Option<String>,
    pub status_color: StatusColor,
    pub unit: GlucoseUnit,
    pub is_high: bool,
    pub is_low: bool,
    pub kind: RecordKind,
}

impl Measurement {
    /// Build a measurement from a vendor glucose item.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Timestamp`] if either timestamp is malformed.
    pub fn from_glucose_item(item: &GlucoseItem) -> PayloadResult<Self> {
        let timestamp = parse_timestamp(&item.timestamp)?;
        let factory_timestamp = parse_timestamp(&item.factory_timestamp)?;
        let unit = GlucoseUnit::from_code(item.glucose_units);

        let value_mmol = match unit {
            GlucoseUnit::MmolPerL => item.value,
            GlucoseUnit::MgPerDl => item.value_in_mg_per_dl / MG_DL_PER_MMOL,
        };

        Ok(Self {
            timestamp,
            factory_timestamp,
            value_mmol,
            value_mg_dl: item.value_in_mg_per_dl.round() as i32,
            trend: item.trend_arrow.and_then(TrendArrow::from_code),
            trend_message: item
                .trend_message
                .as_ref()
                .filter(|m| !m.is_empty())
                .cloned(),
            status_color: StatusColor::from_code(item.measurement_color),
            unit,
            is_high: item.is_high,
            is_low: item.is_low,
            kind: RecordKind::from_code(item.kind),
        })
    }

    /// Value in the patient's preferred unit.
    pub fn value_in_unit(&self) -> f64 {
        match self.unit {
            GlucoseUnit::MmolPerL => self.value_mmol,
            GlucoseUnit::MgPerDl => f64::from(self.value_mg_dl),
        }
    }
}

/// The physical sensor worn by the patient. Keyed by serial number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub serial_number: String,
    pub device_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub activated_at: OffsetDateTime,
    pub product_type: i64,
    pub warranty_days: u32,
    pub is_active: bool,
    /// When this sensor was first seen by the collector.
    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
}

impl SensorConfig {
    /// Build from the wire sensor block. Sensors reported by the API are the
    /// ones currently in use, so the result is marked active.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::OutOfRange`] if the activation time is not a
    /// valid Unix timestamp.
    pub fn from_wire(sensor: &SensorData, detected_at: OffsetDateTime) -> PayloadResult<Self> {
        let activated_at = OffsetDateTime::from_unix_timestamp(sensor.activated_at)
            .map_err(|source| PayloadError::OutOfRange { field: "a", source })?;

        Ok(Self {
            serial_number: sensor.serial_number.clone(),
            device_id: sensor.device_id.clone(),
            activated_at,
            product_type: sensor.product_type,
            warranty_days: sensor.warranty_days,
            is_active: true,
            detected_at,
        })
    }
}

/// The reader or phone that uploads readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub device_type_id: i64,
    pub app_version: String,
    pub low_limit_mg_dl: f64,
    pub high_limit_mg_dl: f64,
    pub fixed_low_alarm_mg_dl: Option<f64>,
    pub alarms_enabled: bool,
}

impl From<&PatientDevice> for DeviceInfo {
    fn from(device: &PatientDevice) -> Self {
        Self {
            device_id: device.device_id.clone(),
            device_type_id: device.device_type_id,
            app_version: device.version.clone(),
            low_limit_mg_dl: device.low_limit,
            high_limit_mg_dl: device.high_limit,
            fixed_low_alarm_mg_dl: device.fixed_low_alarm_values.as_ref().map(|v| v.mgdl),
            alarms_enabled: device.alarms,
        }
    }
}

/// Account holder's display preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub language: String,
    pub unit: GlucoseUnit,
    pub date_format: String,
    pub time_format: String,
}

impl From<&UserData> for UserPreferences {
    fn from(user: &UserData) -> Self {
        let unit = user
            .uom
            .parse::<i64>()
            .map(GlucoseUnit::from_code)
            .unwrap_or_default();
        Self {
            user_id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            country: user.country.clone(),
            language: user.ui_language.clone(),
            unit,
            date_format: user.date_format.clone(),
            time_format: user.time_format.clone(),
        }
    }
}

/// Target range configured for the patient, in mg/dL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseTargets {
    pub low_mg_dl: f64,
    pub high_mg_dl: f64,
    pub unit: GlucoseUnit,
}

impl GlucoseTargets {
    pub fn low_mmol(&self) -> f64 {
        self.low_mg_dl / MG_DL_PER_MMOL
    }

    pub fn high_mmol(&self) -> f64 {
        self.high_mg_dl / MG_DL_PER_MMOL
    }

    /// Whether a reading lies inside the target range (inclusive).
    pub fn contains(&self, measurement: &Measurement) -> bool {
        let value = f64::from(measurement.value_mg_dl);
        value >= self.low_mg_dl && value <= self.high_mg_dl
    }
}

impl From<&Connection> for GlucoseTargets {
    fn from(connection: &Connection) -> Self {
        Self {
            low_mg_dl: connection.target_low,
            high_mg_dl: connection.target_high,
            unit: GlucoseUnit::from_code(connection.uom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp_trusted;

    fn item(trend: Option<i64>, units: i64) -> GlucoseItem {
        GlucoseItem {
            factory_timestamp: "1/1/2026 1:52:27 PM".to_string(),
            timestamp: "1/1/2026 2:52:27 PM".to_string(),
            kind: 1,
            value_in_mg_per_dl: 115.0,
            trend_arrow: trend,
            trend_message: None,
            measurement_color: 1,
            glucose_units: units,
            value: if units == 1 { 115.0 } else { 6.4 },
            is_high: false,
            is_low: false,
        }
    }

    #[test]
    fn test_trend_ordering() {
        assert!(TrendArrow::RapidFall < TrendArrow::Fall);
        assert!(TrendArrow::Steady < TrendArrow::RapidRise);
        assert_eq!(TrendArrow::Rise.code(), 4);
    }

    #[test]
    fn test_trend_from_code_out_of_range() {
        assert_eq!(TrendArrow::from_code(0), None);
        assert_eq!(TrendArrow::from_code(-1), None);
        assert_eq!(TrendArrow::from_code(6), None);
    }

    #[test]
    fn test_status_color_from_code() {
        assert_eq!(StatusColor::from_code(1), StatusColor::Normal);
        assert_eq!(StatusColor::from_code(2), StatusColor::Warning);
        assert_eq!(StatusColor::from_code(3), StatusColor::Critical);
        assert_eq!(StatusColor::from_code(0), StatusColor::Unknown);
        assert_eq!(StatusColor::from_code(-7), StatusColor::Unknown);
        assert_eq!(StatusColor::from_code(4), StatusColor::Unknown);
    }

    #[test]
    fn test_measurement_from_item_mg_dl() {
        let m = Measurement::from_glucose_item(&item(Some(3), 1)).unwrap();
        assert_eq!(m.timestamp, parse_timestamp_trusted("1/1/2026 2:52:27 PM"));
        assert_eq!(
            m.factory_timestamp,
            parse_timestamp_trusted("1/1/2026 1:52:27 PM")
        );
        assert_eq!(m.value_mg_dl, 115);
        assert!((m.value_mmol - 115.0 / 18.0).abs() < 1e-9);
        assert_eq!(m.trend, Some(TrendArrow::Steady));
        assert_eq!(m.unit, GlucoseUnit::MgPerDl);
        assert_eq!(m.kind, RecordKind::Current);
        assert_eq!(m.value_in_unit(), 115.0);
    }

    #[test]
    fn test_measurement_from_item_mmol_uses_value() {
        let m = Measurement::from_glucose_item(&item(Some(4), 0)).unwrap();
        assert!((m.value_mmol - 6.4).abs() < 1e-9);
        assert_eq!(m.unit, GlucoseUnit::MmolPerL);
    }

    #[test]
    fn test_measurement_zero_trend_is_absent() {
        let m = Measurement::from_glucose_item(&item(Some(0), 1)).unwrap();
        assert!(m.trend.is_none());

        let m = Measurement::from_glucose_item(&item(Some(6), 1)).unwrap();
        assert!(m.trend.is_none());

        let m = Measurement::from_glucose_item(&item(None, 1)).unwrap();
        assert!(m.trend.is_none());
    }

    #[test]
    fn test_measurement_empty_trend_message_is_absent() {
        let mut raw = item(Some(3), 1);
        raw.trend_message = Some(String::new());
        let m = Measurement::from_glucose_item(&raw).unwrap();
        assert!(m.trend_message.is_none());
    }

    #[test]
    fn test_measurement_bad_timestamp() {
        let mut raw = item(Some(3), 1);
        raw.timestamp = "yesterday".to_string();
        let err = Measurement::from_glucose_item(&raw).unwrap_err();
        assert!(matches!(err, PayloadError::Timestamp(_)));
    }

    #[test]
    fn test_measurement_serializes_rfc3339() {
        let m = Measurement::from_glucose_item(&item(None, 1)).unwrap();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["timestamp"], "2026-01-01T14:52:27Z");
        assert!(json.get("trend").is_none());
        assert_eq!(json["unit"], "mg/dL");
    }

    #[test]
    fn test_sensor_from_wire() {
        let wire = SensorData {
            device_id: String::new(),
            serial_number: "0M0008B8CM".to_string(),
            activated_at: 1_767_225_600,
            warranty_days: 60,
            product_type: 4,
        };
        let now = OffsetDateTime::now_utc();
        let sensor = SensorConfig::from_wire(&wire, now).unwrap();
        assert_eq!(sensor.serial_number, "0M0008B8CM");
        assert_eq!(sensor.activated_at.unix_timestamp(), 1_767_225_600);
        assert!(sensor.is_active);
        assert_eq!(sensor.detected_at, now);
    }

    #[test]
    fn test_sensor_from_wire_out_of_range() {
        let wire = SensorData {
            device_id: String::new(),
            serial_number: "X".to_string(),
            activated_at: i64::MAX,
            warranty_days: 0,
            product_type: 0,
        };
        let err = SensorConfig::from_wire(&wire, OffsetDateTime::now_utc()).unwrap_err();
        assert!(matches!(err, PayloadError::OutOfRange { field: "a", .. }));
    }

    #[test]
    fn test_user_preferences_unit() {
        let user = UserData {
            id: "u1".to_string(),
            uom: "1".to_string(),
            ..Default::default()
        };
        assert_eq!(UserPreferences::from(&user).unit, GlucoseUnit::MgPerDl);

        let user = UserData {
            uom: "garbage".to_string(),
            ..Default::default()
        };
        assert_eq!(UserPreferences::from(&user).unit, GlucoseUnit::MmolPerL);
    }

    #[test]
    fn test_targets_contains() {
        let targets = GlucoseTargets {
            low_mg_dl: 70.0,
            high_mg_dl: 180.0,
            unit: GlucoseUnit::MgPerDl,
        };
        let m = Measurement::from_glucose_item(&item(None, 1)).unwrap();
        assert!(targets.contains(&m));
        assert!((targets.low_mmol() - 70.0 / 18.0).abs() < 1e-9);
    }
}
