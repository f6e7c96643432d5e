//! Attendance records and the wire types of the attendance service.
//!
//! Field names follow the service's JSON contract (`AttendanceId`,
//! `EmployeeID`, `Out_Latitude`, ...), so most fields carry an explicit
//! serde rename.

use std::fmt;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize};

use super::GeoPoint;

/// The `out_time` value the service reports for a record that has not been
/// clocked out yet.
pub const OPEN_SESSION_SENTINEL: &str = "1970-01-01T00:00:00.000Z";

/// The `out_time` written by a clock-in request.
pub const CLOCK_IN_PLACEHOLDER: &str = "00:00:00";

/// Opaque identifier of an open attendance record.
///
/// # Examples
///
/// ```
/// use geofence_attendance::models::SessionId;
///
/// let id = SessionId::from(42);
/// assert_eq!(id.as_str(), "42");
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// A row returned by `GET /api/attendance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Primary key of the record.
    #[serde(rename = "AttendanceId")]
    pub attendance_id: i64,
    /// The employee the record belongs to.
    #[serde(rename = "EmployeeId")]
    pub employee_id: i64,
    /// Employee display name, joined in by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The attendance day.
    #[serde(deserialize_with = "deserialize_date_prefix")]
    pub attendance_date: NaiveDate,
    /// Whether the employee was marked present.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub present: bool,
    /// Clock-in time, `HH:MM:SS` or an ISO timestamp on the epoch day.
    pub in_time: String,
    /// Clock-out time; absent, the sentinel, or the placeholder while open.
    #[serde(default)]
    pub out_time: Option<String>,
    /// Clock-in latitude as sent by the client.
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<String>,
    /// Clock-in longitude as sent by the client.
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<String>,
    /// Clock-out latitude.
    #[serde(rename = "Out_Latitude", default)]
    pub out_latitude: Option<String>,
    /// Clock-out longitude.
    #[serde(rename = "Out_Longitude", default)]
    pub out_longitude: Option<String>,
}

impl AttendanceRecord {
    /// Returns the session id for this record.
    pub fn session_id(&self) -> SessionId {
        SessionId::from(self.attendance_id)
    }

    /// Returns true when the record has a clock-in but no clock-out.
    ///
    /// # Examples
    ///
    /// ```
    /// use geofence_attendance::models::AttendanceRecord;
    ///
    /// let record: AttendanceRecord = serde_json::from_value(serde_json::json!({
    ///     "AttendanceId": 1,
    ///     "EmployeeId": 7,
    ///     "attendance_date": "2025-03-14T00:00:00.000Z",
    ///     "present": true,
    ///     "in_time": "1970-01-01T09:02:11.000Z",
    ///     "out_time": "1970-01-01T00:00:00.000Z"
    /// })).unwrap();
    /// assert!(record.is_open());
    /// ```
    pub fn is_open(&self) -> bool {
        match self.out_time.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(value) => value == OPEN_SESSION_SENTINEL || value == CLOCK_IN_PLACEHOLDER,
        }
    }

    /// Returns how long the employee was clocked in.
    ///
    /// `None` while the record is still open, when either time cannot be
    /// parsed, or when the clock-out precedes the clock-in.
    pub fn worked_duration(&self) -> Option<TimeDelta> {
        if self.is_open() {
            return None;
        }
        let clock_in = parse_clock_time(&self.in_time)?;
        let clock_out = parse_clock_time(self.out_time.as_deref()?)?;
        let worked = clock_out - clock_in;
        (worked >= TimeDelta::zero()).then_some(worked)
    }
}

/// Parses a clock time in either `HH:MM:SS[.fff]`, `HH:MM`, or the ISO form
/// `1970-01-01THH:MM:SS.fffZ` the service uses for time columns.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    let time_part = value.split_once('T').map_or(value, |(_, time)| time);
    let time_part = time_part.trim_end_matches('Z');

    NaiveTime::parse_from_str(time_part, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .ok()
}

/// Body of `POST /api/addattendance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockInRequest {
    /// The attendance day.
    pub attendance_date: NaiveDate,
    /// Always 1 for a clock-in.
    pub present: u8,
    /// The employee clocking in.
    #[serde(rename = "EmployeeID")]
    pub employee_id: i64,
    /// Clock-in time as `HH:MM:SS`.
    pub in_time: String,
    /// Always the placeholder `00:00:00`.
    pub out_time: String,
    /// Clock-in latitude.
    #[serde(rename = "Latitude")]
    pub latitude: String,
    /// Clock-in longitude.
    #[serde(rename = "Longitude")]
    pub longitude: String,
}

impl ClockInRequest {
    /// Builds a clock-in body for the given employee, position, and time.
    pub fn new(employee_id: i64, position: GeoPoint, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            attendance_date: date,
            present: 1,
            employee_id,
            in_time: format_clock_time(time),
            out_time: CLOCK_IN_PLACEHOLDER.to_string(),
            latitude: position.latitude.to_string(),
            longitude: position.longitude.to_string(),
        }
    }
}

/// Body of `PUT /api/attendance/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockOutRequest {
    /// Clock-out time as `HH:MM:SS`.
    pub out_time: String,
    /// Clock-out latitude.
    #[serde(rename = "Out_Latitude")]
    pub out_latitude: String,
    /// Clock-out longitude.
    #[serde(rename = "Out_Longitude")]
    pub out_longitude: String,
}

impl ClockOutRequest {
    /// Builds a clock-out body for the given position and time.
    pub fn new(position: GeoPoint, time: NaiveTime) -> Self {
        Self {
            out_time: format_clock_time(time),
            out_latitude: position.latitude.to_string(),
            out_longitude: position.longitude.to_string(),
        }
    }
}

/// Acknowledgement returned by the write endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteAck {
    /// Human-readable status message.
    pub message: String,
    /// Id of the created record, when the service reports it.
    #[serde(
        rename = "AttendanceId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attendance_id: Option<i64>,
}

fn format_clock_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn deserialize_date_prefix<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let date_part = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}
