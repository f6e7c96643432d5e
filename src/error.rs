//! Error types for the geofenced attendance tracker.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the tracker, the attendance client, and the reference
//! service can report.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the attendance tracker.
///
/// None of these errors are fatal to the process: sampling failures are
/// retried by the next cycle, and remote failures are surfaced to the
/// caller for the next user action.
///
/// # Example
///
/// ```
/// use geofence_attendance::error::TrackerError;
///
/// let error = TrackerError::SampleUnavailable {
///     message: "GPS fix timed out".to_string(),
/// };
/// assert_eq!(error.to_string(), "Location sample unavailable: GPS fix timed out");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration field '{field}': {message}")]
    InvalidConfig {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The platform refused access to the device location.
    #[error("Permission denied to access location")]
    PermissionDenied,

    /// The location sampler failed or timed out for this cycle.
    #[error("Location sample unavailable: {message}")]
    SampleUnavailable {
        /// A description of the sampler failure.
        message: String,
    },

    /// A clock-in was attempted outside the geofence.
    #[error("Outside the office geofence: {distance_meters:.1}m away (limit {radius_meters}m)")]
    OutsideGeofence {
        /// Measured distance to the office target.
        distance_meters: f64,
        /// The configured geofence radius.
        radius_meters: f64,
    },

    /// Attendance has already been recorded for the employee on this day.
    #[error("Attendance already marked for employee {employee_id} on {date}")]
    AlreadyClockedIn {
        /// The employee that already has a record.
        employee_id: i64,
        /// The attendance date.
        date: NaiveDate,
    },

    /// A clock-out was requested while no session is open.
    #[error("No active attendance session")]
    NoActiveSession,

    /// Reading from the attendance service failed.
    #[error("Attendance service fetch failed during {operation}: {message}")]
    RemoteFetchFailed {
        /// The operation that failed (e.g., "find_open_session").
        operation: String,
        /// A description of the failure.
        message: String,
    },

    /// The attendance service rejected a write.
    #[error("Attendance service rejected {operation}: {message}")]
    RemoteWriteFailed {
        /// The operation that failed (e.g., "clock_out").
        operation: String,
        /// A description of the failure.
        message: String,
    },

    /// The tracker loop has already been stopped.
    #[error("Location tracker is not running")]
    TrackerStopped,
}

impl TrackerError {
    /// Returns true when the next sampling cycle or user action can recover.
    ///
    /// Only configuration errors require operator intervention.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            TrackerError::ConfigNotFound { .. }
                | TrackerError::ConfigParseError { .. }
                | TrackerError::InvalidConfig { .. }
        )
    }
}

/// A type alias for Results that return TrackerError.
pub type TrackerResult<T> = Result<T, TrackerError>;
