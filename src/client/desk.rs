//! Clock-in and manual clock-out rules for the signed-in employee.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::config::GeofenceConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::geofence::evaluate;
use crate::models::{GeoPoint, SessionId};

use super::AttendanceSessionClient;

/// Applies the attendance rules for one employee on top of a client.
///
/// A clock-in is accepted only from inside the geofence and only once per
/// day.
#[derive(Clone)]
pub struct AttendanceDesk {
    client: Arc<dyn AttendanceSessionClient>,
    geofence: GeofenceConfig,
    employee_id: i64,
}

impl AttendanceDesk {
    /// Creates a desk for `employee_id` checking positions against `geofence`.
    pub fn new(
        client: Arc<dyn AttendanceSessionClient>,
        geofence: GeofenceConfig,
        employee_id: i64,
    ) -> Self {
        Self {
            client,
            geofence,
            employee_id,
        }
    }

    /// Returns the employee this desk acts for.
    pub fn employee_id(&self) -> i64 {
        self.employee_id
    }

    /// Looks up the employee's open session on `date`.
    pub async fn refresh_active_session(&self, date: NaiveDate) -> TrackerResult<Option<SessionId>> {
        self.client.find_open_session(self.employee_id, date).await
    }

    /// Clocks the employee in at `position`.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::OutsideGeofence`] when `position` is beyond the radius;
    ///   the service is not contacted.
    /// - [`TrackerError::AlreadyClockedIn`] when any record exists for the day.
    /// - Remote errors from the underlying client.
    pub async fn clock_in(&self, position: GeoPoint, at: NaiveDateTime) -> TrackerResult<SessionId> {
        let reading = evaluate(position, &self.geofence);
        if !reading.inside {
            warn!(
                employee_id = self.employee_id,
                distance_meters = reading.distance_meters,
                "Clock-in refused outside the geofence"
            );
            return Err(TrackerError::OutsideGeofence {
                distance_meters: reading.distance_meters,
                radius_meters: self.geofence.radius_meters,
            });
        }

        let date = at.date();
        let existing = self.client.attendance_for(self.employee_id, date).await?;
        if !existing.is_empty() {
            info!(employee_id = self.employee_id, %date, "Attendance already marked");
            return Err(TrackerError::AlreadyClockedIn {
                employee_id: self.employee_id,
                date,
            });
        }

        self.client.clock_in(self.employee_id, position, at).await
    }

    /// Clocks out `session_id` at `position`.
    pub async fn clock_out(
        &self,
        session_id: &SessionId,
        position: GeoPoint,
        at: NaiveDateTime,
    ) -> TrackerResult<()> {
        self.client.clock_out(session_id, position, at).await
    }
}
