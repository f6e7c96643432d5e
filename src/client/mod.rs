//! Attendance service client.
//!
//! The tracker never talks HTTP itself; it depends on the
//! [`AttendanceSessionClient`] capability. [`HttpAttendanceClient`] is the
//! production implementation and [`AttendanceDesk`] layers the clock-in
//! rules on top.

mod desk;
mod http;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::TrackerResult;
use crate::models::{AttendanceRecord, GeoPoint, SessionId};

pub use desk::AttendanceDesk;
pub use http::HttpAttendanceClient;

/// Remote persistence of clock-in and clock-out events.
#[async_trait]
pub trait AttendanceSessionClient: Send + Sync {
    /// Lists the attendance records of one employee on one day.
    async fn attendance_for(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> TrackerResult<Vec<AttendanceRecord>>;

    /// Returns the open session of the employee on `date`, if any.
    async fn find_open_session(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> TrackerResult<Option<SessionId>> {
        let records = self.attendance_for(employee_id, date).await?;
        Ok(records
            .iter()
            .find(|record| record.is_open())
            .map(AttendanceRecord::session_id))
    }

    /// Records a clock-in at `position` and returns the new session.
    async fn clock_in(
        &self,
        employee_id: i64,
        position: GeoPoint,
        at: NaiveDateTime,
    ) -> TrackerResult<SessionId>;

    /// Records the clock-out of `session_id` at `position`.
    async fn clock_out(
        &self,
        session_id: &SessionId,
        position: GeoPoint,
        at: NaiveDateTime,
    ) -> TrackerResult<()>;
}
