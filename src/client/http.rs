//! `reqwest` implementation of the attendance service contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Response, StatusCode};
use tracing::{debug, info, warn};

use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    AttendanceRecord, ClockInRequest, ClockOutRequest, Employee, GeoPoint, SessionId, WriteAck,
};

use super::AttendanceSessionClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Attendance service client speaking JSON over HTTP.
///
/// # Example
///
/// ```no_run
/// use geofence_attendance::client::{AttendanceSessionClient, HttpAttendanceClient};
/// use chrono::NaiveDate;
///
/// # async fn run() -> geofence_attendance::error::TrackerResult<()> {
/// let client = HttpAttendanceClient::new("http://127.0.0.1:5000")?;
/// let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// if let Some(session) = client.find_open_session(1, today).await? {
///     println!("open session {session}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAttendanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAttendanceClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> TrackerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TrackerError::InvalidConfig {
                field: "api_base_url".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::with_client(http, base_url))
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Returns the service base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Lists every employee known to the service.
    pub async fn employees(&self) -> TrackerResult<Vec<Employee>> {
        let response = self
            .http
            .get(self.url("/api/employees"))
            .send()
            .await
            .map_err(|e| fetch_failed("employees", e))?;
        let response = ensure_success(response, "employees", fetch_failed_status)?;
        response
            .json()
            .await
            .map_err(|e| fetch_failed("employees", e))
    }
}

#[async_trait]
impl AttendanceSessionClient for HttpAttendanceClient {
    async fn attendance_for(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> TrackerResult<Vec<AttendanceRecord>> {
        debug!(employee_id, %date, "Fetching attendance records");

        let response = self
            .http
            .get(self.url("/api/attendance"))
            .query(&[
                ("date", date.to_string()),
                ("EmployeeId", employee_id.to_string()),
            ])
            .send()
            .await
            .map_err(|e| fetch_failed("attendance_for", e))?;
        let response = ensure_success(response, "attendance_for", fetch_failed_status)?;

        response
            .json()
            .await
            .map_err(|e| fetch_failed("attendance_for", e))
    }

    async fn clock_in(
        &self,
        employee_id: i64,
        position: GeoPoint,
        at: NaiveDateTime,
    ) -> TrackerResult<SessionId> {
        let body = ClockInRequest::new(employee_id, position, at.date(), at.time());

        let response = self
            .http
            .post(self.url("/api/addattendance"))
            .json(&body)
            .send()
            .await
            .map_err(|e| write_failed("clock_in", e))?;
        let response = ensure_success(response, "clock_in", write_failed_status)?;

        // Older deployments acknowledge without the new id.
        let reported = response
            .json::<WriteAck>()
            .await
            .ok()
            .and_then(|ack| ack.attendance_id);

        let session = match reported {
            Some(id) => SessionId::from(id),
            None => self
                .find_open_session(employee_id, at.date())
                .await?
                .ok_or_else(|| TrackerError::RemoteWriteFailed {
                    operation: "clock_in".to_string(),
                    message: "service accepted the clock-in but no open session was found"
                        .to_string(),
                })?,
        };

        info!(employee_id, session_id = %session, "Clocked in");
        Ok(session)
    }

    async fn clock_out(
        &self,
        session_id: &SessionId,
        position: GeoPoint,
        at: NaiveDateTime,
    ) -> TrackerResult<()> {
        let body = ClockOutRequest::new(position, at.time());

        let response = self
            .http
            .put(self.url(&format!("/api/attendance/{}", session_id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| write_failed("clock_out", e))?;
        ensure_success(response, "clock_out", write_failed_status)?;

        info!(session_id = %session_id, out_time = %body.out_time, "Clocked out");
        Ok(())
    }
}

fn ensure_success(
    response: Response,
    operation: &str,
    on_error: fn(&str, StatusCode) -> TrackerError,
) -> TrackerResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!(operation, status = status.as_u16(), "Attendance service returned an error");
        Err(on_error(operation, status))
    }
}

fn fetch_failed(operation: &str, error: reqwest::Error) -> TrackerError {
    TrackerError::RemoteFetchFailed {
        operation: operation.to_string(),
        message: error.to_string(),
    }
}

fn fetch_failed_status(operation: &str, status: StatusCode) -> TrackerError {
    TrackerError::RemoteFetchFailed {
        operation: operation.to_string(),
        message: format!("HTTP {}", status.as_u16()),
    }
}

fn write_failed(operation: &str, error: reqwest::Error) -> TrackerError {
    TrackerError::RemoteWriteFailed {
        operation: operation.to_string(),
        message: error.to_string(),
    }
}

fn write_failed_status(operation: &str, status: StatusCode) -> TrackerError {
    TrackerError::RemoteWriteFailed {
        operation: operation.to_string(),
        message: format!("HTTP {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = HttpAttendanceClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.url("/api/employees"),
            "http://localhost:5000/api/employees"
        );
    }

    #[test]
    fn test_status_errors_name_the_operation() {
        let error = write_failed_status("clock_out", StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error,
            TrackerError::RemoteWriteFailed {
                operation: "clock_out".to_string(),
                message: "HTTP 500".to_string(),
            }
        );

        let error = fetch_failed_status("attendance_for", StatusCode::NOT_FOUND);
        assert!(matches!(error, TrackerError::RemoteFetchFailed { .. }));
    }
}
