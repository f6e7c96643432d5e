//! HTTP request handlers for the reference attendance service.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{AttendanceRecord, ClockInRequest, ClockOutRequest, Employee, WriteAck};

use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Filters accepted by `GET /api/attendance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceQuery {
    /// Only rows for this day.
    pub date: Option<NaiveDate>,
    /// Only rows for this employee.
    #[serde(rename = "EmployeeId")]
    pub employee_id: Option<i64>,
}

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/employees", get(list_employees))
        .route("/api/attendance", get(list_attendance))
        .route("/api/addattendance", post(add_attendance))
        .route("/api/attendance/:id", put(update_attendance))
        .with_state(state)
}

/// Handler for GET /api/employees.
async fn list_employees(State(state): State<AppState>) -> Json<Vec<Employee>> {
    let correlation_id = Uuid::new_v4();
    debug!(correlation_id = %correlation_id, count = state.employees().len(), "Listing employees");
    Json(state.employees().to_vec())
}

/// Handler for GET /api/attendance.
async fn list_attendance(
    State(state): State<AppState>,
    query: Result<Query<AttendanceQuery>, QueryRejection>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiErrorResponse> {
    let correlation_id = Uuid::new_v4();

    let Query(query) = query.map_err(|rejection| {
        warn!(correlation_id = %correlation_id, error = %rejection.body_text(), "Invalid attendance query");
        ApiErrorResponse::from(rejection)
    })?;

    let records = state
        .store()
        .read()
        .await
        .query(query.date, query.employee_id);

    debug!(
        correlation_id = %correlation_id,
        date = ?query.date,
        employee_id = ?query.employee_id,
        matches = records.len(),
        "Attendance query"
    );
    Ok(Json(records))
}

/// Handler for POST /api/addattendance.
///
/// Inserts a clock-in row and answers 201 with the new id.
async fn add_attendance(
    State(state): State<AppState>,
    payload: Result<Json<ClockInRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let correlation_id = Uuid::new_v4();

    let Json(request) = payload.map_err(|rejection| {
        warn!(correlation_id = %correlation_id, error = %rejection.body_text(), "Rejected clock-in body");
        ApiErrorResponse::from(rejection)
    })?;

    let record = state
        .store()
        .write()
        .await
        .insert(request, state.employees());

    info!(
        correlation_id = %correlation_id,
        attendance_id = record.attendance_id,
        employee_id = record.employee_id,
        date = %record.attendance_date,
        "Attendance inserted"
    );

    Ok((
        StatusCode::CREATED,
        Json(WriteAck {
            message: "Attendance inserted successfully".to_string(),
            attendance_id: Some(record.attendance_id),
        }),
    ))
}

/// Handler for PUT /api/attendance/:id.
///
/// Writes the clock-out time and position of an existing row.
async fn update_attendance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ClockOutRequest>, JsonRejection>,
) -> Result<Json<WriteAck>, ApiErrorResponse> {
    let correlation_id = Uuid::new_v4();

    let Json(request) = payload.map_err(|rejection| {
        warn!(correlation_id = %correlation_id, error = %rejection.body_text(), "Rejected clock-out body");
        ApiErrorResponse::from(rejection)
    })?;

    let updated = state.store().write().await.clock_out(id, request);
    let Some(record) = updated else {
        warn!(correlation_id = %correlation_id, attendance_id = id, "Attendance record not found");
        return Err(ApiErrorResponse::not_found(ApiError::attendance_not_found(id)));
    };

    info!(
        correlation_id = %correlation_id,
        attendance_id = id,
        out_time = record.out_time.as_deref().unwrap_or_default(),
        "Attendance updated"
    );

    Ok(Json(WriteAck {
        message: "Attendance updated successfully".to_string(),
        attendance_id: Some(id),
    }))
}
