//! Core data models for the attendance tracker.
//!
//! This module contains the geographic value types and the attendance
//! records exchanged with the attendance service.

mod attendance;
mod employee;
mod geo_point;

pub use attendance::{
    AttendanceRecord, CLOCK_IN_PLACEHOLDER, ClockInRequest, ClockOutRequest,
    OPEN_SESSION_SENTINEL, SessionId, WriteAck, parse_clock_time,
};
pub use employee::Employee;
pub use geo_point::GeoPoint;
