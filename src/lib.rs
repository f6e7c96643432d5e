//! Geofenced employee attendance tracking.
//!
//! This crate samples the device location on a fixed cadence, classifies it
//! against a circular office geofence, and clocks the employee out once they
//! have stayed outside past a grace period. It also ships the attendance
//! service client and an in-memory reference implementation of that service.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod geofence;
pub mod models;
pub mod server;
pub mod tracker;
