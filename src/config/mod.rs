//! Configuration loading and management for the attendance tracker.
//!
//! This module provides functionality to load the office geofence, the
//! device tracker settings, and the reference service settings from YAML
//! files.
//!
//! # Example
//!
//! ```no_run
//! use geofence_attendance::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/office").unwrap();
//! println!("Tracking employee {}", config.tracker().employee_id);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DEFAULT_API_BASE_URL, DEFAULT_BIND_ADDRESS, DEFAULT_OUTSIDE_GRACE_MS, DEFAULT_RADIUS_METERS,
    DEFAULT_SAMPLE_TIMEOUT_MS, DEFAULT_SAMPLING_INTERVAL_MS, GeofenceConfig, OfficeConfig,
    SamplingConfig, ServerConfig, TrackerConfig,
};
