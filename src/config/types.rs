//! Configuration types for the attendance tracker.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every field that has a
//! reference-deployment default is optional in YAML.

use std::time::Duration;

use serde::Deserialize;

use crate::models::{Employee, GeoPoint};

/// Default geofence radius in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 50.0;

/// Default continuous outside duration before an automatic clock-out.
pub const DEFAULT_OUTSIDE_GRACE_MS: u64 = 10_000;

/// Default interval between location samples.
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 1_000;

/// Default upper bound on a single location sample.
pub const DEFAULT_SAMPLE_TIMEOUT_MS: u64 = 60_000;

/// Default base URL of the attendance service.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default bind address of the reference attendance service.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";

/// The circular office geofence.
///
/// # Example
///
/// ```
/// use geofence_attendance::config::GeofenceConfig;
/// use geofence_attendance::models::GeoPoint;
///
/// let config = GeofenceConfig::new(GeoPoint::new(52.50735, 88.33658));
/// assert_eq!(config.radius_meters, 50.0);
/// assert_eq!(config.outside_grace_ms, 10_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeofenceConfig {
    /// Center of the geofence.
    pub target: GeoPoint,
    /// Radius in meters; the boundary itself counts as inside.
    #[serde(default = "default_radius_meters")]
    pub radius_meters: f64,
    /// How long the device must stay outside before an automatic clock-out.
    #[serde(default = "default_outside_grace_ms")]
    pub outside_grace_ms: u64,
}

impl GeofenceConfig {
    /// Creates a geofence around `target` with the reference radius and grace.
    pub fn new(target: GeoPoint) -> Self {
        Self {
            target,
            radius_meters: DEFAULT_RADIUS_METERS,
            outside_grace_ms: DEFAULT_OUTSIDE_GRACE_MS,
        }
    }

    /// Returns the grace period as a [`Duration`].
    pub fn outside_grace(&self) -> Duration {
        Duration::from_millis(self.outside_grace_ms)
    }
}

/// Sampling loop cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SamplingConfig {
    /// Fixed interval between sampling cycles.
    #[serde(default = "default_sampling_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound on a single location sample.
    #[serde(default = "default_sample_timeout_ms")]
    pub sample_timeout_ms: u64,
}

impl SamplingConfig {
    /// Returns the sampling interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns the sample timeout as a [`Duration`].
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            sample_timeout_ms: DEFAULT_SAMPLE_TIMEOUT_MS,
        }
    }
}

/// Device-side tracker configuration from tracker.yaml.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackerConfig {
    /// The employee signed in on this device.
    pub employee_id: i64,
    /// Sampling loop cadence.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Initial value of the automatic clock-out toggle.
    #[serde(default = "default_true")]
    pub auto_clock_out_enabled: bool,
    /// Base URL of the attendance service.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

/// Reference attendance service configuration from server.yaml.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    /// Socket address the service listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Employee roster served by `GET /api/employees`.
    #[serde(default)]
    pub employees: Vec<Employee>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            employees: Vec::new(),
        }
    }
}

/// The complete office configuration loaded from a configuration directory.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficeConfig {
    geofence: GeofenceConfig,
    tracker: TrackerConfig,
    server: ServerConfig,
}

impl OfficeConfig {
    /// Creates a new OfficeConfig from its component parts.
    pub fn new(geofence: GeofenceConfig, tracker: TrackerConfig, server: ServerConfig) -> Self {
        Self {
            geofence,
            tracker,
            server,
        }
    }

    /// Returns the geofence configuration.
    pub fn geofence(&self) -> &GeofenceConfig {
        &self.geofence
    }

    /// Returns the tracker configuration.
    pub fn tracker(&self) -> &TrackerConfig {
        &self.tracker
    }

    /// Returns the reference service configuration.
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }
}

fn default_radius_meters() -> f64 {
    DEFAULT_RADIUS_METERS
}

fn default_outside_grace_ms() -> u64 {
    DEFAULT_OUTSIDE_GRACE_MS
}

fn default_sampling_interval_ms() -> u64 {
    DEFAULT_SAMPLING_INTERVAL_MS
}

fn default_sample_timeout_ms() -> u64 {
    DEFAULT_SAMPLE_TIMEOUT_MS
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_true() -> bool {
    true
}
