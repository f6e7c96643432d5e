//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading office
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{TrackerError, TrackerResult};

use super::types::{GeofenceConfig, OfficeConfig, ServerConfig, TrackerConfig};

/// Loads, validates, and provides access to the office configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/office/
/// ├── geofence.yaml   # Office target, radius, outside grace
/// ├── tracker.yaml    # Employee, sampling cadence, auto clock-out, API URL
/// └── server.yaml     # Optional: reference service bind address and roster
/// ```
///
/// # Example
///
/// ```no_run
/// use geofence_attendance::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/office").unwrap();
/// println!("Office radius: {}m", loader.geofence().radius_meters);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: OfficeConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - geofence.yaml or tracker.yaml is missing
    /// - Any file contains invalid YAML
    /// - Any value is out of range
    ///
    /// A missing server.yaml falls back to [`ServerConfig::default`].
    pub fn load<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let path = path.as_ref();

        let geofence = Self::load_yaml::<GeofenceConfig>(&path.join("geofence.yaml"))?;
        let tracker = Self::load_yaml::<TrackerConfig>(&path.join("tracker.yaml"))?;

        let server_path = path.join("server.yaml");
        let server = if server_path.exists() {
            Self::load_yaml::<ServerConfig>(&server_path)?
        } else {
            ServerConfig::default()
        };

        Self::from_parts(geofence, tracker, server)
    }

    /// Builds a loader from already-parsed parts, applying the same
    /// validation as [`ConfigLoader::load`].
    pub fn from_parts(
        geofence: GeofenceConfig,
        tracker: TrackerConfig,
        server: ServerConfig,
    ) -> TrackerResult<Self> {
        validate_geofence(&geofence)?;
        validate_tracker(&tracker)?;

        Ok(Self {
            config: OfficeConfig::new(geofence, tracker, server),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> TrackerResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| TrackerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| TrackerError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying office configuration.
    pub fn config(&self) -> &OfficeConfig {
        &self.config
    }

    /// Returns the geofence configuration.
    pub fn geofence(&self) -> &GeofenceConfig {
        self.config.geofence()
    }

    /// Returns the tracker configuration.
    pub fn tracker(&self) -> &TrackerConfig {
        self.config.tracker()
    }

    /// Returns the reference service configuration.
    pub fn server(&self) -> &ServerConfig {
        self.config.server()
    }
}

fn invalid(field: &str, message: impl Into<String>) -> TrackerError {
    TrackerError::InvalidConfig {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_geofence(geofence: &GeofenceConfig) -> TrackerResult<()> {
    if !geofence.target.is_valid() {
        return Err(invalid(
            "target",
            format!(
                "coordinates ({}, {}) are out of range",
                geofence.target.latitude, geofence.target.longitude
            ),
        ));
    }
    if !geofence.radius_meters.is_finite() || geofence.radius_meters <= 0.0 {
        return Err(invalid("radius_meters", "must be a positive number"));
    }
    Ok(())
}

fn validate_tracker(tracker: &TrackerConfig) -> TrackerResult<()> {
    if tracker.sampling.interval_ms == 0 {
        return Err(invalid("sampling.interval_ms", "must be greater than zero"));
    }
    if tracker.sampling.sample_timeout_ms == 0 {
        return Err(invalid(
            "sampling.sample_timeout_ms",
            "must be greater than zero",
        ));
    }
    if tracker.api_base_url.trim().is_empty() {
        return Err(invalid("api_base_url", "must not be empty"));
    }
    Ok(())
}
