//! Geofence classification.
//!
//! A thin composition over [`distance`](super::distance) that decides whether
//! a position lies inside the configured office geofence.

use serde::Serialize;

use crate::config::GeofenceConfig;
use crate::models::GeoPoint;

use super::distance::distance;

/// The outcome of classifying one position against the geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeofenceReading {
    /// Great-circle distance from the position to the geofence target.
    pub distance_meters: f64,
    /// True when the position is on or within the radius.
    pub inside: bool,
}

/// Classifies a position, keeping the measured distance.
///
/// # Examples
///
/// ```
/// use geofence_attendance::config::GeofenceConfig;
/// use geofence_attendance::geofence::evaluate;
/// use geofence_attendance::models::GeoPoint;
///
/// let config = GeofenceConfig::new(GeoPoint::new(52.50735, 88.33658));
/// let reading = evaluate(GeoPoint::new(52.50735, 88.33658), &config);
/// assert!(reading.inside);
/// assert_eq!(reading.distance_meters, 0.0);
/// ```
pub fn evaluate(position: GeoPoint, config: &GeofenceConfig) -> GeofenceReading {
    let distance_meters = distance(position, config.target);
    GeofenceReading {
        distance_meters,
        inside: distance_meters <= config.radius_meters,
    }
}

/// Returns true when `position` is within `config.radius_meters` of the
/// target. The boundary is inclusive.
pub fn is_within_geofence(position: GeoPoint, config: &GeofenceConfig) -> bool {
    evaluate(position, config).inside
}
