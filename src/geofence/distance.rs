//! Great-circle distance calculation.
//!
//! This module provides the haversine distance between two points on a
//! spherical Earth.

use crate::models::GeoPoint;

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Computes the great-circle distance between two points in meters.
///
/// Uses the haversine formula with [`EARTH_RADIUS_METERS`]. The result is
/// never negative, is zero for identical points, and is symmetric up to
/// floating-point rounding.
///
/// # Examples
///
/// ```
/// use geofence_attendance::geofence::distance;
/// use geofence_attendance::models::GeoPoint;
///
/// let office = GeoPoint::new(52.50735, 88.33658);
/// assert_eq!(distance(office, office), 0.0);
///
/// // One degree of latitude is roughly 111.2 km.
/// let north = GeoPoint::new(53.50735, 88.33658);
/// let meters = distance(office, north);
/// assert!((meters - 111_194.9).abs() < 1.0);
/// ```
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * central_angle
}
