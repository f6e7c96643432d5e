//! Geographic point model.
//!
//! This module defines the GeoPoint value type used both for sampled device
//! positions and for the fixed office target.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
///
/// # Examples
///
/// ```
/// use geofence_attendance::models::GeoPoint;
///
/// let office = GeoPoint::new(52.50735, 88.33658);
/// assert_eq!(office.latitude, 52.50735);
/// assert_eq!(office.longitude, 88.33658);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point from latitude and longitude in degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true when both coordinates are finite and within their
    /// valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        assert!(GeoPoint::new(22.50735, 88.33658).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
    }

    #[test]
    fn test_out_of_range_latitude_is_invalid() {
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
    }

    #[test]
    fn test_out_of_range_longitude_is_invalid() {
        assert!(!GeoPoint::new(0.0, -181.0).is_valid());
    }

    #[test]
    fn test_nan_is_invalid() {
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_serializes_with_full_field_names() {
        let json = serde_json::to_string(&GeoPoint::new(1.5, -2.25)).unwrap();
        assert_eq!(json, r#"{"latitude":1.5,"longitude":-2.25}"#);
    }
}
