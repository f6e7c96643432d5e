//! Geofence geometry.
//!
//! This module contains the haversine distance calculator and the
//! inside/outside classifier built on top of it.

mod distance;
mod evaluator;

pub use distance::{EARTH_RADIUS_METERS, distance};
pub use evaluator::{GeofenceReading, evaluate, is_within_geofence};
