//! Platform location collaborators.
//!
//! The permission prompt and the GPS fix are platform services; the tracker
//! only depends on these two traits.

use async_trait::async_trait;

use crate::error::TrackerResult;
use crate::models::GeoPoint;

/// Obtains location-access authorization from the platform.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Returns true when the app may read the device location.
    ///
    /// Called once per sampling cycle; implementations may prompt the user.
    async fn request_permission(&self) -> bool;
}

/// Yields a best-effort current device position.
#[async_trait]
pub trait LocationSampler: Send + Sync {
    /// Acquires one position fix.
    ///
    /// Failures should be reported as
    /// [`TrackerError::SampleUnavailable`](crate::error::TrackerError::SampleUnavailable).
    /// The tracker bounds each call with the configured sample timeout.
    async fn current_position(&self) -> TrackerResult<GeoPoint>;
}

/// Permission gate for platforms without a runtime location prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

#[async_trait]
impl PermissionGate for AlwaysGranted {
    async fn request_permission(&self) -> bool {
        true
    }
}
