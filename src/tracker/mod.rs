//! Location tracking and automatic clock-out.
//!
//! [`AutoClockOutMonitor`] is the pure state machine; [`SamplingLoop`] drives
//! it from a periodic sampler on a tokio task and performs the clock-out
//! calls it requests.

mod clock;
mod driver;
mod monitor;
mod source;

pub use clock::{Clock, MonotonicClock};
pub use driver::{LocationSnapshot, SamplingLoop, TrackerEvent, TrackerHandle};
pub use monitor::{
    AutoClockOut, AutoClockOutMonitor, GeofenceStatus, SampleOutcome, TrackingState, Transition,
};
pub use source::{AlwaysGranted, LocationSampler, PermissionGate};
