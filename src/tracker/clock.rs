//! Time sources for the tracker.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

/// Clock abstraction so sampling timestamps can be controlled in tests.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time anchored once, then advanced by tokio's monotonic clock.
///
/// Elapsed-outside measurements are immune to wall-clock adjustments, and
/// follow virtual time when the tokio clock is paused.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor_wall: DateTime<Utc>,
    anchor: Instant,
}

impl MonotonicClock {
    /// Anchors a new clock at the current wall-clock time.
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// Anchors a new clock at the given wall-clock time.
    pub fn anchored_at(anchor_wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall,
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.anchor.elapsed())
            .ok()
            .and_then(|elapsed| self.anchor_wall.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
