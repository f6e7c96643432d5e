//! Automatic clock-out monitor.
//!
//! Tracks how long the device has continuously been outside the office
//! geofence and requests a clock-out once the grace period has elapsed while
//! a session is open.
//!
//! # State Machine
//!
//! ```text
//!             inside               outside (outside_since = now)
//!  Unknown ──────────► Inside ◄──────────────────────────────► Outside
//!     │                  ▲          inside (outside_since cleared)  │
//!     │     outside      │                                          │ elapsed >= grace
//!     └──────────────────┼────────────────────► Outside             ▼
//!                        │                                   OutsideExpired
//!                        │   inside                                 │ enabled + session:
//!                        └──────────────────────────────────────────┘ fire once, take the
//!                                                                     session, clear outside_since
//! ```
//!
//! - A failed sample leaves every field untouched.
//! - A firing takes the active session out of the state, so the same
//!   session can never be clocked out twice. The monitor stays `Outside`
//!   with no timer running; the next firing needs a new session and a
//!   fresh boundary crossing.
//! - With auto clock-out disabled or no open session, expiry is evaluated
//!   but nothing fires, and `outside_since` keeps its value. Enabling the
//!   feature mid-absence therefore fires on the next outside sample.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::config::GeofenceConfig;
use crate::error::TrackerResult;
use crate::geofence::{GeofenceReading, evaluate};
use crate::models::{GeoPoint, SessionId};

/// Geofence classification of the latest successful sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceStatus {
    /// No successful sample yet.
    Unknown,
    /// Last sample was on or within the radius.
    Inside,
    /// Last sample was beyond the radius.
    Outside,
}

/// The monitor's mutable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingState {
    /// Position of the latest successful sample.
    pub last_known_position: Option<GeoPoint>,
    /// Classification of the latest successful sample.
    pub status: GeofenceStatus,
    /// Start of the current timed outside period.
    pub outside_since: Option<DateTime<Utc>>,
    /// The open attendance session, if any.
    pub active_session: Option<SessionId>,
    /// Whether an expired grace period may trigger a clock-out.
    pub auto_clock_out_enabled: bool,
}

impl TrackingState {
    /// Returns true when the latest classification was inside.
    pub fn is_inside_geofence(&self) -> bool {
        self.status == GeofenceStatus::Inside
    }
}

/// How a sample moved the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Unknown or Outside to Inside.
    Entered,
    /// Unknown or Inside to Outside; the outside timer started.
    Exited,
    /// Inside before and after.
    StayedInside,
    /// Outside before and after.
    StayedOutside,
}

/// A clock-out the caller must perform on behalf of the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoClockOut {
    /// The session to close.
    pub session_id: SessionId,
    /// The sample that triggered the clock-out.
    pub position: GeoPoint,
    /// How long the device had been outside.
    pub outside_for: TimeDelta,
}

/// Result of feeding one successful sample to the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    /// Distance and classification of the sample.
    pub reading: GeofenceReading,
    /// State change caused by the sample.
    pub transition: Transition,
    /// True when the outside timer had reached the grace period.
    pub grace_expired: bool,
    /// Set when the monitor fired an automatic clock-out.
    pub clock_out: Option<AutoClockOut>,
}

/// The automatic clock-out state machine.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use geofence_attendance::config::GeofenceConfig;
/// use geofence_attendance::models::{GeoPoint, SessionId};
/// use geofence_attendance::tracker::AutoClockOutMonitor;
///
/// let office = GeoPoint::new(52.50735, 88.33658);
/// let away = GeoPoint::new(52.52, 88.33658);
/// let mut monitor = AutoClockOutMonitor::new(GeofenceConfig::new(office), true);
/// monitor.set_active_session(Some(SessionId::from(7)));
///
/// let start = Utc.with_ymd_and_hms(2025, 3, 14, 17, 0, 0).unwrap();
/// monitor.observe_position(away, start);
/// let outcome = monitor.observe_position(away, start + TimeDelta::seconds(10));
///
/// assert_eq!(outcome.clock_out.unwrap().session_id, SessionId::from(7));
/// assert!(monitor.state().outside_since.is_none());
/// assert!(monitor.state().active_session.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct AutoClockOutMonitor {
    geofence: GeofenceConfig,
    grace: TimeDelta,
    state: TrackingState,
}

impl AutoClockOutMonitor {
    /// Creates a monitor in the `Unknown` state with no open session.
    pub fn new(geofence: GeofenceConfig, auto_clock_out_enabled: bool) -> Self {
        let grace_ms = i64::try_from(geofence.outside_grace_ms).unwrap_or(i64::MAX);
        let grace = TimeDelta::try_milliseconds(grace_ms).unwrap_or(TimeDelta::MAX);
        Self {
            geofence,
            grace,
            state: TrackingState {
                last_known_position: None,
                status: GeofenceStatus::Unknown,
                outside_since: None,
                active_session: None,
                auto_clock_out_enabled,
            },
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// Returns the geofence being monitored.
    pub fn geofence(&self) -> &GeofenceConfig {
        &self.geofence
    }

    /// Sets or clears the open session. Takes effect on the next sample.
    pub fn set_active_session(&mut self, session: Option<SessionId>) {
        self.state.active_session = session;
    }

    /// Removes and returns the open session, e.g. when a manual clock-out is
    /// sent for it.
    pub fn take_session(&mut self) -> Option<SessionId> {
        self.state.active_session.take()
    }

    /// Toggles automatic clock-out. Takes effect on the next sample.
    pub fn set_auto_clock_out_enabled(&mut self, enabled: bool) {
        self.state.auto_clock_out_enabled = enabled;
    }

    /// Feeds one sampling result to the monitor.
    ///
    /// A failed sample is handed back unchanged and does not touch the state.
    pub fn observe(
        &mut self,
        sample: TrackerResult<GeoPoint>,
        now: DateTime<Utc>,
    ) -> TrackerResult<SampleOutcome> {
        let position = sample?;
        Ok(self.observe_position(position, now))
    }

    /// Feeds one successful position sample to the monitor.
    pub fn observe_position(&mut self, position: GeoPoint, now: DateTime<Utc>) -> SampleOutcome {
        let reading = evaluate(position, &self.geofence);
        self.state.last_known_position = Some(position);

        let previous = self.state.status;
        let mut grace_expired = false;
        let mut clock_out = None;

        let transition = match (previous, reading.inside) {
            (GeofenceStatus::Inside, true) => Transition::StayedInside,
            (GeofenceStatus::Unknown | GeofenceStatus::Outside, true) => {
                self.state.outside_since = None;
                self.state.status = GeofenceStatus::Inside;
                Transition::Entered
            }
            (GeofenceStatus::Unknown | GeofenceStatus::Inside, false) => {
                self.state.outside_since = Some(now);
                self.state.status = GeofenceStatus::Outside;
                Transition::Exited
            }
            (GeofenceStatus::Outside, false) => {
                if let Some(since) = self.state.outside_since {
                    let elapsed = now - since;
                    grace_expired = elapsed >= self.grace;

                    if grace_expired && self.state.auto_clock_out_enabled {
                        // The session leaves the monitor with the request.
                        if let Some(session_id) = self.state.active_session.take() {
                            self.state.outside_since = None;
                            clock_out = Some(AutoClockOut {
                                session_id,
                                position,
                                outside_for: elapsed,
                            });
                        }
                    }
                }
                Transition::StayedOutside
            }
        };

        SampleOutcome {
            reading,
            transition,
            grace_expired,
            clock_out,
        }
    }
}
