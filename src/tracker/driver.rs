//! Fixed-cadence sampling loop.
//!
//! One tokio task owns the [`AutoClockOutMonitor`]; every state change
//! happens inside that task. Each tick checks permission, takes one sample
//! bounded by the sample timeout, feeds the monitor, and republishes a
//! [`LocationSnapshot`].
//!
//! A tick that arrives while the previous sample is still pending is
//! skipped, so samples are applied in order and never overlap. Clock-out
//! calls run on their own tasks and report back through a channel, so a slow
//! service never delays the next tick.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::TimeDelta;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};

use crate::client::AttendanceSessionClient;
use crate::config::{GeofenceConfig, SamplingConfig};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{GeoPoint, SessionId};

use super::clock::{Clock, MonotonicClock};
use super::monitor::{AutoClockOutMonitor, SampleOutcome, Transition, TrackingState};
use super::source::{LocationSampler, PermissionGate};

type SampleFuture = Pin<Box<dyn Future<Output = TrackerResult<GeoPoint>> + Send>>;

/// Latest location state published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationSnapshot {
    /// Position of the latest successful sample.
    pub position: Option<GeoPoint>,
    /// Whether that position was inside the geofence.
    pub inside: bool,
    /// True until the first sampling attempt completes.
    pub loading: bool,
}

impl Default for LocationSnapshot {
    fn default() -> Self {
        Self {
            position: None,
            inside: false,
            loading: true,
        }
    }
}

/// Notices emitted by the sampling loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// Location access was refused this cycle.
    PermissionDenied,
    /// The sampler failed or timed out this cycle.
    SampleUnavailable {
        /// Sampler failure description.
        message: String,
    },
    /// The grace period expired with an open session; a clock-out was sent.
    AutoClockOutRequested {
        /// The session being closed.
        session_id: SessionId,
        /// How long the device had been outside.
        outside_for: TimeDelta,
    },
    /// The service accepted a clock-out.
    ClockedOut {
        /// The closed session.
        session_id: SessionId,
        /// True for a clock-out fired by the monitor.
        automatic: bool,
    },
    /// The service rejected a clock-out; the session is still presumed closed.
    ClockOutFailed {
        /// The session that was being closed.
        session_id: SessionId,
        /// True for a clock-out fired by the monitor.
        automatic: bool,
        /// The remote failure.
        error: TrackerError,
    },
}

enum TrackerCommand {
    SetAutoClockOut(bool),
    SetActiveSession(Option<SessionId>),
    ClockOutNow(oneshot::Sender<TrackerResult<SessionId>>),
    State(oneshot::Sender<TrackingState>),
}

struct ClockOutCompletion {
    session_id: SessionId,
    automatic: bool,
    result: TrackerResult<()>,
    reply: Option<oneshot::Sender<TrackerResult<SessionId>>>,
}

/// Builder and launcher of tracking sessions.
///
/// Each call to [`SamplingLoop::start`] begins in the `Unknown` state with
/// no memory of earlier runs.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use geofence_attendance::client::HttpAttendanceClient;
/// use geofence_attendance::config::ConfigLoader;
/// use geofence_attendance::tracker::{AlwaysGranted, LocationSampler, SamplingLoop};
///
/// # async fn run(sampler: Arc<dyn LocationSampler>) -> geofence_attendance::error::TrackerResult<()> {
/// let config = ConfigLoader::load("./config/office")?;
/// let client = Arc::new(HttpAttendanceClient::new(config.tracker().api_base_url.clone())?);
///
/// let mut handle = SamplingLoop::new(
///     *config.geofence(),
///     config.tracker().sampling,
///     Arc::new(AlwaysGranted),
///     sampler,
///     client,
/// )
/// .start();
///
/// while let Some(event) = handle.next_event().await {
///     println!("{event:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SamplingLoop {
    geofence: GeofenceConfig,
    sampling: SamplingConfig,
    auto_clock_out_enabled: bool,
    initial_session: Option<SessionId>,
    permission: Arc<dyn PermissionGate>,
    sampler: Arc<dyn LocationSampler>,
    client: Arc<dyn AttendanceSessionClient>,
    clock: Arc<dyn Clock>,
}

impl SamplingLoop {
    /// Creates a loop with auto clock-out enabled and no open session.
    pub fn new(
        geofence: GeofenceConfig,
        sampling: SamplingConfig,
        permission: Arc<dyn PermissionGate>,
        sampler: Arc<dyn LocationSampler>,
        client: Arc<dyn AttendanceSessionClient>,
    ) -> Self {
        Self {
            geofence,
            sampling,
            auto_clock_out_enabled: true,
            initial_session: None,
            permission,
            sampler,
            client,
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    /// Sets the initial auto clock-out toggle.
    pub fn with_auto_clock_out(mut self, enabled: bool) -> Self {
        self.auto_clock_out_enabled = enabled;
        self
    }

    /// Sets the session that is already open when tracking starts.
    pub fn with_active_session(mut self, session: Option<SessionId>) -> Self {
        self.initial_session = session;
        self
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Spawns the sampling task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self) -> TrackerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(LocationSnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let mut monitor = AutoClockOutMonitor::new(self.geofence, self.auto_clock_out_enabled);
        monitor.set_active_session(self.initial_session.clone());

        let worker = Worker {
            monitor,
            sampling: self.sampling,
            permission: Arc::clone(&self.permission),
            sampler: Arc::clone(&self.sampler),
            client: Arc::clone(&self.client),
            clock: Arc::clone(&self.clock),
            events: event_tx,
            snapshots: snapshot_tx,
            completion_tx,
        };

        info!(
            interval_ms = self.sampling.interval_ms,
            radius_meters = self.geofence.radius_meters,
            outside_grace_ms = self.geofence.outside_grace_ms,
            "Starting location tracker"
        );
        let task = tokio::spawn(worker.run(command_rx, completion_rx, shutdown_rx));

        TrackerHandle {
            commands: command_tx,
            events: event_rx,
            snapshots: snapshot_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Control surface of a running tracker.
///
/// Dropping the handle stops the tracker.
pub struct TrackerHandle {
    commands: mpsc::UnboundedSender<TrackerCommand>,
    events: mpsc::UnboundedReceiver<TrackerEvent>,
    snapshots: watch::Receiver<LocationSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TrackerHandle {
    /// Returns a receiver of the latest [`LocationSnapshot`].
    pub fn snapshots(&self) -> watch::Receiver<LocationSnapshot> {
        self.snapshots.clone()
    }

    /// Returns the latest published snapshot.
    pub fn snapshot(&self) -> LocationSnapshot {
        *self.snapshots.borrow()
    }

    /// Waits for the next event. `None` once the tracker has stopped and
    /// every event was drained.
    pub async fn next_event(&mut self) -> Option<TrackerEvent> {
        self.events.recv().await
    }

    /// Returns an already-queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<TrackerEvent> {
        self.events.try_recv().ok()
    }

    /// Toggles automatic clock-out from the next processed sample on.
    pub fn set_auto_clock_out(&self, enabled: bool) -> TrackerResult<()> {
        self.send(TrackerCommand::SetAutoClockOut(enabled))
    }

    /// Sets or clears the open session, e.g. after a clock-in.
    pub fn set_active_session(&self, session: Option<SessionId>) -> TrackerResult<()> {
        self.send(TrackerCommand::SetActiveSession(session))
    }

    /// Clocks out the open session at the last known position and waits for
    /// the service's answer.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NoActiveSession`] when nothing is open,
    /// [`TrackerError::SampleUnavailable`] before the first successful
    /// sample, or the remote failure.
    pub async fn clock_out_now(&self) -> TrackerResult<SessionId> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TrackerCommand::ClockOutNow(reply_tx))?;
        reply_rx.await.map_err(|_| TrackerError::TrackerStopped)?
    }

    /// Returns a copy of the monitor state.
    pub async fn state(&self) -> TrackerResult<TrackingState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TrackerCommand::State(reply_tx))?;
        reply_rx.await.map_err(|_| TrackerError::TrackerStopped)
    }

    /// Stops the tracker and waits for the sampling task to exit.
    ///
    /// Any in-flight sample is abandoned and no further transition is
    /// applied.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(error = %error, "Location tracker task ended abnormally");
            }
        }
    }

    fn send(&self, command: TrackerCommand) -> TrackerResult<()> {
        self.commands
            .send(command)
            .map_err(|_| TrackerError::TrackerStopped)
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

struct Worker {
    monitor: AutoClockOutMonitor,
    sampling: SamplingConfig,
    permission: Arc<dyn PermissionGate>,
    sampler: Arc<dyn LocationSampler>,
    client: Arc<dyn AttendanceSessionClient>,
    clock: Arc<dyn Clock>,
    events: mpsc::UnboundedSender<TrackerEvent>,
    snapshots: watch::Sender<LocationSnapshot>,
    completion_tx: mpsc::UnboundedSender<ClockOutCompletion>,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<TrackerCommand>,
        mut completions: mpsc::UnboundedReceiver<ClockOutCompletion>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut ticker = interval(self.sampling.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<SampleFuture> = None;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                Some(command) = commands.recv() => self.handle_command(command),
                Some(completion) = completions.recv() => self.handle_completion(completion),
                sample = next_sample(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    self.apply_sample(sample);
                }
                _ = ticker.tick() => {
                    if in_flight.is_some() {
                        debug!("Previous sample still pending, skipping cycle");
                    } else {
                        in_flight = Some(self.acquire());
                    }
                }
            }
        }

        info!("Location tracker stopped");
    }

    fn acquire(&self) -> SampleFuture {
        let permission = Arc::clone(&self.permission);
        let sampler = Arc::clone(&self.sampler);
        let sample_timeout = self.sampling.sample_timeout();

        Box::pin(async move {
            if !permission.request_permission().await {
                return Err(TrackerError::PermissionDenied);
            }
            let position = match timeout(sample_timeout, sampler.current_position()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(TrackerError::SampleUnavailable {
                        message: format!("no location fix within {}ms", sample_timeout.as_millis()),
                    });
                }
            };
            if !position.is_valid() {
                return Err(TrackerError::SampleUnavailable {
                    message: format!(
                        "sampler returned invalid coordinates ({}, {})",
                        position.latitude, position.longitude
                    ),
                });
            }
            Ok(position)
        })
    }

    fn apply_sample(&mut self, sample: TrackerResult<GeoPoint>) {
        let now = self.clock.now();

        match self.monitor.observe(sample, now) {
            Ok(outcome) => self.publish_outcome(outcome),
            Err(error) => {
                self.snapshots.send_modify(|snapshot| snapshot.loading = false);
                match error {
                    TrackerError::PermissionDenied => {
                        warn!("Permission denied to access location");
                        self.emit(TrackerEvent::PermissionDenied);
                    }
                    other => {
                        let message = match other {
                            TrackerError::SampleUnavailable { message } => message,
                            other => other.to_string(),
                        };
                        warn!(error = %message, "Error getting location");
                        self.emit(TrackerEvent::SampleUnavailable { message });
                    }
                }
            }
        }
    }

    fn publish_outcome(&mut self, outcome: SampleOutcome) {
        let position = self.monitor.state().last_known_position;
        self.snapshots.send_replace(LocationSnapshot {
            position,
            inside: outcome.reading.inside,
            loading: false,
        });

        match outcome.transition {
            Transition::Entered => info!(
                distance_meters = outcome.reading.distance_meters,
                "Entered office geofence"
            ),
            Transition::Exited => info!(
                distance_meters = outcome.reading.distance_meters,
                "Left office geofence"
            ),
            Transition::StayedInside | Transition::StayedOutside => {}
        }

        if let Some(fired) = outcome.clock_out {
            info!(
                session_id = %fired.session_id,
                outside_ms = fired.outside_for.num_milliseconds(),
                "Outside grace period expired, clocking out"
            );
            self.emit(TrackerEvent::AutoClockOutRequested {
                session_id: fired.session_id.clone(),
                outside_for: fired.outside_for,
            });
            self.dispatch_clock_out(fired.session_id, fired.position, true, None);
        }
    }

    fn handle_command(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::SetAutoClockOut(enabled) => {
                info!(enabled, "Auto clock-out toggled");
                self.monitor.set_auto_clock_out_enabled(enabled);
            }
            TrackerCommand::SetActiveSession(session) => {
                debug!(session_id = ?session, "Active session updated");
                self.monitor.set_active_session(session);
            }
            TrackerCommand::ClockOutNow(reply) => {
                let state = self.monitor.state();
                if state.active_session.is_none() {
                    let _ = reply.send(Err(TrackerError::NoActiveSession));
                    return;
                }
                let Some(position) = state.last_known_position else {
                    let _ = reply.send(Err(TrackerError::SampleUnavailable {
                        message: "no position sampled yet".to_string(),
                    }));
                    return;
                };
                // Taken before the call so nothing else can close it meanwhile.
                let Some(session_id) = self.monitor.take_session() else {
                    let _ = reply.send(Err(TrackerError::NoActiveSession));
                    return;
                };
                self.dispatch_clock_out(session_id, position, false, Some(reply));
            }
            TrackerCommand::State(reply) => {
                let _ = reply.send(self.monitor.state().clone());
            }
        }
    }

    fn dispatch_clock_out(
        &self,
        session_id: SessionId,
        position: GeoPoint,
        automatic: bool,
        reply: Option<oneshot::Sender<TrackerResult<SessionId>>>,
    ) {
        let client = Arc::clone(&self.client);
        let completion_tx = self.completion_tx.clone();
        let at = self.clock.now().naive_utc();

        tokio::spawn(async move {
            let result = client.clock_out(&session_id, position, at).await;
            let _ = completion_tx.send(ClockOutCompletion {
                session_id,
                automatic,
                result,
                reply,
            });
        });
    }

    fn handle_completion(&mut self, completion: ClockOutCompletion) {
        let ClockOutCompletion {
            session_id,
            automatic,
            result,
            reply,
        } = completion;

        // The session left the monitor at dispatch; failed writes are not
        // retried.
        let reply_value = match result {
            Ok(()) => {
                self.emit(TrackerEvent::ClockedOut {
                    session_id: session_id.clone(),
                    automatic,
                });
                Ok(session_id)
            }
            Err(error) => {
                warn!(session_id = %session_id, automatic, error = %error, "Clock-out failed");
                self.emit(TrackerEvent::ClockOutFailed {
                    session_id,
                    automatic,
                    error: error.clone(),
                });
                Err(error)
            }
        };

        if let Some(reply) = reply {
            let _ = reply.send(reply_value);
        }
    }

    fn emit(&self, event: TrackerEvent) {
        // The handle may have stopped listening; events are best-effort.
        let _ = self.events.send(event);
    }
}

async fn next_sample(in_flight: &mut Option<SampleFuture>) -> TrackerResult<GeoPoint> {
    match in_flight {
        Some(sample) => sample.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::EARTH_RADIUS_METERS;
    use crate::models::AttendanceRecord;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn office() -> GeoPoint {
        GeoPoint::new(52.50735, 88.33658)
    }

    fn point_north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint::new(
            origin.latitude + (meters / EARTH_RADIUS_METERS).to_degrees(),
            origin.longitude,
        )
    }

    fn inside() -> GeoPoint {
        point_north_of(office(), 5.0)
    }

    fn outside() -> GeoPoint {
        point_north_of(office(), 500.0)
    }

    /// Replays scripted samples, repeating the last one forever.
    struct ScriptedSampler {
        script: Mutex<VecDeque<TrackerResult<GeoPoint>>>,
        last: Mutex<TrackerResult<GeoPoint>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedSampler {
        fn new(script: Vec<TrackerResult<GeoPoint>>) -> Self {
            Self::with_delay(script, Duration::ZERO)
        }

        fn with_delay(script: Vec<TrackerResult<GeoPoint>>, delay: Duration) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(Ok(inside())),
                delay,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LocationSampler for ScriptedSampler {
        async fn current_position(&self) -> TrackerResult<GeoPoint> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(sample) => {
                    *self.last.lock().unwrap() = sample.clone();
                    sample
                }
                None => self.last.lock().unwrap().clone(),
            }
        }
    }

    struct SwitchablePermission(AtomicBool);

    #[async_trait]
    impl PermissionGate for SwitchablePermission {
        async fn request_permission(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingClient {
        clock_outs: Mutex<Vec<(SessionId, GeoPoint)>>,
        reject: AtomicBool,
        latency: Duration,
    }

    impl RecordingClient {
        fn slow(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        fn closed_sessions(&self) -> Vec<SessionId> {
            self.clock_outs
                .lock()
                .unwrap()
                .iter()
                .map(|(session, _)| session.clone())
                .collect()
        }
    }

    #[async_trait]
    impl AttendanceSessionClient for RecordingClient {
        async fn attendance_for(
            &self,
            _employee_id: i64,
            _date: NaiveDate,
        ) -> TrackerResult<Vec<AttendanceRecord>> {
            Ok(Vec::new())
        }

        async fn clock_in(
            &self,
            _employee_id: i64,
            _position: GeoPoint,
            _at: NaiveDateTime,
        ) -> TrackerResult<SessionId> {
            Ok(SessionId::from(1))
        }

        async fn clock_out(
            &self,
            session_id: &SessionId,
            position: GeoPoint,
            _at: NaiveDateTime,
        ) -> TrackerResult<()> {
            self.clock_outs
                .lock()
                .unwrap()
                .push((session_id.clone(), position));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.reject.load(Ordering::SeqCst) {
                Err(TrackerError::RemoteWriteFailed {
                    operation: "clock_out".to_string(),
                    message: "HTTP 500".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn sampling() -> SamplingConfig {
        SamplingConfig {
            interval_ms: 1_000,
            sample_timeout_ms: 60_000,
        }
    }

    fn tracker(
        sampler: Arc<ScriptedSampler>,
        client: Arc<RecordingClient>,
        permission: bool,
    ) -> SamplingLoop {
        SamplingLoop::new(
            GeofenceConfig::new(office()),
            sampling(),
            Arc::new(SwitchablePermission(AtomicBool::new(permission))),
            sampler,
            client,
        )
    }

    /// Lets the tracker run for `seconds` of virtual time.
    async fn run_for(seconds: u64) {
        for _ in 0..seconds {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        // Let spawned clock-out tasks report back.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(handle: &mut TrackerHandle) -> Vec<TrackerEvent> {
        std::iter::from_fn(|| handle.try_next_event()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_snapshot_after_first_sample() {
        let sampler = Arc::new(ScriptedSampler::new(vec![Ok(inside())]));
        let client = Arc::new(RecordingClient::default());
        let handle = tracker(sampler, client, true).start();

        assert!(handle.snapshot().loading);
        run_for(1).await;

        let snapshot = handle.snapshot();
        assert!(!snapshot.loading);
        assert!(snapshot.inside);
        assert_eq!(snapshot.position, Some(inside()));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_clock_out_after_sustained_absence() {
        let mut script = vec![Ok(inside())];
        script.extend(std::iter::repeat_n(Ok(outside()), 30));
        let sampler = Arc::new(ScriptedSampler::new(script));
        let client = Arc::new(RecordingClient::default());

        let mut handle = tracker(sampler, client.clone(), true)
            .with_active_session(Some(SessionId::from(9)))
            .start();

        run_for(20).await;

        let clock_outs = client.clock_outs.lock().unwrap().clone();
        assert_eq!(clock_outs, vec![(SessionId::from(9), outside())]);

        let events = drain(&mut handle);
        assert!(events.iter().any(|e| matches!(
            e,
            TrackerEvent::AutoClockOutRequested { session_id, .. } if *session_id == SessionId::from(9)
        )));
        assert!(events.contains(&TrackerEvent::ClockedOut {
            session_id: SessionId::from(9),
            automatic: true,
        }));

        let state = handle.state().await.unwrap();
        assert_eq!(state.active_session, None);
        assert!(state.outside_since.is_none());
        assert!(!handle.snapshot().inside);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_auto_clock_out_never_calls_service() {
        let sampler = Arc::new(ScriptedSampler::new(vec![Ok(inside()), Ok(outside())]));
        let client = Arc::new(RecordingClient::default());

        let handle = tracker(sampler, client.clone(), true)
            .with_auto_clock_out(false)
            .with_active_session(Some(SessionId::from(9)))
            .start();

        run_for(60).await;

        assert!(client.clock_outs.lock().unwrap().is_empty());
        let state = handle.state().await.unwrap();
        assert!(state.outside_since.is_some());
        assert_eq!(state.active_session, Some(SessionId::from(9)));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabling_mid_absence_takes_effect_on_next_sample() {
        let sampler = Arc::new(ScriptedSampler::new(vec![Ok(inside()), Ok(outside())]));
        let client = Arc::new(RecordingClient::default());

        let handle = tracker(sampler, client.clone(), true)
            .with_auto_clock_out(false)
            .with_active_session(Some(SessionId::from(9)))
            .start();

        run_for(30).await;
        assert!(client.clock_outs.lock().unwrap().is_empty());

        handle.set_auto_clock_out(true).unwrap();
        run_for(2).await;

        assert_eq!(client.clock_outs.lock().unwrap().len(), 1);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_reports_and_keeps_sampling() {
        let sampler = Arc::new(ScriptedSampler::new(vec![Ok(inside())]));
        let client = Arc::new(RecordingClient::default());
        let permission = Arc::new(SwitchablePermission(AtomicBool::new(false)));

        let mut handle = SamplingLoop::new(
            GeofenceConfig::new(office()),
            sampling(),
            permission.clone(),
            sampler.clone(),
            client,
        )
        .start();

        run_for(3).await;
        let events = drain(&mut handle);
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| *e == TrackerEvent::PermissionDenied));
        assert_eq!(sampler.calls.load(Ordering::SeqCst), 0);
        assert!(!handle.snapshot().loading);
        assert_eq!(handle.snapshot().position, None);

        permission.0.store(true, Ordering::SeqCst);
        run_for(2).await;
        assert_eq!(handle.snapshot().position, Some(inside()));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_failure_does_not_change_state() {
        let sampler = Arc::new(ScriptedSampler::new(vec![
            Ok(outside()),
            Err(TrackerError::SampleUnavailable {
                message: "no satellites".to_string(),
            }),
        ]));
        let client = Arc::new(RecordingClient::default());
        let mut handle = tracker(sampler, client, true).start();

        run_for(4).await;

        let events = drain(&mut handle);
        assert!(events.contains(&TrackerEvent::SampleUnavailable {
            message: "no satellites".to_string(),
        }));
        let state = handle.state().await.unwrap();
        assert_eq!(state.last_known_position, Some(outside()));
        assert!(state.outside_since.is_some());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_sample_skips_overlapping_ticks() {
        let sampler = Arc::new(ScriptedSampler::with_delay(
            vec![Ok(inside())],
            Duration::from_millis(2_500),
        ));
        let client = Arc::new(RecordingClient::default());
        let handle = tracker(sampler.clone(), client, true).start();

        run_for(9).await;

        // Samples start at t=0, 3, 6 and 9; ticks in between are skipped.
        let calls = sampler.calls.load(Ordering::SeqCst);
        assert!(calls <= 4, "expected skipped ticks, got {calls} samples");
        assert!(calls >= 3);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_timeout_reported_as_unavailable() {
        let sampler = Arc::new(ScriptedSampler::with_delay(
            vec![Ok(inside())],
            Duration::from_secs(120),
        ));
        let client = Arc::new(RecordingClient::default());
        let mut handle = tracker(sampler, client, true).start();

        run_for(61).await;

        let events = drain(&mut handle);
        assert!(matches!(
            events.first(),
            Some(TrackerEvent::SampleUnavailable { message }) if message.contains("60000ms")
        ));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_clock_out_is_reported_and_not_retried() {
        let mut script = vec![Ok(inside())];
        script.extend(std::iter::repeat_n(Ok(outside()), 60));
        let sampler = Arc::new(ScriptedSampler::new(script));
        let client = Arc::new(RecordingClient::default());
        client.reject.store(true, Ordering::SeqCst);

        let mut handle = tracker(sampler, client.clone(), true)
            .with_active_session(Some(SessionId::from(9)))
            .start();

        run_for(50).await;

        assert_eq!(client.clock_outs.lock().unwrap().len(), 1);
        let events = drain(&mut handle);
        assert!(events.iter().any(|e| matches!(
            e,
            TrackerEvent::ClockOutFailed { automatic: true, .. }
        )));
        assert_eq!(handle.state().await.unwrap().active_session, None);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_clock_out_is_not_repeated_after_reentry() {
        let mut script = vec![Ok(inside())];
        script.extend(std::iter::repeat_n(Ok(outside()), 11));
        script.push(Ok(inside()));
        script.extend(std::iter::repeat_n(Ok(outside()), 12));
        let sampler = Arc::new(ScriptedSampler::new(script));
        let client = Arc::new(RecordingClient::slow(Duration::from_secs(25)));

        let handle = tracker(sampler, client.clone(), true)
            .with_active_session(Some(SessionId::from(9)))
            .start();

        // Fires at t=11, back inside at t=12, out again from t=13 while the
        // first call is still running.
        run_for(26).await;

        assert_eq!(client.closed_sessions(), vec![SessionId::from(9)]);
        assert_eq!(handle.state().await.unwrap().active_session, None);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_clock_out_while_auto_clock_out_pending() {
        let mut script = vec![Ok(inside())];
        script.extend(std::iter::repeat_n(Ok(outside()), 30));
        let sampler = Arc::new(ScriptedSampler::new(script));
        let client = Arc::new(RecordingClient::slow(Duration::from_secs(25)));

        let handle = tracker(sampler, client.clone(), true)
            .with_active_session(Some(SessionId::from(9)))
            .start();

        run_for(13).await;
        assert_eq!(client.closed_sessions(), vec![SessionId::from(9)]);

        assert_eq!(
            handle.clock_out_now().await,
            Err(TrackerError::NoActiveSession)
        );
        assert_eq!(client.closed_sessions(), vec![SessionId::from(9)]);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_clock_out_uses_last_position() {
        let sampler = Arc::new(ScriptedSampler::new(vec![Ok(inside())]));
        let client = Arc::new(RecordingClient::default());
        let handle = tracker(sampler, client.clone(), true).start();

        run_for(1).await;
        assert_eq!(
            handle.clock_out_now().await,
            Err(TrackerError::NoActiveSession)
        );

        handle.set_active_session(Some(SessionId::from(3))).unwrap();
        let closed = handle.clock_out_now().await.unwrap();

        assert_eq!(closed, SessionId::from(3));
        assert_eq!(
            client.clock_outs.lock().unwrap().clone(),
            vec![(SessionId::from(3), inside())]
        );
        assert_eq!(handle.state().await.unwrap().active_session, None);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_sampling() {
        let sampler = Arc::new(ScriptedSampler::new(vec![Ok(inside())]));
        let client = Arc::new(RecordingClient::default());
        let handle = tracker(sampler.clone(), client, true).start();

        run_for(3).await;
        let commands = handle.commands.clone();
        handle.stop().await;
        let calls_at_stop = sampler.calls.load(Ordering::SeqCst);

        run_for(5).await;
        assert_eq!(sampler.calls.load(Ordering::SeqCst), calls_at_stop);
        assert!(commands.send(TrackerCommand::SetAutoClockOut(true)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_begins_unknown() {
        let sampler = Arc::new(ScriptedSampler::new(vec![Ok(outside())]));
        let client = Arc::new(RecordingClient::default());
        let tracking = tracker(sampler, client, true);

        let handle = tracking.start();
        run_for(3).await;
        assert!(handle.state().await.unwrap().outside_since.is_some());
        handle.stop().await;

        let handle = tracking.start();
        let state = handle.state().await.unwrap();
        assert_eq!(state.status, crate::tracker::GeofenceStatus::Unknown);
        assert!(state.outside_since.is_none());
        handle.stop().await;
    }
}
