use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::deliveries::DeliveryApi;
use crate::error::AppError;
use crate::models::delivery::{CompletionReport, DeliveryTarget};
use crate::models::geo::{GeoPoint, TrackedPosition};
use crate::models::session::{SessionSnapshot, SessionState};
use crate::tracking::proximity::{evaluate, ProximityReading};
use crate::tracking::source::LocationError;
use crate::tracking::tracker::{PositionTracker, SubscriptionHandle, SubscriptionStatus};

/// Tracker callback output, tagged with the subscription that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerSignal {
    Position {
        generation: u64,
        position: TrackedPosition,
    },
    Failed {
        generation: u64,
        error: LocationError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Ignored,
    Moved(ProximityReading),
    Arrived(ProximityReading),
    Degraded(LocationError),
}

/// A completion report handed out to the backend call, tied to the session
/// that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCompletion {
    pub session_id: Uuid,
    pub report: CompletionReport,
}

#[derive(Debug)]
pub enum CompletionOutcome {
    /// The session moved on while the call was in flight.
    Stale,
    Completed(CompletionReport),
    Failed(AppError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub default_origin: GeoPoint,
    pub completion_rating: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_origin: GeoPoint::new(55.7536, 37.6201),
            completion_rating: 5.0,
        }
    }
}

/// One courier's delivery from acceptance to completion or cancellation.
///
/// `Idle -> Tracking -> Arrived -> Completed`, with `Tracking -> Cancelled`.
/// Completed and Cancelled rest like Idle until the next acceptance.
pub struct DeliverySession {
    tracker: PositionTracker,
    signals: mpsc::UnboundedSender<TrackerSignal>,
    settings: SessionSettings,
    state: SessionState,
    generation: u64,
    session_id: Option<Uuid>,
    target: Option<DeliveryTarget>,
    subscription: Option<SubscriptionHandle>,
    position: Option<TrackedPosition>,
    distance_m: Option<f64>,
    started_at: Option<DateTime<Utc>>,
    arrived_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    completion_pending: bool,
}

impl DeliverySession {
    pub fn new(
        tracker: PositionTracker,
        signals: mpsc::UnboundedSender<TrackerSignal>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            tracker,
            signals,
            settings,
            state: SessionState::Idle,
            generation: 0,
            session_id: None,
            target: None,
            subscription: None,
            position: None,
            distance_m: None,
            started_at: None,
            arrived_at: None,
            last_error: None,
            completion_pending: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn target(&self) -> Option<&DeliveryTarget> {
        self.target.as_ref()
    }

    pub fn position(&self) -> Option<TrackedPosition> {
        self.position
    }

    pub fn subscription_status(&self) -> Option<SubscriptionStatus> {
        self.subscription.as_ref().map(SubscriptionHandle::status)
    }

    pub fn completion_pending(&self) -> bool {
        self.completion_pending
    }

    /// Last real fix seen by the tracker, or the configured default while
    /// none has arrived.
    pub fn origin(&self) -> GeoPoint {
        self.position
            .or_else(|| self.tracker.latest())
            .map(|position| position.point)
            .unwrap_or(self.settings.default_origin)
    }

    pub fn accept_delivery(
        &mut self,
        target: DeliveryTarget,
        now: DateTime<Utc>,
    ) -> Result<Uuid, AppError> {
        if self.state.is_active() {
            return Err(AppError::Conflict(format!(
                "delivery {} is still in progress",
                self.target
                    .as_ref()
                    .map(|active| active.delivery_id.as_str())
                    .unwrap_or_default()
            )));
        }

        if target.delivery_id.trim().is_empty() {
            return Err(AppError::BadRequest("delivery_id cannot be empty".to_string()));
        }
        target.destination.validate()?;

        self.clear();
        self.generation += 1;
        let session_id = Uuid::new_v4();

        let generation = self.generation;
        let updates = self.signals.clone();
        let failures = self.signals.clone();
        let subscription = self.tracker.start_tracking(
            move |position| {
                let _ = updates.send(TrackerSignal::Position {
                    generation,
                    position,
                });
            },
            move |error| {
                let _ = failures.send(TrackerSignal::Failed { generation, error });
            },
        );

        info!(
            session_id = %session_id,
            delivery_id = %target.delivery_id,
            destination_lat = target.destination.latitude,
            destination_lon = target.destination.longitude,
            "delivery accepted; tracking started"
        );

        self.state = SessionState::Tracking;
        self.session_id = Some(session_id);
        self.target = Some(target);
        self.subscription = Some(subscription);
        self.started_at = Some(now);

        Ok(session_id)
    }

    /// Routes a tracker signal; signals from an earlier subscription are dropped.
    pub fn handle_signal(&mut self, signal: TrackerSignal, now: DateTime<Utc>) -> SessionUpdate {
        match signal {
            TrackerSignal::Position {
                generation,
                position,
            } if generation == self.generation => self.on_position(position, now),
            TrackerSignal::Failed { generation, error } if generation == self.generation => {
                self.on_location_error(error)
            }
            _ => {
                debug!("dropping signal from a stale location subscription");
                SessionUpdate::Ignored
            }
        }
    }

    pub fn on_position(&mut self, position: TrackedPosition, now: DateTime<Utc>) -> SessionUpdate {
        if self.state != SessionState::Tracking {
            return SessionUpdate::Ignored;
        }
        let Some(target) = self.target.as_ref() else {
            return SessionUpdate::Ignored;
        };

        let reading = evaluate(&position, target);
        self.position = Some(position);
        self.distance_m = Some(reading.distance_m);
        self.last_error = None;

        if !reading.arrived {
            return SessionUpdate::Moved(reading);
        }

        self.state = SessionState::Arrived;
        self.arrived_at = Some(now);
        info!(
            delivery_id = %target.delivery_id,
            distance_m = reading.distance_m,
            elapsed_seconds = self.elapsed_seconds(now),
            "courier arrived at destination"
        );
        self.stop_tracking();

        SessionUpdate::Arrived(reading)
    }

    pub fn on_location_error(&mut self, error: LocationError) -> SessionUpdate {
        if self.state != SessionState::Tracking {
            return SessionUpdate::Ignored;
        }

        let origin = self.origin();
        warn!(
            error = %error,
            origin_lat = origin.latitude,
            origin_lon = origin.longitude,
            "location unavailable; session keeps tracking"
        );
        self.last_error = Some(error.to_string());

        SessionUpdate::Degraded(error)
    }

    /// Whole seconds since acceptance, frozen at the arrival instant.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let end = self.arrived_at.unwrap_or(now);
        (end - started_at).num_seconds().max(0) as u64
    }

    pub fn completion_report(&self) -> Result<CompletionReport, AppError> {
        let target = match (self.state, self.target.as_ref()) {
            (SessionState::Arrived, Some(target)) => target,
            (state, _) => {
                return Err(AppError::Conflict(format!(
                    "cannot complete a delivery in state {state:?}"
                )));
            }
        };

        let end = self.arrived_at.unwrap_or_else(Utc::now);
        Ok(CompletionReport {
            delivery_id: target.delivery_id.clone(),
            delivery_time_minutes: elapsed_minutes(self.elapsed_seconds(end)),
            rating: self.settings.completion_rating,
        })
    }

    /// Marks a completion call as in flight. Only one call may be in flight
    /// per arrival; the result comes back through `finish_completion`.
    pub fn begin_completion(&mut self) -> Result<PendingCompletion, AppError> {
        let report = self.completion_report()?;
        if self.completion_pending {
            return Err(AppError::Conflict(format!(
                "completion of delivery {} is already in flight",
                report.delivery_id
            )));
        }
        let session_id = self
            .session_id
            .ok_or_else(|| AppError::Internal("arrived session without an id".to_string()))?;

        self.completion_pending = true;
        Ok(PendingCompletion { session_id, report })
    }

    /// Applies the backend's answer. On failure the session stays in
    /// `Arrived` so the caller can retry.
    pub fn finish_completion(
        &mut self,
        pending: PendingCompletion,
        result: Result<(), AppError>,
    ) -> CompletionOutcome {
        if !self.completion_pending || self.session_id != Some(pending.session_id) {
            debug!(
                session_id = %pending.session_id,
                "dropping completion result for a session that moved on"
            );
            return CompletionOutcome::Stale;
        }
        self.completion_pending = false;

        match result {
            Ok(()) => {
                info!(
                    delivery_id = %pending.report.delivery_id,
                    delivery_time_minutes = pending.report.delivery_time_minutes,
                    "delivery completed"
                );
                self.clear();
                self.state = SessionState::Completed;
                CompletionOutcome::Completed(pending.report)
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                CompletionOutcome::Failed(err)
            }
        }
    }

    /// Begins a completion and awaits the backend inline.
    pub async fn complete(&mut self, api: &dyn DeliveryApi) -> Result<CompletionReport, AppError> {
        let pending = self.begin_completion()?;
        let result = api.complete_delivery(&pending.report).await;

        match self.finish_completion(pending, result) {
            CompletionOutcome::Completed(report) => Ok(report),
            CompletionOutcome::Failed(err) => Err(err),
            CompletionOutcome::Stale => Err(AppError::Conflict(
                "delivery session changed during completion".to_string(),
            )),
        }
    }

    pub fn cancel(&mut self) -> Result<DeliveryTarget, AppError> {
        if self.state != SessionState::Tracking {
            return Err(AppError::Conflict(format!(
                "only a tracking delivery can be cancelled, session is {:?}",
                self.state
            )));
        }

        self.stop_tracking();
        let target = self
            .target
            .take()
            .ok_or_else(|| AppError::Internal("tracking session without a target".to_string()))?;

        info!(delivery_id = %target.delivery_id, "delivery cancelled");
        self.clear();
        self.state = SessionState::Cancelled;
        Ok(target)
    }

    /// Tears the session down from any state without reporting anything.
    pub fn dispose(&mut self) {
        if self.state.is_active() {
            warn!(state = ?self.state, "disposing an active delivery session");
        }
        self.clear();
        self.state = SessionState::Idle;
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        let elapsed_seconds = self.elapsed_seconds(now);
        SessionSnapshot {
            state: self.state,
            session_id: self.session_id,
            target: self.target.clone(),
            position: self.position,
            origin: self.origin(),
            distance_m: self.distance_m,
            started_at: self.started_at,
            elapsed_seconds,
            elapsed_display: format_elapsed(elapsed_seconds),
            last_error: self.last_error.clone(),
            completion_pending: self.completion_pending,
        }
    }

    fn stop_tracking(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            self.tracker.stop_tracking(&mut subscription);
        }
    }

    fn clear(&mut self) {
        self.stop_tracking();
        self.session_id = None;
        self.target = None;
        self.position = None;
        self.distance_m = None;
        self.started_at = None;
        self.arrived_at = None;
        self.last_error = None;
        self.completion_pending = false;
    }
}

pub fn elapsed_minutes(elapsed_seconds: u64) -> u64 {
    (elapsed_seconds as f64 / 60.0).round() as u64
}

pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {secs}s")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use tokio::sync::mpsc;

    use super::{
        elapsed_minutes, format_elapsed, CompletionOutcome, DeliverySession, SessionSettings,
        SessionUpdate, TrackerSignal,
    };
    use crate::client::deliveries::DeliveryApi;
    use crate::error::AppError;
    use crate::geo::destination_point;
    use crate::models::delivery::{CompletionReport, DeliveryTarget};
    use crate::models::geo::{GeoPoint, TrackedPosition};
    use crate::models::session::SessionState;
    use crate::tracking::source::{LocationError, LocationFeed, WatchOptions};
    use crate::tracking::tracker::PositionTracker;

    #[derive(Default)]
    struct RecordingApi {
        failing: AtomicBool,
        calls: AtomicUsize,
        reports: Mutex<Vec<CompletionReport>>,
    }

    #[async_trait]
    impl DeliveryApi for RecordingApi {
        async fn complete_delivery(&self, report: &CompletionReport) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reports.lock().unwrap().push(report.clone());
            if self.failing.load(Ordering::SeqCst) {
                Err(AppError::Upstream("backend unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        feed: LocationFeed,
        session: DeliverySession,
        signals: mpsc::UnboundedReceiver<TrackerSignal>,
    }

    fn fixture() -> Fixture {
        let feed = LocationFeed::new(16);
        let tracker = PositionTracker::new(Arc::new(feed.clone()), WatchOptions::default());
        let (tx, signals) = mpsc::unbounded_channel();
        Fixture {
            feed,
            session: DeliverySession::new(tracker, tx, SessionSettings::default()),
            signals,
        }
    }

    fn target() -> DeliveryTarget {
        DeliveryTarget {
            delivery_id: "17".to_string(),
            destination: GeoPoint::new(55.0, 37.0),
        }
    }

    fn at_distance(distance_m: f64, captured_at: DateTime<Utc>) -> TrackedPosition {
        TrackedPosition::new(destination_point(&target().destination, 90.0, distance_m), captured_at)
    }

    #[tokio::test]
    async fn accept_starts_tracking_and_rejects_a_second_delivery() {
        let mut fx = fixture();
        let now = Utc::now();

        fx.session.accept_delivery(target(), now).unwrap();
        assert_eq!(fx.session.state(), SessionState::Tracking);
        assert_eq!(fx.feed.subscriber_count(), 1);

        let second = fx.session.accept_delivery(target(), now);
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn accept_rejects_invalid_targets() {
        let mut fx = fixture();
        let bad = DeliveryTarget {
            delivery_id: "1".to_string(),
            destination: GeoPoint {
                latitude: 95.0,
                longitude: 0.0,
            },
        };
        assert!(matches!(
            fx.session.accept_delivery(bad, Utc::now()),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(fx.session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn tracker_samples_flow_through_signals() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();

        let sample = at_distance(120.0, now);
        fx.feed.publish(Ok(sample));
        let signal = fx.signals.recv().await.unwrap();

        match fx.session.handle_signal(signal, now) {
            SessionUpdate::Moved(reading) => assert!((reading.distance_m - 120.0).abs() < 0.1),
            other => panic!("unexpected update {other:?}"),
        }
        assert_eq!(fx.session.position(), Some(sample));
    }

    #[tokio::test]
    async fn arrival_fires_once_and_stops_tracking() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();
        let status = fx.session.subscription_status().unwrap();

        assert!(matches!(
            fx.session.on_position(at_distance(50.0, now), now),
            SessionUpdate::Moved(_)
        ));
        assert!(matches!(
            fx.session.on_position(at_distance(5.0, now), now),
            SessionUpdate::Arrived(_)
        ));
        assert_eq!(fx.session.state(), SessionState::Arrived);
        assert!(status.is_stopped());

        assert_eq!(
            fx.session.on_position(at_distance(2.0, now), now),
            SessionUpdate::Ignored
        );
        assert_eq!(fx.session.state(), SessionState::Arrived);
    }

    #[tokio::test]
    async fn failed_completion_keeps_arrived_and_allows_retry() {
        let mut fx = fixture();
        let api = RecordingApi::default();
        api.failing.store(true, Ordering::SeqCst);

        let started = Utc::now();
        fx.session.accept_delivery(target(), started).unwrap();
        let arrived = started + Duration::seconds(13 * 60 + 40);
        fx.session.on_position(at_distance(3.0, arrived), arrived);

        let first = fx.session.complete(&api).await;
        assert!(matches!(first, Err(AppError::Upstream(_))));
        assert_eq!(fx.session.state(), SessionState::Arrived);
        assert!(fx.session.snapshot(arrived).last_error.is_some());

        api.failing.store(false, Ordering::SeqCst);
        let report = fx.session.complete(&api).await.unwrap();
        assert_eq!(report.delivery_id, "17");
        assert_eq!(report.delivery_time_minutes, 14);
        assert_eq!(report.rating, 5.0);
        assert_eq!(fx.session.state(), SessionState::Completed);
        assert!(fx.session.target().is_none());

        let reports = api.reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], reports[1]);
    }

    #[tokio::test]
    async fn completion_requires_arrival() {
        let mut fx = fixture();
        let api = RecordingApi::default();
        fx.session.accept_delivery(target(), Utc::now()).unwrap();

        assert!(matches!(
            fx.session.complete(&api).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn only_one_completion_is_in_flight_per_arrival() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();
        fx.session.on_position(at_distance(2.0, now), now);

        let pending = fx.session.begin_completion().unwrap();
        assert!(fx.session.completion_pending());
        assert!(fx.session.snapshot(now).completion_pending);
        assert!(matches!(
            fx.session.begin_completion(),
            Err(AppError::Conflict(_))
        ));

        let outcome = fx.session.finish_completion(
            pending,
            Err(AppError::Upstream("backend unavailable".to_string())),
        );
        assert!(matches!(outcome, CompletionOutcome::Failed(AppError::Upstream(_))));
        assert_eq!(fx.session.state(), SessionState::Arrived);
        assert!(!fx.session.completion_pending());

        let retry = fx.session.begin_completion().unwrap();
        assert!(matches!(
            fx.session.finish_completion(retry, Ok(())),
            CompletionOutcome::Completed(_)
        ));
        assert_eq!(fx.session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn completion_result_after_dispose_is_stale() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();
        fx.session.on_position(at_distance(2.0, now), now);
        let pending = fx.session.begin_completion().unwrap();

        fx.session.dispose();
        fx.session.accept_delivery(target(), now).unwrap();

        assert!(matches!(
            fx.session.finish_completion(pending, Ok(())),
            CompletionOutcome::Stale
        ));
        assert_eq!(fx.session.state(), SessionState::Tracking);
    }

    #[tokio::test]
    async fn origin_keeps_the_last_fix_after_the_session_ends() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();

        let sample = at_distance(200.0, now);
        fx.feed.publish(Ok(sample));
        let signal = fx.signals.recv().await.unwrap();
        fx.session.handle_signal(signal, now);
        fx.session.cancel().unwrap();

        assert!(fx.session.position().is_none());
        assert_eq!(fx.session.origin(), sample.point);
        assert_eq!(fx.session.snapshot(now).origin, sample.point);
    }

    #[tokio::test]
    async fn cancel_stops_the_subscription_and_ignores_later_samples() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();
        let status = fx.session.subscription_status().unwrap();

        let cancelled = fx.session.cancel().unwrap();
        assert_eq!(cancelled.delivery_id, "17");
        assert!(status.is_stopped());
        assert_eq!(fx.session.state(), SessionState::Cancelled);

        assert_eq!(
            fx.session.on_position(at_distance(1.0, now), now),
            SessionUpdate::Ignored
        );
        let snapshot = fx.session.snapshot(now);
        assert_eq!(snapshot.state, SessionState::Cancelled);
        assert!(snapshot.target.is_none());
        assert!(snapshot.position.is_none());

        assert!(matches!(fx.session.cancel(), Err(AppError::Conflict(_))));
        fx.session.accept_delivery(target(), now).unwrap();
        assert_eq!(fx.session.state(), SessionState::Tracking);
    }

    #[tokio::test]
    async fn signals_from_a_previous_subscription_are_dropped() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();
        fx.session.cancel().unwrap();
        fx.session.accept_delivery(target(), now).unwrap();

        let stale = TrackerSignal::Position {
            generation: 1,
            position: at_distance(1.0, now),
        };
        assert_eq!(fx.session.handle_signal(stale, now), SessionUpdate::Ignored);
        assert_eq!(fx.session.state(), SessionState::Tracking);
    }

    #[tokio::test]
    async fn location_errors_degrade_to_the_default_origin() {
        let mut fx = fixture();
        let now = Utc::now();
        fx.session.accept_delivery(target(), now).unwrap();

        assert_eq!(
            fx.session.on_location_error(LocationError::PermissionDenied),
            SessionUpdate::Degraded(LocationError::PermissionDenied)
        );
        let snapshot = fx.session.snapshot(now);
        assert_eq!(snapshot.state, SessionState::Tracking);
        assert_eq!(snapshot.origin, SessionSettings::default().default_origin);
        assert!(snapshot.distance_m.is_none());
        assert_eq!(
            snapshot.last_error.as_deref(),
            Some("location permission denied")
        );

        let sample = at_distance(80.0, now);
        fx.session.on_position(sample, now);
        assert_eq!(fx.session.origin(), sample.point);
        assert!(fx.session.snapshot(now).last_error.is_none());
    }

    #[tokio::test]
    async fn elapsed_time_is_wall_clock_and_freezes_on_arrival() {
        let mut fx = fixture();
        let started = Utc::now();
        fx.session.accept_delivery(target(), started).unwrap();

        let later = started + Duration::seconds(95);
        assert_eq!(fx.session.elapsed_seconds(later), 95);
        assert_eq!(fx.session.snapshot(later).elapsed_display, "1m 35s");

        fx.session.on_position(at_distance(1.0, later), later);
        let much_later = later + Duration::hours(2);
        assert_eq!(fx.session.elapsed_seconds(much_later), 95);
    }

    #[tokio::test]
    async fn dispose_releases_tracking_from_any_state() {
        let mut fx = fixture();
        fx.session.accept_delivery(target(), Utc::now()).unwrap();
        let status = fx.session.subscription_status().unwrap();

        fx.session.dispose();
        assert!(status.is_stopped());
        assert_eq!(fx.session.state(), SessionState::Idle);
    }

    #[test]
    fn minutes_are_rounded() {
        assert_eq!(elapsed_minutes(0), 0);
        assert_eq!(elapsed_minutes(29), 0);
        assert_eq!(elapsed_minutes(30), 1);
        assert_eq!(elapsed_minutes(89), 1);
        assert_eq!(elapsed_minutes(90), 2);
    }

    #[test]
    fn elapsed_display_switches_to_hours() {
        assert_eq!(format_elapsed(0), "0m 0s");
        assert_eq!(format_elapsed(125), "2m 5s");
        assert_eq!(format_elapsed(3_600 + 7 * 60 + 12), "1h 7m");
    }
}
