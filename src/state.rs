use std::sync::Arc;

use tokio::sync::broadcast;

use crate::client::deliveries::DeliveryApi;
use crate::config::Config;
use crate::engine::service::{SessionHandle, SessionService};
use crate::engine::session::SessionSettings;
use crate::error::AppError;
use crate::models::session::SessionEvent;
use crate::observability::metrics::Metrics;
use crate::routing::estimator::RouteEstimator;
use crate::routing::provider::RoutingProvider;
use crate::tracking::source::{LocationFeed, WatchOptions};
use crate::tracking::tracker::PositionTracker;

pub struct AppState {
    pub session: SessionHandle,
    pub routes: RouteEstimator,
    pub location_feed: LocationFeed,
    pub session_events_tx: broadcast::Sender<SessionEvent>,
    pub metrics: Metrics,
}

impl AppState {
    /// Builds the shared state and the session service that must be spawned
    /// for session commands to be answered.
    pub fn new(
        config: &Config,
        routing: Arc<dyn RoutingProvider>,
        deliveries: Arc<dyn DeliveryApi>,
    ) -> Result<(Self, SessionService), AppError> {
        let metrics = Metrics::new();
        let location_feed = LocationFeed::new(config.location_feed_size);
        let (session_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size.max(1));
        let (session, commands) = SessionHandle::channel(config.command_queue_size);

        let tracker = PositionTracker::new(
            Arc::new(location_feed.clone()),
            WatchOptions {
                timeout: config.location_timeout(),
                ..WatchOptions::default()
            },
        );
        let settings = SessionSettings {
            default_origin: config.default_origin()?,
            completion_rating: config.completion_rating,
        };
        let service = SessionService::new(
            tracker,
            settings,
            deliveries,
            session_events_tx.clone(),
            metrics.clone(),
            commands,
        );

        let routes = RouteEstimator::new(routing, config.route_timeout(), metrics.clone());

        Ok((
            Self {
                session,
                routes,
                location_feed,
                session_events_tx,
                metrics,
            },
            service,
        ))
    }
}
