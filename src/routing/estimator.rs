use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::geo::haversine_m;
use crate::models::geo::GeoPoint;
use crate::models::route::RouteEstimate;
use crate::observability::metrics::Metrics;
use crate::routing::provider::{RouteRequest, RoutingError, RoutingProvider};

pub const DEFAULT_ROUTE_TIMEOUT: Duration = Duration::from_millis(4000);

const DEFAULT_COSTING: &str = "auto";

pub struct RouteEstimator {
    provider: Arc<dyn RoutingProvider>,
    default_timeout: Duration,
    metrics: Metrics,
}

impl RouteEstimator {
    pub fn new(provider: Arc<dyn RoutingProvider>, default_timeout: Duration, metrics: Metrics) -> Self {
        Self {
            provider,
            default_timeout,
            metrics,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Races the routing request against `timeout`. A request that loses the
    /// race keeps running detached and its answer is dropped. Every failure
    /// resolves to the straight-line estimate.
    pub async fn estimate_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        timeout: Duration,
    ) -> RouteEstimate {
        let started = Instant::now();
        let provider = self.provider.clone();
        let request = RouteRequest::between(origin, destination, DEFAULT_COSTING);
        let mut request_task = tokio::spawn(async move { provider.route(&request).await });

        let outcome = tokio::select! {
            joined = &mut request_task => joined.unwrap_or_else(|err| {
                Err(RoutingError::Transport(format!("routing task failed: {err}")))
            }),
            _ = sleep(timeout) => Err(RoutingError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        };

        let estimate = match outcome {
            Ok(routed) => {
                info!(
                    distance_m = routed.distance_m,
                    points = routed.path.len(),
                    "route estimated by routing service"
                );
                RouteEstimate {
                    path: routed.path,
                    distance_m: routed.distance_m,
                    duration_s: routed.duration_s,
                    is_fallback: false,
                }
            }
            Err(err) => {
                warn!(error = %err, "routing failed; using straight-line estimate");
                fallback_estimate(origin, destination)
            }
        };

        let outcome_label = if estimate.is_fallback { "fallback" } else { "routed" };
        self.metrics
            .route_estimates_total
            .with_label_values(&[outcome_label])
            .inc();
        self.metrics
            .route_estimate_latency_seconds
            .with_label_values(&[outcome_label])
            .observe(started.elapsed().as_secs_f64());

        estimate
    }

    pub async fn estimate_route_with_default_timeout(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> RouteEstimate {
        self.estimate_route(origin, destination, self.default_timeout)
            .await
    }
}

pub fn fallback_estimate(origin: GeoPoint, destination: GeoPoint) -> RouteEstimate {
    RouteEstimate {
        path: vec![origin, destination],
        distance_m: haversine_m(&origin, &destination),
        duration_s: None,
        is_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::sleep;

    use super::{fallback_estimate, RouteEstimator, DEFAULT_ROUTE_TIMEOUT};
    use crate::models::geo::GeoPoint;
    use crate::observability::metrics::Metrics;
    use crate::routing::provider::{RouteRequest, RoutedPath, RoutingError, RoutingProvider};

    struct ScriptedProvider {
        delay: Duration,
        answer: Result<RoutedPath, RoutingError>,
        calls: AtomicUsize,
        finished: Arc<AtomicBool>,
    }

    impl ScriptedProvider {
        fn new(delay: Duration, answer: Result<RoutedPath, RoutingError>) -> Self {
            Self {
                delay,
                answer,
                calls: AtomicUsize::new(0),
                finished: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl RoutingProvider for ScriptedProvider {
        async fn route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
            assert_eq!(request.locations.len(), 2);
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn origin() -> GeoPoint {
        GeoPoint::new(55.7536, 37.6201)
    }

    fn destination() -> GeoPoint {
        GeoPoint::new(55.7558, 37.6176)
    }

    fn routed() -> RoutedPath {
        RoutedPath {
            path: vec![origin(), GeoPoint::new(55.7547, 37.6190), destination()],
            distance_m: 412.0,
            duration_s: Some(95.0),
        }
    }

    fn estimator(provider: Arc<ScriptedProvider>) -> RouteEstimator {
        RouteEstimator::new(provider, DEFAULT_ROUTE_TIMEOUT, Metrics::new())
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_loses_to_the_timer() {
        let provider = Arc::new(ScriptedProvider::new(Duration::from_millis(5000), Ok(routed())));
        let estimate = estimator(provider.clone())
            .estimate_route(origin(), destination(), Duration::from_millis(4000))
            .await;

        assert_eq!(estimate, fallback_estimate(origin(), destination()));
        assert!(estimate.is_fallback);
        assert_eq!(estimate.duration_s, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_service_answer_is_used() {
        let provider = Arc::new(ScriptedProvider::new(Duration::from_millis(100), Ok(routed())));
        let estimate = estimator(provider)
            .estimate_route(origin(), destination(), Duration::from_millis(4000))
            .await;

        assert!(!estimate.is_fallback);
        assert_eq!(estimate.path, routed().path);
        assert_eq!(estimate.distance_m, 412.0);
        assert_eq!(estimate.duration_s, Some(95.0));
    }

    #[tokio::test(start_paused = true)]
    async fn losing_request_is_abandoned_not_cancelled() {
        let provider = Arc::new(ScriptedProvider::new(Duration::from_millis(5000), Ok(routed())));
        let finished = provider.finished.clone();
        let estimate = estimator(provider)
            .estimate_route(origin(), destination(), Duration::from_millis(4000))
            .await;
        assert!(estimate.is_fallback);
        assert!(!finished.load(Ordering::SeqCst));

        sleep(Duration::from_millis(2000)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn service_errors_resolve_to_fallback() {
        for error in [
            RoutingError::Transport("connection refused".to_string()),
            RoutingError::Status(503),
            RoutingError::MissingCoordinates,
        ] {
            let provider = Arc::new(ScriptedProvider::new(Duration::from_millis(10), Err(error)));
            let estimate = estimator(provider)
                .estimate_route_with_default_timeout(origin(), destination())
                .await;

            assert!(estimate.is_fallback);
            assert_eq!(estimate.path, vec![origin(), destination()]);
        }
    }

    #[test]
    fn fallback_uses_straight_line_distance() {
        let estimate = fallback_estimate(origin(), destination());
        assert!((estimate.distance_m - 280.0).abs() <= 50.0);
        assert_eq!(estimate.path.len(), 2);
    }
}
