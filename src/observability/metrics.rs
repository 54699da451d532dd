use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub position_samples_total: IntCounterVec,
    pub route_estimates_total: IntCounterVec,
    pub route_estimate_latency_seconds: HistogramVec,
    pub completions_total: IntCounterVec,
    pub active_sessions: IntGauge,
    pub distance_to_target_meters: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let position_samples_total = IntCounterVec::new(
            Opts::new("position_samples_total", "Location samples handled by kind"),
            &["kind"],
        )
        .expect("valid position_samples_total metric");

        let route_estimates_total = IntCounterVec::new(
            Opts::new("route_estimates_total", "Route estimates by outcome"),
            &["outcome"],
        )
        .expect("valid route_estimates_total metric");

        let route_estimate_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "route_estimate_latency_seconds",
                "Latency of route estimation in seconds",
            ),
            &["outcome"],
        )
        .expect("valid route_estimate_latency_seconds metric");

        let completions_total = IntCounterVec::new(
            Opts::new("completions_total", "Delivery completion reports by outcome"),
            &["outcome"],
        )
        .expect("valid completions_total metric");

        let active_sessions = IntGauge::new("active_sessions", "Deliveries currently in progress")
            .expect("valid active_sessions metric");

        let distance_to_target_meters = Gauge::new(
            "distance_to_target_meters",
            "Last computed distance to the delivery destination",
        )
        .expect("valid distance_to_target_meters metric");

        registry
            .register(Box::new(position_samples_total.clone()))
            .expect("register position_samples_total");
        registry
            .register(Box::new(route_estimates_total.clone()))
            .expect("register route_estimates_total");
        registry
            .register(Box::new(route_estimate_latency_seconds.clone()))
            .expect("register route_estimate_latency_seconds");
        registry
            .register(Box::new(completions_total.clone()))
            .expect("register completions_total");
        registry
            .register(Box::new(active_sessions.clone()))
            .expect("register active_sessions");
        registry
            .register(Box::new(distance_to_target_meters.clone()))
            .expect("register distance_to_target_meters");

        Self {
            registry,
            position_samples_total,
            route_estimates_total,
            route_estimate_latency_seconds,
            completions_total,
            active_sessions,
            distance_to_target_meters,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
