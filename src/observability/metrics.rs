use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub transitions_total: IntCounterVec,
    pub actions_queued: IntGauge,
    pub replays_total: IntCounterVec,
    pub replay_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Booking transitions by outcome"),
            &["outcome"],
        )
        .expect("valid transitions_total metric");

        let actions_queued = IntGauge::new(
            "actions_queued",
            "Offline actions currently waiting for replay",
        )
        .expect("valid actions_queued metric");

        let replays_total = IntCounterVec::new(
            Opts::new("replays_total", "Replayed offline actions by outcome"),
            &["outcome"],
        )
        .expect("valid replays_total metric");

        let replay_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "replay_latency_seconds",
                "Latency of replaying one queued action in seconds",
            ),
            &["outcome"],
        )
        .expect("valid replay_latency_seconds metric");

        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(actions_queued.clone()))
            .expect("register actions_queued");
        registry
            .register(Box::new(replays_total.clone()))
            .expect("register replays_total");
        registry
            .register(Box::new(replay_latency_seconds.clone()))
            .expect("register replay_latency_seconds");

        Self {
            registry,
            transitions_total,
            actions_queued,
            replays_total,
            replay_latency_seconds,
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
