use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Access token metrics
    pub token_refresh_requests: IntCounter,
    pub token_refresh_failures: IntCounterVec,
    pub token_refresh_duration: HistogramVec,
    pub token_obtained_at_unix: IntGauge,

    // Platform api metrics
    pub api_requests: IntCounterVec,
    pub api_failures: IntCounterVec,

    // Webhook metrics
    pub webhook_requests: IntCounterVec,
    pub message_decode_failures: IntCounter,

    // Config/runtime
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("weixinagent".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Access token
            token_refresh_requests: IntCounter::new("token_refresh_requests_total", "Access token requests sent to the platform").unwrap(),
            token_refresh_failures: IntCounterVec::new(Opts::new("token_refresh_failures_total", "Access token request failures by reason"),&["reason"],).unwrap(),
            token_refresh_duration: HistogramVec::new(HistogramOpts::new("token_refresh_duration_seconds", "Access token refresh duration seconds, all attempts included").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0]),&["outcome"],).unwrap(),
            token_obtained_at_unix: IntGauge::new("token_obtained_at_unix_seconds", "When the cached access token was obtained").unwrap(),

            // Api
            api_requests: IntCounterVec::new(Opts::new("api_requests_total", "Platform api requests by endpoint"),&["endpoint"],).unwrap(),
            api_failures: IntCounterVec::new(Opts::new("api_failures_total", "Platform api failures by endpoint and reason"),&["endpoint", "reason"],).unwrap(),

            // Webhook
            webhook_requests: IntCounterVec::new(Opts::new("webhook_requests_total", "Webhook requests by kind and outcome"),&["kind", "outcome"],).unwrap(),
            message_decode_failures: IntCounter::new("message_decode_failures_total", "Inbound messages that are not well-formed xml").unwrap(),

            // Config/runtime
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config files that failed to parse").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_refresh_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_obtained_at_unix.clone())).unwrap();
        reg.register(Box::new(metrics.api_requests.clone())).unwrap();
        reg.register(Box::new(metrics.api_failures.clone())).unwrap();
        reg.register(Box::new(metrics.webhook_requests.clone())).unwrap();
        reg.register(Box::new(metrics.message_decode_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
