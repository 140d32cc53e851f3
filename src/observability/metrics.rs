use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process metrics.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token metrics
    pub token_exchange_requests: IntCounter,
    pub token_exchange_failures: IntCounterVec,
    pub token_exchange_duration: HistogramVec,
    pub token_cache_hits: IntCounter,
    pub token_expiry_unix: IntGauge,

    // Append metrics
    pub append_requests: IntCounterVec,
    pub append_failures: IntCounterVec,
    pub append_skipped: IntCounterVec,
    pub append_duration: HistogramVec,

    // Config/runtime
    pub config_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("sheetsync".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token
            token_exchange_requests: IntCounter::new("token_exchange_requests_total", "Assertion-for-token exchanges attempted").unwrap(),
            token_exchange_failures: IntCounterVec::new(Opts::new("token_exchange_failures_total", "Token exchange failures by reason"), &["reason"]).unwrap(),
            token_exchange_duration: HistogramVec::new(HistogramOpts::new("token_exchange_duration_seconds", "Token exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["outcome"]).unwrap(),
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Bearer tokens served from cache").unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached bearer token").unwrap(),

            // Append
            append_requests: IntCounterVec::new(Opts::new("append_requests_total", "Append calls by destination"), &["destination"]).unwrap(),
            append_failures: IntCounterVec::new(Opts::new("append_failures_total", "Append failures by destination and reason"), &["destination", "reason"]).unwrap(),
            append_skipped: IntCounterVec::new(Opts::new("append_skipped_total", "Appends skipped while remote sync is disabled"), &["destination"]).unwrap(),
            append_duration: HistogramVec::new(HistogramOpts::new("append_duration_seconds", "Append round trip seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["destination"]).unwrap(),

            // Config/runtime
            config_errors: IntCounter::new("config_errors_total", "Config parse and validation errors").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_exchange_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_exchange_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_exchange_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.append_requests.clone())).unwrap();
        reg.register(Box::new(metrics.append_failures.clone())).unwrap();
        reg.register(Box::new(metrics.append_skipped.clone())).unwrap();
        reg.register(Box::new(metrics.append_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
