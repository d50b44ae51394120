use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const LOOKUP_HIT: &str = "hit";
pub const LOOKUP_MISS: &str = "miss";

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

    // Store metrics
    pub cache_entries: IntGaugeVec,
    pub cache_lookups: IntCounterVec,
    pub sweep_removed: IntCounterVec,
    pub sweep_duration: HistogramVec,

    // Manager metrics
    pub cache_libraries: IntGauge,

    // Runtime
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenkeeper".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Store
            cache_entries: IntGaugeVec::new(Opts::new("cache_entries", "Entries held per store after the last sweep"),&["store"],).unwrap(),
            cache_lookups: IntCounterVec::new(Opts::new("cache_lookups_total", "Lookups by store and result"),&["store", "result"],).unwrap(),
            sweep_removed: IntCounterVec::new(Opts::new("cache_sweep_removed_total", "Entries removed by the expiry sweep"),&["store"],).unwrap(),
            sweep_duration: HistogramVec::new(HistogramOpts::new("cache_sweep_duration_seconds", "Expiry sweep duration seconds").buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),&["store"],).unwrap(),

            // Manager
            cache_libraries: IntGauge::new("cache_libraries", "Registered cache libraries").unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.cache_entries.clone())).unwrap();
        reg.register(Box::new(metrics.cache_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.sweep_removed.clone())).unwrap();
        reg.register(Box::new(metrics.sweep_duration.clone())).unwrap();
        reg.register(Box::new(metrics.cache_libraries.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
