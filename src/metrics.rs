use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};

pub static METRICS: Lazy<KdekomMetrics> = Lazy::new(KdekomMetrics::init);

pub struct KdekomMetrics {
    pub registry: Registry,
    pub missions_created_total: IntCounter,
    pub store_errors_total: IntCounter,
    pub query_duration: Histogram,
    pub calculation_duration: Histogram,
}

impl KdekomMetrics {
    pub fn init() -> Self {
        let registry = Registry::new();

        let missions_created_total =
            IntCounter::new("kdekom_missions_created_total", "Missions created")
                .expect("failed to build missions counter");

        let store_errors_total =
            IntCounter::new("kdekom_store_errors_total", "Store/query errors")
                .expect("failed to build store error counter");

        let query_duration = Histogram::with_opts(HistogramOpts::new(
            "kdekom_query_duration_seconds",
            "Duration of database queries",
        ))
        .expect("failed to build query histogram");

        let calculation_duration = Histogram::with_opts(HistogramOpts::new(
            "kdekom_calculation_duration_seconds",
            "Duration of revenue-distribution calculations",
        ))
        .expect("failed to build calculation histogram");

        registry
            .register(Box::new(missions_created_total.clone()))
            .expect("failed to register missions counter");
        registry
            .register(Box::new(store_errors_total.clone()))
            .expect("failed to register store error counter");
        registry
            .register(Box::new(query_duration.clone()))
            .expect("failed to register query histogram");
        registry
            .register(Box::new(calculation_duration.clone()))
            .expect("failed to register calculation histogram");

        Self {
            registry,
            missions_created_total,
            store_errors_total,
            query_duration,
            calculation_duration,
        }
    }

    pub fn record_mission_created(&self) {
        self.missions_created_total.inc();
    }

    pub fn record_store_error(&self) {
        self.store_errors_total.inc();
    }

    pub fn record_query_duration(&self, elapsed: std::time::Duration) {
        self.query_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_calculation_duration(&self, elapsed: std::time::Duration) {
        self.calculation_duration.observe(elapsed.as_secs_f64());
    }
}
