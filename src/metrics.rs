use std::fmt;

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Content type for the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const REQUESTS_TOTAL: &str = "demo_app_requests_total";
const ERRORS_TOTAL: &str = "demo_app_errors_total";

/// Application metrics registry, shared through [`crate::AppContext`]
/// rather than a process-wide singleton.
///
/// Holds the two demo counters plus, on Linux, the default process
/// collector. Counters are atomic and only ever incremented.
pub struct AppMetrics {
    registry: Registry,
    requests_total: IntCounter,
    errors_total: IntCounter,
}

impl AppMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounter::new(REQUESTS_TOTAL, "Total HTTP requests")?;
        let errors_total = IntCounter::new(ERRORS_TOTAL, "Total error responses")?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            requests_total,
            errors_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn inc_requests(&self) {
        self.requests_total.inc();
    }

    pub fn inc_errors(&self) {
        self.errors_total.inc();
    }

    pub fn requests(&self) -> u64 {
        self.requests_total.get()
    }

    pub fn errors(&self) -> u64 {
        self.errors_total.get()
    }

    /// Encodes every metric family in the registry in the Prometheus
    /// text exposition format.
    pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

impl fmt::Debug for AppMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppMetrics")
            .field("requests_total", &self.requests())
            .field("errors_total", &self.errors())
            .finish()
    }
}
