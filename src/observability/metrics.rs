//! Metrics collection and exposition.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus exporter and scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus recorder");

    tracing::info!("Metrics server listening on http://{}", addr);
}

/// Per-request accounting for the ingress.
///
/// Counters feed the `metrics` facade for exposition and keep a process-local
/// atomic snapshot so totals are readable in-process.
#[derive(Debug, Default)]
pub struct IngressMetrics {
    http_requests: AtomicU64,
    http_discards: AtomicU64,
}

impl IngressMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// One validated request entered the dispatch plane.
    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
        counter!("ingress_http_requests_total").increment(1);
    }

    /// One request was discarded by pool rejection.
    pub fn record_http_discard(&self) {
        self.http_discards.fetch_add(1, Ordering::Relaxed);
        counter!("ingress_http_discards_total").increment(1);
    }

    /// Body decode latency in milliseconds.
    pub fn record_decode_time_cost(&self, millis: u64) {
        histogram!("ingress_decode_duration_ms").record(millis as f64);
    }

    /// End-to-end dispatch latency in milliseconds, measured from ingress
    /// receive time.
    pub fn record_req_res_time_cost(&self, millis: u64) {
        histogram!("ingress_request_duration_ms").record(millis as f64);
    }

    pub fn http_requests(&self) -> u64 {
        self.http_requests.load(Ordering::Relaxed)
    }

    pub fn http_discards(&self) -> u64 {
        self.http_discards.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_totals() {
        let metrics = IngressMetrics::new();
        metrics.record_http_request();
        metrics.record_http_request();
        metrics.record_http_discard();
        metrics.record_decode_time_cost(3);
        metrics.record_req_res_time_cost(12);

        assert_eq!(metrics.http_requests(), 2);
        assert_eq!(metrics.http_discards(), 1);
    }
}
