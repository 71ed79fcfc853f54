//! Prometheus export for the `metrics` facade.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

fn describe() {
    describe_counter!("http_requests_total", "HTTP requests by route and status");
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request latency by route"
    );
    describe_gauge!("http_requests_in_flight", "HTTP requests currently being served");
    describe_counter!(
        "property_views_total",
        "Metered property views counted against a plan"
    );
    describe_counter!(
        "property_view_quota_exceeded_total",
        "Property views rejected because the plan limit was reached"
    );
}

/// Installs the Prometheus recorder. Later calls are ignored, so tests that
/// spawn several apps in one process can all call it.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let builder = PrometheusBuilder::new();
        let builder = match builder.set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        ) {
            Ok(with_buckets) => with_buckets,
            Err(e) => {
                tracing::warn!("Using default latency buckets: {}", e);
                PrometheusBuilder::new()
            }
        };

        let recorder = builder.build_recorder();
        let handle = recorder.handle();
        match metrics::set_global_recorder(recorder) {
            Ok(()) => describe(),
            Err(e) => tracing::warn!("Metrics recorder already installed: {}", e),
        }
        handle
    });
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_renders() {
        init_metrics();
        init_metrics();
        metrics::counter!("property_views_total").increment(1);
        assert!(get_metrics().contains("property_views_total"));
    }
}
