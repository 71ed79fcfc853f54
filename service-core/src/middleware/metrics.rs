use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Scrapes of the exporter itself are not recorded.
const METRICS_ROUTE: &str = "/metrics";

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// Request count, latency and in-flight gauge per route template
/// (`/api/properties/:property_id`, not the concrete id).
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned());

    if route.as_deref() == Some(METRICS_ROUTE) {
        return next.run(req).await;
    }

    let route = route.unwrap_or_else(|| "unmatched".to_owned());
    let method = req.method().as_str().to_owned();

    gauge!("http_requests_in_flight").increment(1.0);
    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed = started.elapsed().as_secs_f64();
    gauge!("http_requests_in_flight").decrement(1.0);

    let status = response.status().as_u16();
    let labels = [
        ("method", method),
        ("route", route),
        ("status", status.to_string()),
        ("class", status_class(status).to_owned()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_group_into_classes() {
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(403), "4xx");
        assert_eq!(status_class(503), "5xx");
    }
}
