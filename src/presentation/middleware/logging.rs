//! Request Logging & Metrics Middleware
//!
//! Structured request tracing via tower-http plus Prometheus counters per
//! matched route.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;

use crate::infrastructure::metrics;

/// Create the HTTP trace layer for structured request logging
pub fn create_trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Record request count and latency metrics.
///
/// Uses the matched route template (e.g. `/api/v1/services/{id}`) rather
/// than the raw path to keep label cardinality bounded.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let started = Instant::now();
    let response = next.run(request).await;

    metrics::record_http_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );

    response
}
