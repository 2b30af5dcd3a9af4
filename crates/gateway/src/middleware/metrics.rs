//! Request metrics middleware

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use docintel_common::metrics::RequestMetrics;

/// Record count and latency per matched route
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let timer = RequestMetrics::start(request.method().as_str(), &endpoint);

    let response = next.run(request).await;
    timer.finish(response.status().as_u16());
    response
}
