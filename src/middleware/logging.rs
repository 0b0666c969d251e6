//! Request logging middleware.
//!
//! Logs every HTTP request with method, path, status code and latency, plus
//! the session principal and whether its token was renewed on the way out.

use crate::auth::models::Claims;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// Logs at INFO for completed requests, WARN for server errors.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Skip logging for health checks to reduce noise
    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency = start.elapsed();
    let status = response.status().as_u16();

    let principal = response
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.clone())
        .unwrap_or_default();
    let renewed = response.headers().contains_key(AUTHORIZATION);

    if status >= 500 {
        warn!(
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency.as_millis(),
            principal = %principal,
            "Request failed (5xx)"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency.as_millis(),
            principal = %principal,
            renewed = renewed,
            "Request completed"
        );
    }

    response
}
