//! Request identification and tracing.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) unless the client sent one
//! - Open one tracing span per request carrying that ID
//! - Echo the ID back on the response
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Same stack on every listener so logs correlate across APIs

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID of a request that went through [`with_request_tracing`].
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Wrap a router with request ID generation, tracing and propagation.
pub fn with_request_tracing(router: Router, listener: &'static str) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    listener,
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}
