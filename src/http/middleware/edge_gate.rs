//! Edge gate middleware.
//! Rate limits governed requests and stamps security headers on admitted ones.

use std::sync::Arc;
use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::security::{Decision, EdgeGate};

pub const DENY_BODY: &str = "Too many requests";

pub async fn edge_gate_middleware(
    State(gate): State<Arc<EdgeGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // 1. Asset paths bypass the gate entirely.
    if !gate.governs(request.uri().path()) {
        return next.run(request).await;
    }

    // 2. Pre-flight passes through untouched.
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    // 3. Budget check.
    if gate.admit(&request) == Decision::Deny {
        let client = gate.client_ip(&request);
        tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        metrics::record_rate_limited();
        return (StatusCode::TOO_MANY_REQUESTS, DENY_BODY).into_response();
    }

    let response = next.run(request).await;
    gate.apply_security_headers(response)
}
