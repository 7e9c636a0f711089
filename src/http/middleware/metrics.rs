//! Request metrics middleware.

use std::time::Instant;
use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::observability::metrics;

pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
