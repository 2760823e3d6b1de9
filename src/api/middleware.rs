//! API Middleware (Content-Type gate, Logging)

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::types::fail;
use crate::models::AppError;
use crate::utils::RequestTelemetry;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Reject any request without a JSON Content-Type, whatever its method
pub async fn require_json_content_type(request: Request, next: Next) -> Response {
    if !is_json(request.headers()) {
        return fail(AppError::invalid_content_type(), Instant::now()).into_response();
    }
    next.run(request).await
}

/// Request logging middleware
pub async fn logging_middleware(
    State(telemetry): State<Arc<RequestTelemetry>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();

    let mut response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();
    telemetry.record(status.as_u16(), latency);

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}
