//! API Request/Response Types

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, warn};

use crate::models::AppError;
use crate::providers::NotificationStats;
use crate::utils::{CacheStats, TelemetryStats};

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: std::error::Error::source(err).map(|source| source.to_string()),
        }
    }
}

pub type ApiFailure = (StatusCode, Json<ApiResponse<()>>);
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiFailure>;

pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

pub fn ok<T: Serialize>(status: StatusCode, data: T, start: Instant) -> ApiResult<T> {
    Ok((status, Json(ApiResponse::success(data, elapsed_ms(start)))))
}

/// Turn an AppError into an enveloped error response
pub fn fail(err: AppError, start: Instant) -> ApiFailure {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(code = err.code_str(), retryable = err.code.is_retryable(), "{}", err);
    } else {
        warn!(code = err.code_str(), "{}", err);
    }

    (
        status,
        Json(ApiResponse::error(ApiError::from(&err), elapsed_ms(start))),
    )
}

// ============================================
// Health & Stats
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub requests: TelemetryStats,
    pub cache: CacheStats,
    pub notifications: NotificationStats,
    pub backends: Vec<BackendInfo>,
    pub v1_todos: usize,
    pub scratch_items: usize,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct BackendInfo {
    pub mount: String,
    pub backend: String,
}

// ============================================
// Notifications
// ============================================

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationAck {
    pub topic: String,
    pub key: String,
    pub offset: u64,
}

/// Records returned by `GET /v1/notifications` when no limit is given
pub const DEFAULT_RECENT_LIMIT: usize = 20;
