//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs and API clients can
//! tell store outages apart from bad input.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - API_xxx: request errors
//! - STORE_xxx: storage backend errors
//! - NOTIFY_xxx: notification bus errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // API Errors
    // ============================================
    /// Invalid request body or parameters
    ApiBadRequest,
    /// Content-Type header missing or not JSON
    ApiInvalidContentType,
    /// Path id does not match the backend's id format
    InvalidId,
    /// Resource not found
    ApiNotFound,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Storage Errors
    // ============================================
    /// Backend unreachable
    StoreConnectionFailed,
    /// Backend rejected or failed a query
    StoreQueryFailed,

    // ============================================
    // Notification Errors
    // ============================================
    /// Consumer is gone, record could not be enqueued
    NotificationPublishFailed,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiInvalidContentType => "API_INVALID_CONTENT_TYPE",
            Self::InvalidId => "INVALID_ID",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::StoreConnectionFailed => "STORE_CONNECTION_FAILED",
            Self::StoreQueryFailed => "STORE_QUERY_FAILED",

            Self::NotificationPublishFailed => "NOTIFY_PUBLISH_FAILED",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ApiInvalidContentType | Self::InvalidId => 400,
            Self::ApiNotFound => 404,
            Self::StoreConnectionFailed => 503,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreConnectionFailed | Self::NotificationPublishFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// Content-Type is not application/json
    pub fn invalid_content_type() -> Self {
        Self::new(
            ErrorCode::ApiInvalidContentType,
            "Content-Type must be application/json",
        )
    }

    /// Id in the path cannot be understood by the backend
    pub fn invalid_id(raw: &str) -> Self {
        Self::new(
            ErrorCode::InvalidId,
            format!("Missing todo id or invalid format: {:?}", raw),
        )
    }

    /// Resource not found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotFound, msg)
    }

    /// Store query failed
    pub fn store_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreQueryFailed, msg)
    }

    /// Notification could not be enqueued
    pub fn publish_failed(topic: &str) -> Self {
        Self::new(
            ErrorCode::NotificationPublishFailed,
            format!("Failed to send message to topic {}", topic),
        )
    }

    /// Missing environment variable
    pub fn missing_env(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Missing environment variable: {}", name),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ApiBadRequest, "JSON parse error", err)
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        let code = match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
                ErrorCode::StoreConnectionFailed
            }
            _ => ErrorCode::StoreQueryFailed,
        };
        Self::with_source(code, "MongoDB operation failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::invalid_id("abc");
        assert_eq!(err.code, ErrorCode::InvalidId);
        assert_eq!(err.code_str(), "INVALID_ID");
        assert!(err.to_string().starts_with("[INVALID_ID]"));
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::StoreConnectionFailed.is_retryable());
        assert!(ErrorCode::NotificationPublishFailed.is_retryable());
        assert!(!ErrorCode::ApiBadRequest.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ApiInvalidContentType.http_status(), 400);
        assert_eq!(ErrorCode::ApiNotFound.http_status(), 404);
        assert_eq!(ErrorCode::StoreConnectionFailed.http_status(), 503);
        assert_eq!(ErrorCode::ConfigMissingEnv.http_status(), 500);
    }

    #[test]
    fn test_json_error_is_bad_request() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::ApiBadRequest);
        assert!(std::error::Error::source(&err).is_some());
    }
}
