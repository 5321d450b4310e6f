//! Application error type and API response envelope

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ErrorCode;

/// Application error with a standardized code, message and optional details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppError {
    /// Standardized error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Structured details (field names, conflicting ids, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl AppError {
    /// Create an error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: BTreeMap::new(),
        }
    }

    /// Create an error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a structured detail
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.details.insert(key.into(), value);
        }
        self
    }

    // ========== Convenience Constructors ==========

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Timeout, message)
    }

    /// Whether this error is a non-fatal business rejection (the caller
    /// should refresh its view, not tear down the connection)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::AlreadyClaimed
                | ErrorCode::InvalidTransition
                | ErrorCode::EmptyCart
                | ErrorCode::SessionConflict
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_message(ErrorCode::SerializationError, err.to_string())
    }
}

/// Result alias for application code
pub type AppResult<T> = Result<T, AppError>;

/// Unified API response envelope
///
/// ```json
/// { "code": 0, "message": "success", "data": { ... } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Numeric error code (0 = success)
    pub code: u16,
    /// Message ("success" or the error message)
    pub message: String,
    /// Response data, absent on error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: ErrorCode::Success.into(),
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            code: err.code.into(),
            message: err.message.clone(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_code() {
        let err = AppError::with_message(ErrorCode::SessionClosed, "session gone");
        assert_eq!(err.to_string(), "E3002: session gone");
    }

    #[test]
    fn details_are_serialized_when_present() {
        let err = AppError::new(ErrorCode::AlreadyClaimed).with_detail("claimed_by", "chef-1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["details"]["claimed_by"], "chef-1");
    }

    #[test]
    fn rejections_are_non_fatal() {
        assert!(AppError::new(ErrorCode::AlreadyClaimed).is_rejection());
        assert!(!AppError::new(ErrorCode::InternalError).is_rejection());
    }
}
