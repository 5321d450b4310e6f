//! HTTP mapping for the unified error system

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ApiResponse, AppError, ErrorCode};

impl ErrorCode {
    /// HTTP status code for this error code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::ValidationFailed | Self::InvalidRequest | Self::InvalidQuantity => {
                StatusCode::BAD_REQUEST
            }

            Self::NotAuthenticated
            | Self::InvalidPin
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::SessionTokenInvalid => StatusCode::UNAUTHORIZED,

            Self::PermissionDenied | Self::RoleRequired | Self::StationMismatch => {
                StatusCode::FORBIDDEN
            }

            Self::NotFound
            | Self::SessionNotFound
            | Self::TableNotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::MenuItemNotFound
            | Self::StationNotFound => StatusCode::NOT_FOUND,

            Self::AlreadyExists | Self::SessionConflict | Self::AlreadyClaimed => {
                StatusCode::CONFLICT
            }

            // Business rejections: the request was well-formed but the state
            // does not admit it
            Self::SessionClosed
            | Self::EmptyCart
            | Self::InvalidTransition
            | Self::MenuItemUnavailable => StatusCode::UNPROCESSABLE_ENTITY,

            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,

            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::SerializationError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        }
        (status, Json(ApiResponse::<()>::error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorCode::InvalidPin.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AlreadyClaimed.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::SessionClosed.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::DatabaseError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
