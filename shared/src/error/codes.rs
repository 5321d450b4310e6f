//! Unified error codes for the TableTap core
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Session / table errors
//! - 4xxx: Cart errors
//! - 5xxx: Order / kitchen errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unified error code enum
///
/// Codes are represented as u16 values for efficient serialization and
/// cross-language compatibility (Rust server, TypeScript clients).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// Request is not authenticated
    NotAuthenticated = 1001,
    /// Table PIN does not match
    InvalidPin = 1002,
    /// Staff token has expired
    TokenExpired = 1003,
    /// Staff token is invalid
    TokenInvalid = 1004,
    /// Session token does not resolve to a session
    SessionTokenInvalid = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// A specific staff role is required
    RoleRequired = 2002,
    /// Actor is not assigned to the item's station
    StationMismatch = 2003,

    // ==================== 3xxx: Session / Table ====================
    /// Session not found
    SessionNotFound = 3001,
    /// Session is closed
    SessionClosed = 3002,
    /// Table already has an active session
    SessionConflict = 3003,
    /// Dining table not found
    TableNotFound = 3004,

    // ==================== 4xxx: Cart ====================
    /// Cart line not found
    CartItemNotFound = 4001,
    /// Cart is empty
    EmptyCart = 4002,
    /// Quantity out of range
    InvalidQuantity = 4003,

    // ==================== 5xxx: Order / Kitchen ====================
    /// Order not found
    OrderNotFound = 5001,
    /// Order item not found
    OrderItemNotFound = 5002,
    /// Item was claimed by another chef first
    AlreadyClaimed = 5003,
    /// Status transition is not allowed from the current state
    InvalidTransition = 5004,

    // ==================== 6xxx: Catalog ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Kitchen station not found
    StationNotFound = 6002,
    /// Menu item is not currently available
    MenuItemUnavailable = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage layer error
    DatabaseError = 9002,
    /// Serialization error
    SerializationError = 9003,
    /// Operation timed out
    Timeout = 9004,
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),
            1001 => Ok(Self::NotAuthenticated),
            1002 => Ok(Self::InvalidPin),
            1003 => Ok(Self::TokenExpired),
            1004 => Ok(Self::TokenInvalid),
            1005 => Ok(Self::SessionTokenInvalid),
            2001 => Ok(Self::PermissionDenied),
            2002 => Ok(Self::RoleRequired),
            2003 => Ok(Self::StationMismatch),
            3001 => Ok(Self::SessionNotFound),
            3002 => Ok(Self::SessionClosed),
            3003 => Ok(Self::SessionConflict),
            3004 => Ok(Self::TableNotFound),
            4001 => Ok(Self::CartItemNotFound),
            4002 => Ok(Self::EmptyCart),
            4003 => Ok(Self::InvalidQuantity),
            5001 => Ok(Self::OrderNotFound),
            5002 => Ok(Self::OrderItemNotFound),
            5003 => Ok(Self::AlreadyClaimed),
            5004 => Ok(Self::InvalidTransition),
            6001 => Ok(Self::MenuItemNotFound),
            6002 => Ok(Self::StationNotFound),
            6003 => Ok(Self::MenuItemUnavailable),
            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::SerializationError),
            9004 => Ok(Self::Timeout),
            other => Err(InvalidErrorCode(other)),
        }
    }
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::NotAuthenticated => "Authentication required",
            Self::InvalidPin => "Invalid table PIN",
            Self::TokenExpired => "Token expired",
            Self::TokenInvalid => "Invalid token",
            Self::SessionTokenInvalid => "Invalid session token",
            Self::PermissionDenied => "Permission denied",
            Self::RoleRequired => "Role not allowed to perform this action",
            Self::StationMismatch => "Actor is not assigned to this station",
            Self::SessionNotFound => "Session not found",
            Self::SessionClosed => "Session is closed",
            Self::SessionConflict => "Table already has an active session",
            Self::TableNotFound => "Table not found",
            Self::CartItemNotFound => "Cart item not found",
            Self::EmptyCart => "Cart is empty",
            Self::InvalidQuantity => "Invalid quantity",
            Self::OrderNotFound => "Order not found",
            Self::OrderItemNotFound => "Order item not found",
            Self::AlreadyClaimed => "Item already claimed",
            Self::InvalidTransition => "Invalid status transition",
            Self::MenuItemNotFound => "Menu item not found",
            Self::StationNotFound => "Station not found",
            Self::MenuItemUnavailable => "Menu item unavailable",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Storage error",
            Self::SerializationError => "Serialization error",
            Self::Timeout => "Operation timed out",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", *self as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::InvalidPin,
            ErrorCode::SessionConflict,
            ErrorCode::EmptyCart,
            ErrorCode::AlreadyClaimed,
            ErrorCode::InvalidTransition,
            ErrorCode::Timeout,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(ErrorCode::try_from(7777), Err(InvalidErrorCode(7777)));
    }

    #[test]
    fn serde_uses_numeric_representation() {
        let json = serde_json::to_string(&ErrorCode::AlreadyClaimed).unwrap();
        assert_eq!(json, "5003");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::AlreadyClaimed);
    }
}
