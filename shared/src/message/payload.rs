//! Bus message payloads
//!
//! Server-pushed events carry complete entities so clients reconcile to a
//! snapshot instead of applying diffs. RPC payloads carry the action name plus
//! JSON params, mirroring the REST error taxonomy in their acknowledgements.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Cart, Order, OrderItem, OrderStatus, Session};

use super::topic::Topic;

// ==================== Handshake ====================

/// Connection role, used for logging and room sanity checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientRole {
    Customer,
    Kitchen,
    Waiter,
}

/// Client -> server: declare protocol version, role and rooms
///
/// Room membership lives only as long as the connection; a reconnecting
/// client handshakes again and re-fetches current state over REST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    pub version: u16,
    pub client_id: String,
    pub role: ClientRole,
    pub rooms: Vec<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

// ==================== Server-Pushed Events ====================

/// Full cart snapshot, sent to `session:{id}` after every cart mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartUpdatePayload {
    pub cart: Cart,
}

/// A new order, sent to the session room, each referenced station room, and
/// the restaurant room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlacedPayload {
    pub order: Order,
}

/// One item's status change, with enough context to update any feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatusPayload {
    pub order_id: String,
    pub order_number: u64,
    pub session_id: String,
    /// The full item after the transition
    pub item: OrderItem,
    /// Order-level status derived after the transition
    pub order_status: OrderStatus,
}

/// Catalog reload notice; clients re-fetch the menu over REST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuUpdatePayload {
    pub restaurant_id: String,
    /// Monotonic catalog version for staleness checks
    pub version: u64,
}

/// A session opened or closed, sent to the restaurant room (and the session
/// room on close, so customer devices drop to the rejoin flow)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdatePayload {
    pub session: Session,
}

// ==================== RPC ====================

/// Socket RPC action names
pub mod actions {
    pub const KITCHEN_CLAIM_ITEM: &str = "kitchen:claim-item";
    pub const KITCHEN_MARK_READY: &str = "kitchen:mark-ready";
    pub const WAITER_SERVE_ITEM: &str = "waiter:serve-item";
    pub const STAFF_CANCEL_ITEM: &str = "staff:cancel-item";
}

/// Client -> server business request
///
/// `token` carries the staff JWT; transitions are authorized per request, not
/// per connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestCommandPayload {
    /// Action identifier (see [`actions`])
    pub action: String,
    /// Action parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Parameters for the item-transition RPCs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTransitionParams {
    pub token: String,
    pub order_id: String,
    pub item_id: String,
}

/// Server -> client RPC acknowledgement: `{ok, error?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ResponsePayload {
    pub fn ok(data: impl Serialize) -> Self {
        Self {
            ok: true,
            error_code: None,
            error: None,
            data: serde_json::to_value(data).ok(),
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            ok: true,
            error_code: None,
            error: None,
            data: None,
        }
    }

    pub fn err(err: &AppError) -> Self {
        Self {
            ok: false,
            error_code: Some(err.code.into()),
            error: Some(err.message.clone()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn response_from_error_carries_code() {
        let err = AppError::new(ErrorCode::AlreadyClaimed);
        let resp = ResponsePayload::err(&err);
        assert!(!resp.ok);
        assert_eq!(resp.error_code, Some(5003));
    }

    #[test]
    fn transition_params_roundtrip() {
        let params = ItemTransitionParams {
            token: "jwt".into(),
            order_id: "o1".into(),
            item_id: "i1".into(),
        };
        let value = serde_json::to_value(&params).unwrap();
        let back: ItemTransitionParams = serde_json::from_value(value).unwrap();
        assert_eq!(back, params);
    }
}
