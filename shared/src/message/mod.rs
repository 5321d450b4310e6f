//! Broadcast-hub message types
//!
//! These types are shared between the table server and its clients, for both
//! in-process (memory) and network (TCP) transports. A [`BusMessage`] is one
//! framed unit on the wire: an event type, the rooms it is scoped to, and a
//! JSON payload.
//!
//! Event payloads are always full entities (cart snapshot, whole order, whole
//! item), never deltas, so duplicated or out-of-order delivery cannot corrupt
//! client state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod payload;
mod topic;

pub use payload::*;
pub use topic::{InvalidTopic, Topic};

/// Protocol version, checked during handshake
pub const PROTOCOL_VERSION: u16 = 1;

/// Event types carried on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Client -> server: subscribe with role + rooms
    Handshake = 0,
    /// Full cart snapshot after any cart mutation
    CartUpdate = 1,
    /// A new immutable order was created
    OrderPlaced = 2,
    /// One order item moved through its lifecycle
    ItemStatusChanged = 3,
    /// The menu catalog was reloaded
    MenuUpdate = 4,
    /// A table session opened or closed
    SessionUpdate = 5,
    /// Client -> server RPC (claim / mark-ready / serve / cancel)
    RequestCommand = 6,
    /// Server -> client RPC acknowledgement
    Response = 7,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::Handshake),
            1 => Ok(EventType::CartUpdate),
            2 => Ok(EventType::OrderPlaced),
            3 => Ok(EventType::ItemStatusChanged),
            4 => Ok(EventType::MenuUpdate),
            5 => Ok(EventType::SessionUpdate),
            6 => Ok(EventType::RequestCommand),
            7 => Ok(EventType::Response),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Handshake => write!(f, "handshake"),
            EventType::CartUpdate => write!(f, "cart:update"),
            EventType::OrderPlaced => write!(f, "order:placed"),
            EventType::ItemStatusChanged => write!(f, "item:status-changed"),
            EventType::MenuUpdate => write!(f, "menu:update"),
            EventType::SessionUpdate => write!(f, "session:update"),
            EventType::RequestCommand => write!(f, "request_command"),
            EventType::Response => write!(f, "response"),
        }
    }
}

/// One message on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    /// Rooms this message is delivered to; empty means point-to-point
    /// (handshakes and RPC traffic)
    #[serde(default)]
    pub topics: Vec<Topic>,
    /// Correlates a Response with its RequestCommand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    /// JSON-serialized payload
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            topics: Vec::new(),
            correlation_id: None,
            payload,
        }
    }

    /// Scope this message to a set of rooms
    pub fn with_topics(mut self, topics: Vec<Topic>) -> Self {
        self.topics = topics;
        self
    }

    /// Correlate with a request (for RPC responses)
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::new(EventType::Handshake, encode(payload))
    }

    pub fn cart_update(payload: &CartUpdatePayload) -> Self {
        Self::new(EventType::CartUpdate, encode(payload))
            .with_topics(vec![Topic::session(&payload.cart.session_id)])
    }

    pub fn order_placed(payload: &OrderPlacedPayload, topics: Vec<Topic>) -> Self {
        Self::new(EventType::OrderPlaced, encode(payload)).with_topics(topics)
    }

    pub fn item_status_changed(payload: &ItemStatusPayload, topics: Vec<Topic>) -> Self {
        Self::new(EventType::ItemStatusChanged, encode(payload)).with_topics(topics)
    }

    pub fn menu_update(payload: &MenuUpdatePayload) -> Self {
        Self::new(EventType::MenuUpdate, encode(payload))
            .with_topics(vec![Topic::restaurant(&payload.restaurant_id)])
    }

    pub fn session_update(payload: &SessionUpdatePayload, topics: Vec<Topic>) -> Self {
        Self::new(EventType::SessionUpdate, encode(payload)).with_topics(topics)
    }

    pub fn request_command(payload: &RequestCommandPayload) -> Self {
        Self::new(EventType::RequestCommand, encode(payload))
    }

    pub fn response(payload: &ResponsePayload, correlation_id: Uuid) -> Self {
        Self::new(EventType::Response, encode(payload)).with_correlation_id(correlation_id)
    }

    /// Parse the payload as the given type
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Whether any of this message's topics is in `rooms`
    pub fn matches_rooms(&self, rooms: &[Topic]) -> bool {
        self.topics.iter().any(|t| rooms.contains(t))
    }
}

fn encode<T: Serialize>(payload: &T) -> Vec<u8> {
    // Payload types are plain data structs; serialization cannot fail
    serde_json::to_vec(payload).expect("Failed to serialize bus payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cart;

    #[test]
    fn event_type_wire_roundtrip() {
        for raw in 0u8..=7 {
            let ev = EventType::try_from(raw).unwrap();
            assert_eq!(ev as u8, raw);
        }
        assert!(EventType::try_from(8).is_err());
    }

    #[test]
    fn cart_update_is_scoped_to_its_session_room() {
        let payload = CartUpdatePayload {
            cart: Cart::empty("s1"),
        };
        let msg = BusMessage::cart_update(&payload);
        assert_eq!(msg.event_type, EventType::CartUpdate);
        assert_eq!(msg.topics, vec![Topic::session("s1")]);

        let parsed: CartUpdatePayload = msg.parse_payload().unwrap();
        assert_eq!(parsed.cart.session_id, "s1");
    }

    #[test]
    fn room_matching() {
        let msg = BusMessage::new(EventType::MenuUpdate, vec![])
            .with_topics(vec![Topic::restaurant("r1")]);
        assert!(msg.matches_rooms(&[Topic::restaurant("r1"), Topic::session("s1")]));
        assert!(!msg.matches_rooms(&[Topic::restaurant("r2")]));
        assert!(!msg.matches_rooms(&[]));
    }

    #[test]
    fn response_carries_correlation() {
        let req = BusMessage::request_command(&RequestCommandPayload {
            action: actions::KITCHEN_CLAIM_ITEM.to_string(),
            params: None,
        });
        let resp = BusMessage::response(&ResponsePayload::ok_empty(), req.request_id);
        assert_eq!(resp.correlation_id, Some(req.request_id));
    }
}
