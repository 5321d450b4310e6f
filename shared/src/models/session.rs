//! Table session model
//!
//! A session binds a physical table to one ordering visit. The session id is
//! an opaque UUID and doubles as the customer's bearer credential for cart and
//! order access, so it must never be guessable or sequential.

use serde::{Deserialize, Serialize};

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
}

/// An active (or historical) ordering session for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session token (UUID v4)
    pub session_id: String,
    pub table_id: String,
    pub restaurant_id: String,
    /// Table display name snapshot, for waiter boards
    pub table_name: String,
    pub status: SessionStatus,
    /// Epoch millis
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<i64>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}
