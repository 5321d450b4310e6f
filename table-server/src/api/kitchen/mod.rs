//! Kitchen API module
//!
//! Read-side only: the queue for displays bootstrapping or recovering after
//! a reconnect. Transitions go through the socket RPCs.
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/kitchen/orders | GET | staff JWT |
//! | /api/stations | GET | staff JWT |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/kitchen/orders", get(handler::queue))
        .route("/api/stations", get(handler::stations))
}
