//! Order API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/orders/place | POST | session token |
//! | /api/orders/session/{session_id} | GET | session token |
//! | /api/orders/status/{idempotency_key} | GET | session token |
//! | /api/orders/{id} | GET | staff JWT |

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/place", post(handler::place))
        .route("/session/{session_id}", get(handler::by_session))
        .route("/status/{idempotency_key}", get(handler::by_key))
        .route("/{id}", get(handler::get_by_id))
}
