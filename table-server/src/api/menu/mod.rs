//! Menu API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/menu | GET | none |
//! | /api/menu/reload | POST | staff JWT (manager) |

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/menu", get(handler::menu))
        .route("/api/menu/reload", post(handler::reload))
}
