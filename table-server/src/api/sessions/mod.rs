//! Session API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/sessions/join | POST | table PIN |
//! | /api/sessions/resume | POST | session token in body |
//! | /api/sessions/{id}/close | POST | staff JWT |
//! | /api/sessions/active | GET | staff JWT |

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/join", post(handler::join))
        .route("/resume", post(handler::resume))
        .route("/{id}/close", post(handler::close))
        .route("/active", get(handler::list_active))
}
