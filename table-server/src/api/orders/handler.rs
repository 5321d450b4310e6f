//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::models::Order;
use shared::{AppError, AppResult};

use crate::auth::{CurrentStaff, SessionToken};
use crate::core::ServerState;

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceRequest {
    /// Client-generated before the first attempt and reused verbatim on
    /// retries
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: String,
}

/// POST /api/orders/place - drain the cart into an immutable order
///
/// Retrying with the same key returns the original order; see
/// `crate::orders::OrderService::place`.
pub async fn place(
    State(state): State<ServerState>,
    SessionToken(session_id): SessionToken,
    Json(payload): Json<PlaceRequest>,
) -> AppResult<Json<Order>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let order = state
        .orders
        .place(&session_id, &payload.idempotency_key)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders/session/{session_id} - the session's orders
///
/// Customers may only read their own session (the token is the credential).
pub async fn by_session(
    State(state): State<ServerState>,
    SessionToken(token): SessionToken,
    Path(session_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    if token != session_id {
        return Err(AppError::permission_denied("Not your session"));
    }
    Ok(Json(state.orders.get_by_session(&session_id)?))
}

/// GET /api/orders/status/{idempotency_key} - resolve a placement attempt
///
/// Lets a client that timed out before reading the placement response find
/// out what happened without re-placing.
pub async fn by_key(
    State(state): State<ServerState>,
    SessionToken(session_id): SessionToken,
    Path(idempotency_key): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get_by_key(&session_id, &idempotency_key)?))
}

/// GET /api/orders/{id} - staff order lookup
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get(&id)?;
    if order.restaurant_id != staff.restaurant_id {
        return Err(AppError::permission_denied(
            "Order belongs to another restaurant",
        ));
    }
    Ok(Json(order))
}
