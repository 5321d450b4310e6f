//! Cart API handlers
//!
//! Every response is the full recomputed cart snapshot, identical to what
//! rides on the `cart:update` broadcast — REST fetch after reconnect and the
//! live feed can never disagree.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::models::Cart;
use shared::{AppError, AppResult};

use crate::auth::SessionToken;
use crate::core::ServerState;

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddRequest {
    #[validate(length(min = 1, max = 64))]
    pub menu_item_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub modifier_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRequest {
    #[validate(length(min = 1, max = 64))]
    pub line_id: String,
    pub quantity: u32,
}

/// GET /api/cart - current cart snapshot
pub async fn get_cart(
    State(state): State<ServerState>,
    SessionToken(session_id): SessionToken,
) -> AppResult<Json<Cart>> {
    Ok(Json(state.carts.get(&session_id)?))
}

/// POST /api/cart/add - add an item (coalesces with an identical line)
pub async fn add(
    State(state): State<ServerState>,
    SessionToken(session_id): SessionToken,
    Json(payload): Json<AddRequest>,
) -> AppResult<Json<Cart>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let cart = state
        .carts
        .add(
            &session_id,
            &payload.menu_item_id,
            payload.quantity,
            &payload.modifier_ids,
        )
        .await?;
    Ok(Json(cart))
}

/// PUT /api/cart/update - set a line's quantity (0 removes)
pub async fn update(
    State(state): State<ServerState>,
    SessionToken(session_id): SessionToken,
    Json(payload): Json<UpdateRequest>,
) -> AppResult<Json<Cart>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let cart = state
        .carts
        .update(&session_id, &payload.line_id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/item/{id} - remove a line
pub async fn remove(
    State(state): State<ServerState>,
    SessionToken(session_id): SessionToken,
    Path(line_id): Path<String>,
) -> AppResult<Json<Cart>> {
    let cart = state.carts.remove(&session_id, &line_id).await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/clear - empty the cart
pub async fn clear(
    State(state): State<ServerState>,
    SessionToken(session_id): SessionToken,
) -> AppResult<Json<Cart>> {
    let cart = state.carts.clear(&session_id).await?;
    Ok(Json(cart))
}
