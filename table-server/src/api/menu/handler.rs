//! Menu API handlers

use axum::{Json, extract::State};
use serde::Serialize;

use shared::error::ErrorCode;
use shared::models::{MenuItem, StaffRole};
use shared::{AppError, AppResult};

use crate::auth::CurrentStaff;
use crate::core::ServerState;

#[derive(Serialize)]
pub struct MenuResponse {
    pub restaurant_id: String,
    /// Catalog version, matches the `menu:update` broadcast
    pub version: u64,
    pub items: Vec<MenuItem>,
}

/// GET /api/menu - available menu items
pub async fn menu(State(state): State<ServerState>) -> AppResult<Json<MenuResponse>> {
    let items = state
        .catalog
        .items()
        .into_iter()
        .filter(|i| i.is_available)
        .collect();
    Ok(Json(MenuResponse {
        restaurant_id: state.catalog.restaurant_id().to_string(),
        version: state.catalog.version(),
        items,
    }))
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub version: u64,
}

/// POST /api/menu/reload - re-read the catalog file after out-of-band CRUD
pub async fn reload(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
) -> AppResult<Json<ReloadResponse>> {
    if staff.role != StaffRole::Manager {
        return Err(AppError::with_message(
            ErrorCode::RoleRequired,
            "Catalog reload requires the manager role",
        ));
    }
    let version = state.reload_catalog().await?;
    Ok(Json(ReloadResponse { version }))
}
