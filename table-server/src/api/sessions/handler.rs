//! Session API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::models::Session;
use shared::{AppError, AppResult};

use crate::auth::CurrentStaff;
use crate::core::ServerState;

#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 64))]
    pub table_id: String,
    #[validate(length(min = 4, max = 8))]
    pub table_pin: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResumeRequest {
    #[validate(length(min = 1, max = 64))]
    pub table_id: String,
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
}

/// POST /api/sessions/join - join a table with its PIN
///
/// The returned `session_id` is the customer's bearer credential for the
/// rest of the visit.
pub async fn join(
    State(state): State<ServerState>,
    Json(payload): Json<JoinRequest>,
) -> AppResult<Json<Session>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let session = state.sessions.join(&payload.table_id, &payload.table_pin).await?;
    Ok(Json(session))
}

/// POST /api/sessions/resume - re-attach a device to its session
pub async fn resume(
    State(state): State<ServerState>,
    Json(payload): Json<ResumeRequest>,
) -> AppResult<Json<Session>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let session = state
        .sessions
        .resume(&payload.table_id, &payload.session_id)
        .await?;
    Ok(Json(session))
}

/// POST /api/sessions/{id}/close - staff closes a table
pub async fn close(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<String>,
) -> AppResult<Json<Session>> {
    let session = state.sessions.get(&id)?;
    if session.restaurant_id != staff.restaurant_id {
        return Err(AppError::permission_denied(
            "Session belongs to another restaurant",
        ));
    }
    let session = state.sessions.close(&id).await?;
    Ok(Json(session))
}

/// GET /api/sessions/active - active sessions for the staff's restaurant
pub async fn list_active(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
) -> AppResult<Json<Vec<Session>>> {
    let sessions = state.sessions.list_active(&staff.restaurant_id)?;
    Ok(Json(sessions))
}
