//! Kitchen API handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use shared::models::KitchenStation;
use shared::AppResult;

use crate::auth::CurrentStaff;
use crate::core::ServerState;
use crate::kitchen::{KitchenOrderView, QueueFilter};

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    /// Restrict to one station (default: all the staff member covers)
    pub station: Option<String>,
    /// Status filter (default: NEW + IN_PROGRESS)
    #[serde(default)]
    pub filter: QueueFilter,
}

/// GET /api/kitchen/orders?station=&filter= - the station queue
pub async fn queue(
    State(state): State<ServerState>,
    CurrentStaff(staff): CurrentStaff,
    Query(query): Query<QueueQuery>,
) -> AppResult<Json<Vec<KitchenOrderView>>> {
    let views = state.kitchen.queue(
        &staff.restaurant_id,
        query.station.as_deref(),
        query.filter,
    )?;
    Ok(Json(views))
}

/// GET /api/stations - configured stations
pub async fn stations(
    State(state): State<ServerState>,
    CurrentStaff(_staff): CurrentStaff,
) -> AppResult<Json<Vec<KitchenStation>>> {
    Ok(Json(state.catalog.stations()))
}
