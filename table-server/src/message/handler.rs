//! Socket RPC dispatch
//!
//! Status transitions arrive over the real-time channel as RequestCommand
//! messages (`kitchen:claim-item`, `kitchen:mark-ready`, `waiter:serve-item`,
//! `staff:cancel-item`) and are acknowledged with `{ok, error?}`. Business
//! rejections (AlreadyClaimed, InvalidTransition) are normal responses here,
//! never connection errors — the display refreshes and moves on.

use std::sync::Arc;

use shared::error::ErrorCode;
use shared::message::{
    ItemStatusPayload, ItemTransitionParams, RequestCommandPayload, ResponsePayload, actions,
};
use shared::{AppError, AppResult};

use crate::auth::JwtService;
use crate::kitchen::KitchenService;

/// Routes RequestCommands to the kitchen service
#[derive(Clone)]
pub struct RpcDispatcher {
    kitchen: KitchenService,
    jwt: Arc<JwtService>,
}

impl RpcDispatcher {
    pub fn new(kitchen: KitchenService, jwt: Arc<JwtService>) -> Self {
        Self { kitchen, jwt }
    }

    /// Handle one request; always produces a response payload
    pub async fn handle(&self, request: &RequestCommandPayload) -> ResponsePayload {
        match self.dispatch(request).await {
            Ok(payload) => ResponsePayload::ok(payload),
            Err(err) => {
                if err.is_rejection() {
                    tracing::debug!(action = %request.action, code = %err.code, "RPC rejected");
                } else {
                    tracing::warn!(action = %request.action, code = %err.code, error = %err.message, "RPC failed");
                }
                ResponsePayload::err(&err)
            }
        }
    }

    async fn dispatch(&self, request: &RequestCommandPayload) -> AppResult<ItemStatusPayload> {
        let params: ItemTransitionParams = request
            .params
            .clone()
            .ok_or_else(|| AppError::with_message(ErrorCode::InvalidRequest, "Missing params"))
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| {
                    AppError::with_message(ErrorCode::InvalidRequest, format!("Bad params: {e}"))
                })
            })?;

        let staff = self.jwt.validate(&params.token)?;

        match request.action.as_str() {
            actions::KITCHEN_CLAIM_ITEM => {
                self.kitchen
                    .claim(&staff, &params.order_id, &params.item_id)
                    .await
            }
            actions::KITCHEN_MARK_READY => {
                self.kitchen
                    .mark_ready(&staff, &params.order_id, &params.item_id)
                    .await
            }
            actions::WAITER_SERVE_ITEM => {
                self.kitchen
                    .serve(&staff, &params.order_id, &params.item_id)
                    .await
            }
            actions::STAFF_CANCEL_ITEM => {
                self.kitchen
                    .cancel(&staff, &params.order_id, &params.item_id)
                    .await
            }
            other => Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                format!("Unknown action: {other}"),
            )),
        }
    }
}
