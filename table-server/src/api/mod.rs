//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`sessions`] - PIN join / resume / close
//! - [`cart`] - cart mutations and snapshot fetch (session token auth)
//! - [`orders`] - idempotent placement and order queries
//! - [`kitchen`] - kitchen queue and station list (staff JWT auth)
//! - [`menu`] - customer menu fetch and staff-triggered reload
//!
//! Status transitions are not REST: they run as socket RPCs on the broadcast
//! hub (see `crate::message::handler`).

pub mod cart;
pub mod health;
pub mod kitchen;
pub mod menu;
pub mod orders;
pub mod router_ext;
pub mod sessions;

pub use router_ext::{OneshotResult, OneshotRouter};

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

/// Request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(sessions::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(kitchen::router())
        .merge(menu::router())
}

/// Fully configured application with middleware and state
pub fn build_app(state: &ServerState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    build_router()
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id_header.clone(), XRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(PropagateRequestIdLayer::new(request_id_header)),
        )
        .with_state(state.clone())
}
