//! Router extension for oneshot calls
//!
//! Lets tools and tests drive the full HTTP surface (routing, extractors,
//! middleware) without a network socket.

use http::Response;
use tower::Service;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use http::Request;

use crate::core::ServerState;

/// Result type for oneshot API calls
pub type OneshotResult = Result<Response<Body>>;

/// Extension trait for Router to support oneshot calls
#[async_trait::async_trait]
pub trait OneshotRouter {
    /// Process one request directly
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut router = api::build_router();
    /// let request = Request::builder()
    ///     .uri("/api/health")
    ///     .body(Body::empty())?;
    /// let response = router.oneshot(&state, request).await?;
    /// ```
    async fn oneshot(&mut self, state: &ServerState, request: Request<Body>) -> OneshotResult;
}

#[async_trait::async_trait]
impl OneshotRouter for Router<ServerState> {
    async fn oneshot(&mut self, state: &ServerState, request: Request<Body>) -> OneshotResult {
        let mut svc = self.clone().with_state(state.clone());
        let response = svc.call(request).await?;
        Ok(response)
    }
}
