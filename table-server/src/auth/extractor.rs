//! Request extractors
//!
//! [`CurrentStaff`] validates the staff JWT from the Authorization header.
//! [`SessionToken`] pulls the customer's opaque session token from the
//! `x-session-token` header (or a bearer header on clients that only speak
//! Authorization); handlers resolve it to a session themselves.

use axum::{extract::FromRequestParts, http::request::Parts};

use shared::models::StaffIdentity;
use shared::AppError;

use crate::core::ServerState;

use super::JwtService;

/// Authenticated staff member
#[derive(Debug, Clone)]
pub struct CurrentStaff(pub StaffIdentity);

impl FromRequestParts<ServerState> for CurrentStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Reuse a previous extraction on the same request
        if let Some(staff) = parts.extensions.get::<CurrentStaff>() {
            return Ok(staff.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::unauthorized)?;

        let token = JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::unauthorized())?;

        let identity = state.jwt.validate(token).map_err(|e| {
            tracing::warn!(error = %e, uri = %parts.uri, "Staff auth failed");
            AppError::from(e)
        })?;

        let staff = CurrentStaff(identity);
        parts.extensions.insert(staff.clone());
        Ok(staff)
    }
}

/// Raw customer session token
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = parts
            .headers
            .get("x-session-token")
            .and_then(|h| h.to_str().ok())
            .filter(|t| !t.is_empty())
        {
            return Ok(SessionToken(token.to_string()));
        }

        if let Some(token) = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(JwtService::extract_from_header)
        {
            return Ok(SessionToken(token.to_string()));
        }

        Err(AppError::unauthorized())
    }
}
