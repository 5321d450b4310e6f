//! JWT token service
//!
//! Validates staff tokens (HS256) and maps claims onto [`StaffIdentity`].

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::error::ErrorCode;
use shared::models::{StaffIdentity, StaffRole};
use shared::AppError;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret (at least 32 bytes in production)
    pub secret: String,
    /// Issuer expected on staff tokens
    pub issuer: String,
    /// Audience expected on staff tokens
    pub audience: String,
}

impl JwtConfig {
    /// Load from `JWT_SECRET` / `JWT_ISSUER` / `JWT_AUDIENCE`
    ///
    /// Falls back to a development secret when unset; production deployments
    /// must set `JWT_SECRET`.
    pub fn from_env() -> Self {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using development secret");
                "tabletap-dev-secret-do-not-use-in-production".to_string()
            }
        };
        Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tabletap".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tabletap-staff".to_string()),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Claims carried in a staff token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff id (subject)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Staff role
    pub role: StaffRole,
    /// Restaurant scope
    pub restaurant_id: String,
    /// Assigned stations (empty = all)
    #[serde(default)]
    pub stations: Vec<String>,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// JWT errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::ExpiredToken => AppError::new(ErrorCode::TokenExpired),
            JwtError::InvalidToken(msg) => AppError::with_message(ErrorCode::TokenInvalid, msg),
            JwtError::GenerationFailed(msg) => AppError::internal(msg),
        }
    }
}

/// Token validation/issuing service
#[derive(Debug, Clone)]
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Issue a staff token (back-office tooling and tests; the ordering core
    /// itself never mints tokens from credentials)
    pub fn issue(&self, staff: &StaffIdentity, ttl_minutes: i64) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: staff.staff_id.clone(),
            name: staff.name.clone(),
            role: staff.role,
            restaurant_id: staff.restaurant_id.clone(),
            stations: staff.stations.clone(),
            exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate a token and return the staff identity
    pub fn validate(&self, token: &str) -> Result<StaffIdentity, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
            _ => JwtError::InvalidToken(e.to_string()),
        })?;

        let claims = data.claims;
        Ok(StaffIdentity {
            staff_id: claims.sub,
            name: claims.name,
            role: claims.role,
            restaurant_id: claims.restaurant_id,
            stations: claims.stations,
        })
    }

    /// Extract a bearer token from an Authorization header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new(JwtConfig::from_env())
    }
}
