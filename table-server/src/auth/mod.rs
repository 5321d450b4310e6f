//! Staff authentication
//!
//! Staff tokens are JWTs minted by the back-office system; this server only
//! validates them and extracts the [`shared::models::StaffIdentity`] used by
//! the capability checks. Customers authenticate with the opaque session
//! token issued at PIN join.

pub mod extractor;
pub mod jwt;

pub use extractor::{CurrentStaff, SessionToken};
pub use jwt::{JwtConfig, JwtError, JwtService};
