//! Unified error system shared by the table server and its clients
//!
//! - [`ErrorCode`]: standardized numeric codes for every failure the core can
//!   surface
//! - [`AppError`]: rich error type carrying a code, message and details
//! - [`ApiResponse`]: unified REST response envelope
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Session / table errors
//! - 4xxx: Cart errors
//! - 5xxx: Order / kitchen errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::SessionClosed, "session s1 is closed");
//! assert_eq!(err.code, ErrorCode::SessionClosed);
//! ```

mod codes;
mod http;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
