//! Core server plumbing: configuration, shared state, the HTTP server and
//! top-level errors.

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
