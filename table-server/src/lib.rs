//! TableTap Server - session-scoped table ordering core
//!
//! # Architecture Overview
//!
//! One server instance runs per venue and keeps a table's cart, placed orders
//! and per-item kitchen status consistent across customer devices,
//! kitchen-station displays and waiter terminals:
//!
//! - **Session registry** (`sessions`): PIN join, one active session per table
//! - **Cart store** (`cart`): coalescing mutations, full-snapshot broadcasts
//! - **Order placement** (`orders`): idempotent cart drain, snapshot pricing
//! - **Kitchen state machine** (`kitchen`): claim/ready/serve/cancel with a
//!   storage-level compare-and-set on claims
//! - **Broadcast hub** (`message`): room-keyed pub/sub over memory/TCP
//!   transports, no replay on reconnect
//!
//! # Module Structure
//!
//! ```text
//! table-server/src/
//! ├── core/          # Config, state, server, errors
//! ├── storage/       # redb persistence layer
//! ├── catalog/       # Menu/table/station read cache
//! ├── sessions/      # Session registry
//! ├── cart/          # Cart store
//! ├── orders/        # Order placement service
//! ├── kitchen/       # Item status state machine
//! ├── message/       # Broadcast hub, transports, RPC handler
//! ├── auth/          # Staff JWT validation, extractors
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Logger, money helpers
//! ```

pub mod api;
pub mod auth;
#[cfg(test)]
pub(crate) mod testutil;
pub mod cart;
pub mod catalog;
pub mod core;
pub mod kitchen;
pub mod message;
pub mod orders;
pub mod sessions;
pub mod storage;
pub mod utils;

// Re-export common types
pub use crate::core::{Config, Server, ServerState};
pub use auth::JwtService;
pub use cart::CartStore;
pub use catalog::MenuCatalog;
pub use kitchen::KitchenService;
pub use message::BroadcastHub;
pub use orders::OrderService;
pub use sessions::SessionRegistry;
pub use storage::PosStorage;

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCode};

/// Set up the process environment: .env, logging
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    utils::logger::init_logger();
    Ok(())
}

/// Log the startup banner
pub fn print_banner(config: &Config) {
    tracing::info!("========================================");
    tracing::info!("  TableTap Server");
    tracing::info!("  environment : {}", config.environment);
    tracing::info!("  http        : 0.0.0.0:{}", config.http_port);
    tracing::info!("  bus (tcp)   : 0.0.0.0:{}", config.bus_tcp_port);
    tracing::info!("  work dir    : {}", config.work_dir);
    tracing::info!("========================================");
}
