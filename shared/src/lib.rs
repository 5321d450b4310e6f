//! Shared types for the TableTap ordering core
//!
//! Everything in this crate crosses a process boundary: it is serialized
//! between the table server and its clients (customer devices, kitchen
//! displays, waiter terminals).
//!
//! - [`error`]: unified error codes, [`error::AppError`] and the API envelope
//! - [`models`]: sessions, carts, orders, stations, menu entries
//! - [`message`]: broadcast-hub wire protocol (rooms, events, RPC payloads)
//! - [`util`]: small time helpers

pub mod error;
pub mod message;
pub mod models;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{BusMessage, EventType, Topic};
