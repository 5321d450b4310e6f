//! Room-keyed broadcast hub
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BroadcastHub                          │
//! │  broadcast::Sender<BusMessage>   (in-process subscribers)│
//! │  DashMap<client_id, rooms + transport>  (connections)    │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//!               ┌──────────┴──────────┐
//!               │   Transport trait   │  ◄── pluggable
//!               └──────────┬──────────┘
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼                       ▼
//!         TcpTransport           MemoryTransport
//!         (LAN clients)          (in-process / tests)
//! ```
//!
//! # Message flow
//!
//! ```text
//! Mutation ──▶ hub.publish(msg with topics) ──▶ every connection whose
//!                                               rooms intersect the topics
//! Client  ──▶ RequestCommand ──▶ RpcDispatcher ──▶ Response (correlated)
//! ```
//!
//! Delivery is at-least-once to currently connected clients and fire-and-
//! forget from the mutation's perspective. The hub keeps no per-client state
//! beyond the live connection; a reconnecting client handshakes again and
//! re-fetches authoritative state over REST.

pub mod bus;
pub mod handler;
pub mod tcp_server;
pub mod transport;

pub use bus::{BroadcastHub, ConnectedClient};
pub use handler::RpcDispatcher;
pub use tcp_server::BusTcpServer;
pub use transport::{MemoryTransport, TcpTransport, Transport};

pub use shared::message::{BusMessage, EventType, Topic};
