//! Transport layer abstraction
//!
//! A [`Transport`] is one connected client's outbound half. The hub writes
//! through this trait and never knows whether the other end is a TCP socket
//! or an in-process channel.

use async_trait::async_trait;

use shared::message::BusMessage;
use shared::AppError;

mod memory;
mod tcp;

pub use memory::MemoryTransport;
pub use tcp::{MAX_FRAME_BYTES, TcpTransport, read_frame, write_frame};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message to the client
    async fn write_message(&self, msg: &BusMessage) -> Result<(), AppError>;

    /// Peer label for logs
    fn peer(&self) -> String;
}
