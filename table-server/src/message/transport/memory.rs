//! In-process transport
//!
//! Backs same-process clients and tests: writes land on an unbounded channel
//! the client side drains.

use async_trait::async_trait;
use tokio::sync::mpsc;

use shared::message::BusMessage;
use shared::AppError;

use super::Transport;

/// Channel-backed transport
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    label: String,
    tx: mpsc::UnboundedSender<BusMessage>,
}

impl MemoryTransport {
    /// Create a transport plus the receiving end the client reads from
    pub fn channel(label: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<BusMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                label: label.into(),
                tx,
            },
            rx,
        )
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn write_message(&self, msg: &BusMessage) -> Result<(), AppError> {
        self.tx
            .send(msg.clone())
            .map_err(|_| AppError::internal(format!("Memory transport {} closed", self.label)))
    }

    fn peer(&self) -> String {
        format!("memory:{}", self.label)
    }
}
