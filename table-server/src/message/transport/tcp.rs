//! TCP transport with length-prefixed JSON frames
//!
//! Frame layout: 4-byte little-endian payload length, then the JSON-encoded
//! [`BusMessage`]. Frames above [`MAX_FRAME_BYTES`] are rejected before
//! allocation.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use shared::message::BusMessage;
use shared::AppError;

use super::Transport;

/// Upper bound on one frame; a full order snapshot is a few KiB
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Read one frame from the stream
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<BusMessage, AppError> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| AppError::internal(format!("Read frame length failed: {e}")))?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len == 0 || len > MAX_FRAME_BYTES {
        return Err(AppError::internal(format!("Invalid frame length {len}")));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| AppError::internal(format!("Read frame payload failed: {e}")))?;

    serde_json::from_slice(&payload)
        .map_err(|e| AppError::internal(format!("Malformed frame: {e}")))
}

/// Write one frame to the stream
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg: &BusMessage,
) -> Result<(), AppError> {
    let payload = serde_json::to_vec(msg)
        .map_err(|e| AppError::internal(format!("Serialize frame failed: {e}")))?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(AppError::internal(format!(
            "Frame too large: {} bytes",
            payload.len()
        )));
    }

    let len = (payload.len() as u32).to_le_bytes();
    writer
        .write_all(&len)
        .await
        .map_err(|e| AppError::internal(format!("Write frame length failed: {e}")))?;
    writer
        .write_all(&payload)
        .await
        .map_err(|e| AppError::internal(format!("Write frame payload failed: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| AppError::internal(format!("Flush frame failed: {e}")))?;
    Ok(())
}

/// Outbound half of one TCP client connection
pub struct TcpTransport {
    peer: String,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpTransport {
    pub fn new(writer: OwnedWriteHalf, peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn write_message(&self, msg: &BusMessage) -> Result<(), AppError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, msg).await
    }

    fn peer(&self) -> String {
        format!("tcp:{}", self.peer)
    }
}
