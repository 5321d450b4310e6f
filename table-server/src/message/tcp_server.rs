//! TCP listener for the broadcast hub
//!
//! Connection lifecycle:
//!
//! 1. Client connects and must send a Handshake frame within the grace
//!    period (protocol version + role + rooms).
//! 2. The connection is registered on the hub; from here the write half
//!    receives every message matching its rooms.
//! 3. Inbound frames are RequestCommands, answered with correlated
//!    Responses. Everything else is ignored.
//! 4. EOF, a bad frame or shutdown unregisters the connection. No state
//!    survives it: the client re-handshakes and re-fetches over REST.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use shared::message::{
    BusMessage, EventType, HandshakePayload, PROTOCOL_VERSION, RequestCommandPayload,
    ResponsePayload,
};
use shared::{AppError, AppResult};

use super::bus::BroadcastHub;
use super::handler::RpcDispatcher;
use super::transport::{TcpTransport, Transport, read_frame};

/// Grace period for the handshake frame
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Hub TCP front end
pub struct BusTcpServer {
    hub: Arc<BroadcastHub>,
    dispatcher: Arc<RpcDispatcher>,
    listen_addr: String,
}

impl BusTcpServer {
    pub fn new(hub: Arc<BroadcastHub>, dispatcher: Arc<RpcDispatcher>, listen_addr: String) -> Self {
        Self {
            hub,
            dispatcher,
            listen_addr,
        }
    }

    /// Accept connections until the hub shuts down
    pub async fn run(self) -> AppResult<()> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| AppError::internal(format!("Bus bind {} failed: {e}", self.listen_addr)))?;
        tracing::info!(addr = %self.listen_addr, "Broadcast hub TCP server listening");

        let shutdown = self.hub.shutdown_token().clone();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Bus TCP server stopping");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let hub = self.hub.clone();
                            let dispatcher = self.dispatcher.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(hub, dispatcher, stream, addr.to_string()).await {
                                    tracing::debug!(peer = %addr, error = %e, "Connection ended");
                                }
                            });
                        }
                        Err(e) => tracing::warn!(error = %e, "Accept failed"),
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    hub: Arc<BroadcastHub>,
    dispatcher: Arc<RpcDispatcher>,
    stream: TcpStream,
    peer: String,
) -> AppResult<()> {
    let (mut reader, writer) = stream.into_split();

    // Handshake first, within the grace period
    let first = tokio::time::timeout(HANDSHAKE_TIMEOUT, read_frame(&mut reader))
        .await
        .map_err(|_| AppError::timeout("Handshake timed out"))??;
    if first.event_type != EventType::Handshake {
        return Err(AppError::internal("Expected handshake frame"));
    }
    let handshake: HandshakePayload = first
        .parse_payload()
        .map_err(|e| AppError::internal(format!("Bad handshake: {e}")))?;
    if handshake.version != PROTOCOL_VERSION {
        return Err(AppError::internal(format!(
            "Protocol mismatch: client {}, server {}",
            handshake.version, PROTOCOL_VERSION
        )));
    }

    let client_id = if handshake.client_id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        handshake.client_id.clone()
    };
    let transport = Arc::new(TcpTransport::new(writer, peer));
    hub.register(
        client_id.clone(),
        handshake.role,
        handshake.rooms.clone(),
        transport.clone(),
    );

    // Ack so the client knows its rooms are live
    let ack = BusMessage::response(&ResponsePayload::ok_empty(), first.request_id);
    if let Err(e) = transport.write_message(&ack).await {
        hub.unregister(&client_id);
        return Err(e);
    }

    let shutdown = hub.shutdown_token().clone();
    let result = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break Ok(()),
            frame = read_frame(&mut reader) => {
                let msg = match frame {
                    Ok(msg) => msg,
                    // EOF and malformed frames both end the connection
                    Err(e) => break Err(e),
                };
                match msg.event_type {
                    EventType::RequestCommand => {
                        let request: RequestCommandPayload = match msg.parse_payload() {
                            Ok(p) => p,
                            Err(e) => {
                                tracing::debug!(client_id = %client_id, error = %e, "Bad request payload");
                                continue;
                            }
                        };
                        let response = dispatcher.handle(&request).await;
                        let reply = BusMessage::response(&response, msg.request_id);
                        if let Err(e) = transport.write_message(&reply).await {
                            break Err(e);
                        }
                    }
                    other => {
                        tracing::debug!(client_id = %client_id, event = %other, "Ignoring client frame");
                    }
                }
            }
        }
    };

    hub.unregister(&client_id);
    result
}
