//! Broadcast hub core
//!
//! The hub owns two delivery paths:
//! - a tokio broadcast channel for in-process subscribers (tests, embedded
//!   clients) that receives every published message, and
//! - the connection map, where each registered client receives exactly the
//!   messages whose topics intersect its subscribed rooms.
//!
//! Publishing is fire-and-forget: a mutation's success never depends on who
//! is connected. Failed transport writes are logged and the connection is
//! left for its read loop to reap.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use shared::message::{BusMessage, ClientRole, Topic};

use super::transport::Transport;

/// Capacity of the in-process broadcast channel
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

struct ClientHandle {
    role: ClientRole,
    rooms: Vec<Topic>,
    transport: Arc<dyn Transport>,
}

/// Connected-client summary for diagnostics
#[derive(Debug, Clone)]
pub struct ConnectedClient {
    pub id: String,
    pub role: ClientRole,
    pub rooms: Vec<Topic>,
    pub peer: String,
}

/// Room-keyed pub/sub hub
#[derive(Clone)]
pub struct BroadcastHub {
    server_tx: broadcast::Sender<BusMessage>,
    clients: Arc<DashMap<String, ClientHandle>>,
    shutdown_token: CancellationToken,
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("clients", &self.clients.len())
            .finish()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (server_tx, _) = broadcast::channel(capacity);
        Self {
            server_tx,
            clients: Arc::new(DashMap::new()),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Subscribe to every published message (in-process consumers filter with
    /// [`BusMessage::matches_rooms`] themselves)
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.server_tx.subscribe()
    }

    /// Register a connected client with its subscribed rooms
    ///
    /// A second registration under the same id replaces the first (stale
    /// connection superseded by a reconnect).
    pub fn register(
        &self,
        client_id: impl Into<String>,
        role: ClientRole,
        rooms: Vec<Topic>,
        transport: Arc<dyn Transport>,
    ) {
        let client_id = client_id.into();
        tracing::info!(
            client_id = %client_id,
            role = ?role,
            rooms = rooms.len(),
            peer = %transport.peer(),
            "Client joined hub"
        );
        self.clients.insert(
            client_id,
            ClientHandle {
                role,
                rooms,
                transport,
            },
        );
    }

    /// Remove a client; its room subscriptions die with the connection
    pub fn unregister(&self, client_id: &str) {
        if self.clients.remove(client_id).is_some() {
            tracing::info!(client_id = %client_id, "Client left hub");
        }
    }

    /// Publish a message to every subscriber of its topics
    ///
    /// Never returns an error: broadcast delivery is decoupled from the
    /// mutation that triggered it.
    pub async fn publish(&self, msg: BusMessage) {
        // In-process subscribers; send only fails when nobody listens
        let _ = self.server_tx.send(msg.clone());

        // Snapshot matching transports so the map lock is not held across IO
        let targets: Vec<(String, Arc<dyn Transport>)> = self
            .clients
            .iter()
            .filter(|entry| msg.matches_rooms(&entry.value().rooms))
            .map(|entry| (entry.key().clone(), entry.value().transport.clone()))
            .collect();

        if targets.is_empty() {
            return;
        }

        let writes = targets.iter().map(|(id, transport)| {
            let msg = &msg;
            async move { (id, transport.write_message(msg).await) }
        });
        for (client_id, result) in futures::future::join_all(writes).await {
            if let Err(e) = result {
                tracing::warn!(client_id = %client_id, error = %e, "Broadcast delivery failed");
            }
        }
    }

    /// Connected clients, for diagnostics
    pub fn connected_clients(&self) -> Vec<ConnectedClient> {
        self.clients
            .iter()
            .map(|entry| ConnectedClient {
                id: entry.key().clone(),
                role: entry.value().role,
                rooms: entry.value().rooms.clone(),
                peer: entry.value().transport.peer(),
            })
            .collect()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Cancel the TCP listener and connection tasks
    pub fn shutdown(&self) {
        tracing::info!("Shutting down broadcast hub");
        self.shutdown_token.cancel();
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::transport::MemoryTransport;
    use shared::message::EventType;

    fn msg_for(topics: Vec<Topic>) -> BusMessage {
        BusMessage::new(EventType::MenuUpdate, b"{}".to_vec()).with_topics(topics)
    }

    #[tokio::test]
    async fn delivery_is_scoped_to_rooms() {
        let hub = BroadcastHub::new();

        let (customer_tx, mut customer_rx) = MemoryTransport::channel("customer");
        let (kitchen_tx, mut kitchen_rx) = MemoryTransport::channel("kitchen");
        hub.register(
            "customer-1",
            ClientRole::Customer,
            vec![Topic::session("s1")],
            Arc::new(customer_tx),
        );
        hub.register(
            "kitchen-1",
            ClientRole::Kitchen,
            vec![Topic::station("r1", "grill")],
            Arc::new(kitchen_tx),
        );

        hub.publish(msg_for(vec![Topic::session("s1")])).await;
        hub.publish(msg_for(vec![
            Topic::station("r1", "grill"),
            Topic::restaurant("r1"),
        ]))
        .await;

        // Customer saw only the session-scoped message
        assert!(customer_rx.try_recv().is_ok());
        assert!(customer_rx.try_recv().is_err());

        // Kitchen saw only the station-scoped message
        assert!(kitchen_rx.try_recv().is_ok());
        assert!(kitchen_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_succeeds_with_no_subscribers() {
        let hub = BroadcastHub::new();
        // No panic, no error: fire-and-forget
        hub.publish(msg_for(vec![Topic::restaurant("r1")])).await;
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let hub = BroadcastHub::new();
        let (tx, mut rx) = MemoryTransport::channel("c");
        hub.register(
            "c1",
            ClientRole::Customer,
            vec![Topic::session("s1")],
            Arc::new(tx),
        );

        hub.publish(msg_for(vec![Topic::session("s1")])).await;
        assert!(rx.try_recv().is_ok());

        hub.unregister("c1");
        hub.publish(msg_for(vec![Topic::session("s1")])).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn in_process_subscribers_see_everything() {
        let hub = BroadcastHub::new();
        let mut rx = hub.subscribe();

        hub.publish(msg_for(vec![Topic::session("s1")])).await;
        let received = rx.recv().await.unwrap();
        assert_eq!(received.topics, vec![Topic::session("s1")]);
    }
}
