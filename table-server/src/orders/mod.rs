//! Order placement service
//!
//! Converts a cart into an immutable order exactly once per
//! (session, idempotency key) pair:
//!
//! ```text
//! place(session_id, key)
//!     ├─ 1. Replay check (key already mapped -> return original order)
//!     ├─ 2. Session must be ACTIVE
//!     ├─ 3. Begin write transaction
//!     ├─ 4. Replay double-check inside the transaction
//!     ├─ 5. Drain cart -> order items (price + station snapshot)
//!     ├─ 6. Persist order, session index, open index, idempotency key,
//!     │     emptied cart — one atomic commit
//!     └─ 7. Broadcast order:placed (only when newly created)
//! ```
//!
//! A failure anywhere before commit aborts the whole transaction; the client
//! retries with the same key and either creates the order then, or replays
//! the committed one. The replay path runs before the session check so a
//! retry arriving after the table closed still returns the original order.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use shared::error::ErrorCode;
use shared::message::{BusMessage, OrderPlacedPayload, Topic};
use shared::models::{Cart, DEFAULT_STATION, ItemStatus, Order, OrderItem};
use shared::util::now_millis;
use shared::{AppError, AppResult};

use crate::catalog::MenuCatalog;
use crate::message::BroadcastHub;
use crate::sessions::SessionRegistry;
use crate::storage::{PosStorage, StorageError};

/// Longest accepted idempotency key
const MAX_KEY_LEN: usize = 128;

/// Order placement service
#[derive(Clone)]
pub struct OrderService {
    storage: PosStorage,
    catalog: Arc<MenuCatalog>,
    sessions: SessionRegistry,
    hub: Arc<BroadcastHub>,
    place_timeout: Duration,
}

impl OrderService {
    pub fn new(
        storage: PosStorage,
        catalog: Arc<MenuCatalog>,
        sessions: SessionRegistry,
        hub: Arc<BroadcastHub>,
        place_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            catalog,
            sessions,
            hub,
            place_timeout,
        }
    }

    /// Place an order from the session's cart
    ///
    /// Idempotent: every call with the same key returns the same order. The
    /// whole operation is bounded by the configured placement timeout.
    pub async fn place(&self, session_id: &str, idempotency_key: &str) -> AppResult<Order> {
        if idempotency_key.is_empty() || idempotency_key.len() > MAX_KEY_LEN {
            return Err(AppError::validation(format!(
                "Idempotency key must be 1..={MAX_KEY_LEN} characters"
            )));
        }

        let service = self.clone();
        let session_id_owned = session_id.to_string();
        let key = idempotency_key.to_string();
        let result = tokio::time::timeout(
            self.place_timeout,
            tokio::task::spawn_blocking(move || service.place_blocking(&session_id_owned, &key)),
        )
        .await;

        let (order, created) = match result {
            Err(_) => Err(AppError::timeout("Order placement timed out")),
            Ok(Err(join_err)) => Err(AppError::internal(format!(
                "Placement task failed: {join_err}"
            ))),
            Ok(Ok(placed)) => placed,
        }?;

        if created {
            tracing::info!(
                order_id = %order.order_id,
                order_number = order.order_number,
                session_id = %order.session_id,
                items = order.items.len(),
                total = order.total,
                "Order placed"
            );
            self.broadcast_placed(&order).await;
        } else {
            tracing::debug!(
                order_id = %order.order_id,
                idempotency_key = %idempotency_key,
                "Placement replayed"
            );
        }
        Ok(order)
    }

    /// Synchronous placement under one write transaction
    ///
    /// Returns the order and whether it was newly created.
    fn place_blocking(&self, session_id: &str, key: &str) -> AppResult<(Order, bool)> {
        // Replay fast path, deliberately before the session liveness check
        if let Some(order_id) = self.storage.order_id_for_key(session_id, key)? {
            return Ok((self.load_order(&order_id)?, false));
        }

        let session = self.sessions.require_active(session_id)?;

        let txn = self.storage.begin_write()?;

        // Double-check inside the transaction: two racing calls with the
        // same key both pass the fast path, only the first commits
        if let Some(order_id) = self.storage.order_id_for_key_txn(&txn, session_id, key)? {
            drop(txn);
            return Ok((self.load_order(&order_id)?, false));
        }

        let cart = self
            .storage
            .get_cart_txn(&txn, session_id)?
            .unwrap_or_else(|| Cart::empty(session_id));
        if cart.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyCart));
        }

        let order_number = self
            .storage
            .next_order_number_txn(&txn, &session.restaurant_id)?;

        let items: Vec<OrderItem> = cart.lines.iter().map(|line| self.order_item(line)).collect();

        let order = Order {
            order_id: Uuid::new_v4().to_string(),
            order_number,
            session_id: session.session_id.clone(),
            restaurant_id: session.restaurant_id.clone(),
            table_id: session.table_id.clone(),
            table_name: session.table_name.clone(),
            idempotency_key: key.to_string(),
            items,
            subtotal: cart.subtotal,
            tax: cart.tax,
            total: cart.total,
            placed_at: now_millis(),
        };

        self.storage.put_order_txn(&txn, &order)?;
        self.storage
            .append_session_order_txn(&txn, session_id, &order.order_id)?;
        self.storage.mark_order_open_txn(&txn, &order.order_id)?;
        self.storage
            .record_idempotency_key_txn(&txn, session_id, key, &order.order_id)?;
        // Drain: the cart empties in the same commit that creates the order
        self.storage.put_cart_txn(&txn, &Cart::empty(session_id))?;
        txn.commit().map_err(StorageError::from)?;

        Ok((order, true))
    }

    /// Freeze one cart line into an order item
    ///
    /// Prices come from the cart snapshot; only station routing consults the
    /// catalog, falling back to the default station when the menu item has
    /// disappeared since it was added.
    fn order_item(&self, line: &shared::models::CartLine) -> OrderItem {
        let station = self
            .catalog
            .item(&line.menu_item_id)
            .map(|item| self.catalog.resolve_station(&item))
            .unwrap_or_else(|| DEFAULT_STATION.to_string());
        OrderItem {
            item_id: Uuid::new_v4().to_string(),
            menu_item_id: line.menu_item_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            tax_rate: line.tax_rate,
            modifiers: line.modifiers.clone(),
            station,
            status: ItemStatus::New,
            claimed_by: None,
            claimed_by_name: None,
            ready_at: None,
            served_at: None,
            cancelled_at: None,
        }
    }

    fn load_order(&self, order_id: &str) -> AppResult<Order> {
        self.storage.get_order(order_id)?.ok_or_else(|| {
            AppError::internal(format!("Idempotency key maps to missing order {order_id}"))
        })
    }

    /// `order:placed` fans out to the table, every referenced station, and
    /// the restaurant-wide waiter room
    async fn broadcast_placed(&self, order: &Order) {
        let mut topics = vec![Topic::session(&order.session_id)];
        for station in order.stations() {
            topics.push(Topic::station(&order.restaurant_id, station));
        }
        topics.push(Topic::restaurant(&order.restaurant_id));

        let payload = OrderPlacedPayload {
            order: order.clone(),
        };
        self.hub
            .publish(BusMessage::order_placed(&payload, topics))
            .await;
    }

    // ========== Queries ==========

    /// Load an order by id
    pub fn get(&self, order_id: &str) -> AppResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))
    }

    /// Resolve an idempotency key to its order (`GET /orders/status/:key`)
    pub fn get_by_key(&self, session_id: &str, idempotency_key: &str) -> AppResult<Order> {
        let order_id = self
            .storage
            .order_id_for_key(session_id, idempotency_key)?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        self.get(&order_id)
    }

    /// All orders placed by a session, oldest first
    pub fn get_by_session(&self, session_id: &str) -> AppResult<Vec<Order>> {
        let ids = self.storage.session_order_ids(session_id)?;
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            orders.push(self.get(&id)?);
        }
        Ok(orders)
    }

    /// Orders with non-terminal items, for waiter boards
    pub fn list_open(&self, restaurant_id: &str) -> AppResult<Vec<Order>> {
        Ok(self.storage.open_orders(restaurant_id)?)
    }
}
