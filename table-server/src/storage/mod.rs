//! redb-based persistence for the ordering core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `sessions` | `session_id` | `Session` | Session records |
//! | `active_tables` | `(restaurant_id, table_id)` | `session_id` | One-active-session-per-table index |
//! | `carts` | `session_id` | `Cart` | Cart snapshots |
//! | `orders` | `order_id` | `Order` | Immutable orders (plus item statuses) |
//! | `session_orders` | `session_id` | `Vec<order_id>` | Per-session order list |
//! | `open_orders` | `order_id` | `()` | Orders with non-terminal items |
//! | `idempotency` | `(session_id, key)` | `order_id` | Placement dedup |
//! | `counters` | `restaurant_id` | `u64` | Sequential order numbers |
//!
//! # Concurrency
//!
//! redb admits one write transaction at a time and commits are atomic across
//! all tables touched, so every multi-step mutation here (drain cart + persist
//! order + record idempotency key, or the claim compare-and-set) is a single
//! serialized unit. Readers never block writers.
//!
//! Values are JSON-serialized; this is an edge deployment, not a hot path.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use shared::models::{Cart, Order, Session};

/// Session records: key = session_id, value = JSON Session
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Active-session index: key = (restaurant_id, table_id), value = session_id
const ACTIVE_TABLES_TABLE: TableDefinition<(&str, &str), &str> =
    TableDefinition::new("active_tables");

/// Cart snapshots: key = session_id, value = JSON Cart
const CARTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");

/// Orders: key = order_id, value = JSON Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Per-session order ids in placement order: key = session_id, value = JSON Vec<String>
const SESSION_ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("session_orders");

/// Open order index: key = order_id, value = empty (existence check)
const OPEN_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("open_orders");

/// Placement dedup: key = (session_id, idempotency_key), value = order_id
const IDEMPOTENCY_TABLE: TableDefinition<(&str, &str), &str> = TableDefinition::new("idempotency");

/// Order number counters: key = restaurant_id, value = last issued number
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(err: StorageError) -> Self {
        shared::AppError::database(err.to_string())
    }
}

/// Persistence layer backed by redb
#[derive(Clone)]
pub struct PosStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for PosStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosStorage").finish_non_exhaustive()
    }
}

impl PosStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with immediate durability (copy-on-write + atomic pointer
    /// swap), so a venue box losing power mid-placement recovers to a
    /// consistent state and the client retries with the same idempotency key.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Create all tables so read transactions never see a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(SESSIONS_TABLE)?;
            let _ = txn.open_table(ACTIVE_TABLES_TABLE)?;
            let _ = txn.open_table(CARTS_TABLE)?;
            let _ = txn.open_table(ORDERS_TABLE)?;
            let _ = txn.open_table(SESSION_ORDERS_TABLE)?;
            let _ = txn.open_table(OPEN_ORDERS_TABLE)?;
            let _ = txn.open_table(IDEMPOTENCY_TABLE)?;
            let _ = txn.open_table(COUNTERS_TABLE)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sessions ==========

    pub fn get_session(&self, session_id: &str) -> StorageResult<Option<Session>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SESSIONS_TABLE)?;
        match table.get(session_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_session_txn(&self, txn: &WriteTransaction, session: &Session) -> StorageResult<()> {
        let mut table = txn.open_table(SESSIONS_TABLE)?;
        let bytes = serde_json::to_vec(session)?;
        table.insert(session.session_id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    pub fn get_session_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Option<Session>> {
        let table = txn.open_table(SESSIONS_TABLE)?;
        match table.get(session_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Active session id for a table, if any
    pub fn active_session_for_table(
        &self,
        restaurant_id: &str,
        table_id: &str,
    ) -> StorageResult<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ACTIVE_TABLES_TABLE)?;
        Ok(table
            .get((restaurant_id, table_id))?
            .map(|guard| guard.value().to_string()))
    }

    pub fn active_session_for_table_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        table_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(ACTIVE_TABLES_TABLE)?;
        Ok(table
            .get((restaurant_id, table_id))?
            .map(|guard| guard.value().to_string()))
    }

    pub fn set_active_table_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        table_id: &str,
        session_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_TABLES_TABLE)?;
        table.insert((restaurant_id, table_id), session_id)?;
        Ok(())
    }

    pub fn clear_active_table_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        table_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_TABLES_TABLE)?;
        table.remove((restaurant_id, table_id))?;
        Ok(())
    }

    /// All active sessions for a restaurant
    pub fn active_sessions(&self, restaurant_id: &str) -> StorageResult<Vec<Session>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(ACTIVE_TABLES_TABLE)?;
        let sessions_table = txn.open_table(SESSIONS_TABLE)?;

        let mut sessions = Vec::new();
        for entry in index.iter()? {
            let (key, value) = entry?;
            if key.value().0 != restaurant_id {
                continue;
            }
            if let Some(guard) = sessions_table.get(value.value())? {
                sessions.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(sessions)
    }

    // ========== Carts ==========

    pub fn get_cart(&self, session_id: &str) -> StorageResult<Option<Cart>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CARTS_TABLE)?;
        match table.get(session_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_cart_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Option<Cart>> {
        let table = txn.open_table(CARTS_TABLE)?;
        match table.get(session_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_cart_txn(&self, txn: &WriteTransaction, cart: &Cart) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        let bytes = serde_json::to_vec(cart)?;
        table.insert(cart.session_id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    pub fn remove_cart_txn(&self, txn: &WriteTransaction, session_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        table.remove(session_id)?;
        Ok(())
    }

    // ========== Orders ==========

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let bytes = serde_json::to_vec(order)?;
        table.insert(order.order_id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Order ids placed by a session, oldest first
    pub fn session_order_ids(&self, session_id: &str) -> StorageResult<Vec<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SESSION_ORDERS_TABLE)?;
        match table.get(session_id)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(Vec::new()),
        }
    }

    pub fn append_session_order_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SESSION_ORDERS_TABLE)?;
        let mut ids: Vec<String> = match table.get(session_id)? {
            Some(guard) => serde_json::from_slice(guard.value())?,
            None => Vec::new(),
        };
        ids.push(order_id.to_string());
        let bytes = serde_json::to_vec(&ids)?;
        table.insert(session_id, bytes.as_slice())?;
        Ok(())
    }

    pub fn mark_order_open_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    pub fn mark_order_closed_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// All orders that still have non-terminal items, for one restaurant
    pub fn open_orders(&self, restaurant_id: &str) -> StorageResult<Vec<Order>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(OPEN_ORDERS_TABLE)?;
        let orders_table = txn.open_table(ORDERS_TABLE)?;

        let mut orders: Vec<Order> = Vec::new();
        for entry in index.iter()? {
            let (key, _) = entry?;
            if let Some(guard) = orders_table.get(key.value())? {
                let order: Order = serde_json::from_slice(guard.value())?;
                if order.restaurant_id == restaurant_id {
                    orders.push(order);
                }
            }
        }
        orders.sort_by_key(|o| o.placed_at);
        Ok(orders)
    }

    // ========== Idempotency ==========

    pub fn order_id_for_key(
        &self,
        session_id: &str,
        idempotency_key: &str,
    ) -> StorageResult<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(IDEMPOTENCY_TABLE)?;
        Ok(table
            .get((session_id, idempotency_key))?
            .map(|guard| guard.value().to_string()))
    }

    pub fn order_id_for_key_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
        idempotency_key: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(IDEMPOTENCY_TABLE)?;
        Ok(table
            .get((session_id, idempotency_key))?
            .map(|guard| guard.value().to_string()))
    }

    pub fn record_idempotency_key_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
        idempotency_key: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(IDEMPOTENCY_TABLE)?;
        table.insert((session_id, idempotency_key), order_id)?;
        Ok(())
    }

    // ========== Counters ==========

    /// Increment and return the restaurant's order number (crash-safe: the
    /// increment commits with the order that consumed it)
    pub fn next_order_number_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
    ) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(restaurant_id)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(restaurant_id, next)?;
        Ok(next)
    }
}
