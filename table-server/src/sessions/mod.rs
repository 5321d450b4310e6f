//! Session registry
//!
//! Binds a physical table + PIN to one ordering session. Invariant: at most
//! one ACTIVE session per table, enforced through the `active_tables` index
//! inside the same write transaction that creates a session. A join against
//! an occupied table with the correct PIN resumes the existing session (two
//! phones at one table), never creates a second one.

use std::sync::Arc;

use uuid::Uuid;

use shared::error::ErrorCode;
use shared::message::{BusMessage, SessionUpdatePayload, Topic};
use shared::models::{Cart, Session, SessionStatus};
use shared::util::now_millis;
use shared::{AppError, AppResult};

use crate::catalog::MenuCatalog;
use crate::message::BroadcastHub;
use crate::storage::PosStorage;

/// Session registry service
#[derive(Clone)]
pub struct SessionRegistry {
    storage: PosStorage,
    catalog: Arc<MenuCatalog>,
    hub: Arc<BroadcastHub>,
}

impl SessionRegistry {
    pub fn new(storage: PosStorage, catalog: Arc<MenuCatalog>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            storage,
            catalog,
            hub,
        }
    }

    /// Join a table with its PIN
    ///
    /// Creates a session, or resumes the table's active session when the PIN
    /// matches. A wrong PIN fails with `InvalidPin` regardless of occupancy,
    /// so probing a table token reveals nothing about its state.
    pub async fn join(&self, table_id: &str, pin: &str) -> AppResult<Session> {
        let table = self.catalog.table(table_id).ok_or_else(|| {
            AppError::with_message(ErrorCode::TableNotFound, format!("Table {table_id} not found"))
        })?;

        if table.pin != pin {
            tracing::warn!(table_id = %table_id, "Join rejected: wrong PIN");
            return Err(AppError::new(ErrorCode::InvalidPin));
        }

        let restaurant_id = table.restaurant_id.clone();

        // Create-or-resume under one write transaction so two racing joins
        // cannot both create a session for the table
        let txn = self.storage.begin_write()?;
        let existing = self
            .storage
            .active_session_for_table_txn(&txn, &restaurant_id, table_id)?;

        if let Some(session_id) = existing {
            drop(txn);
            let session = self
                .storage
                .get_session(&session_id)?
                .ok_or_else(|| AppError::new(ErrorCode::SessionNotFound))?;
            tracing::info!(session_id = %session.session_id, table_id = %table_id, "Join resumed active session");
            return Ok(session);
        }

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            table_id: table.table_id.clone(),
            restaurant_id: restaurant_id.clone(),
            table_name: table.name.clone(),
            status: SessionStatus::Active,
            created_at: now_millis(),
            closed_at: None,
        };

        self.storage.put_session_txn(&txn, &session)?;
        self.storage
            .set_active_table_txn(&txn, &restaurant_id, table_id, &session.session_id)?;
        self.storage
            .put_cart_txn(&txn, &Cart::empty(&session.session_id))?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(session_id = %session.session_id, table_id = %table_id, "Session opened");
        self.broadcast_session(&session).await;

        Ok(session)
    }

    /// Resume a known session on a table
    ///
    /// Used after a device restart when the client still holds its session
    /// token. Fails with `SessionConflict` when the table's active session is
    /// a different one.
    pub async fn resume(&self, table_id: &str, session_id: &str) -> AppResult<Session> {
        let session = self.get(session_id)?;

        if session.table_id != table_id {
            return Err(AppError::with_message(
                ErrorCode::SessionConflict,
                format!("Session does not belong to table {table_id}"),
            ));
        }
        if !session.is_active() {
            return Err(AppError::new(ErrorCode::SessionClosed));
        }

        let active = self
            .storage
            .active_session_for_table(&session.restaurant_id, table_id)?;
        if active.as_deref() != Some(session_id) {
            return Err(AppError::with_message(
                ErrorCode::SessionConflict,
                "Table has been taken over by another session",
            ));
        }

        Ok(session)
    }

    /// Close a session (bill settled or staff action)
    ///
    /// Idempotent: closing a closed session returns it unchanged. Clears the
    /// cart and frees the table for the next visit.
    pub async fn close(&self, session_id: &str) -> AppResult<Session> {
        let txn = self.storage.begin_write()?;
        let mut session = self
            .storage
            .get_session_txn(&txn, session_id)?
            .ok_or_else(|| AppError::new(ErrorCode::SessionNotFound))?;

        if !session.is_active() {
            drop(txn);
            return Ok(session);
        }

        session.status = SessionStatus::Closed;
        session.closed_at = Some(now_millis());
        self.storage.put_session_txn(&txn, &session)?;
        self.storage.remove_cart_txn(&txn, session_id)?;
        self.storage
            .clear_active_table_txn(&txn, &session.restaurant_id, &session.table_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(session_id = %session_id, table_id = %session.table_id, "Session closed");
        self.broadcast_session(&session).await;

        Ok(session)
    }

    /// Load a session
    pub fn get(&self, session_id: &str) -> AppResult<Session> {
        self.storage
            .get_session(session_id)?
            .ok_or_else(|| AppError::new(ErrorCode::SessionNotFound))
    }

    /// Load a session and require it to be ACTIVE
    ///
    /// Shared precondition for every cart mutation and order placement.
    pub fn require_active(&self, session_id: &str) -> AppResult<Session> {
        let session = self.get(session_id)?;
        if !session.is_active() {
            return Err(AppError::new(ErrorCode::SessionClosed));
        }
        Ok(session)
    }

    /// All active sessions for one restaurant (waiter board bootstrap)
    pub fn list_active(&self, restaurant_id: &str) -> AppResult<Vec<Session>> {
        Ok(self.storage.active_sessions(restaurant_id)?)
    }

    /// `session:update` goes to the restaurant room; on close also to the
    /// session room so customer devices drop to the rejoin flow
    async fn broadcast_session(&self, session: &Session) {
        let mut topics = vec![Topic::restaurant(&session.restaurant_id)];
        if !session.is_active() {
            topics.push(Topic::session(&session.session_id));
        }
        let payload = SessionUpdatePayload {
            session: session.clone(),
        };
        self.hub
            .publish(BusMessage::session_update(&payload, topics))
            .await;
    }
}
