//! Cart store
//!
//! Each ACTIVE session owns one cart. Mutations are read-modify-write inside
//! a single storage transaction, so concurrent devices sharing a session
//! serialize cleanly: last write wins on a given line, and two adds of the
//! same item + modifier set coalesce into a quantity increment instead of a
//! duplicate line.
//!
//! Every successful mutation broadcasts the full recomputed cart snapshot to
//! the session room; clients reconcile to the snapshot, never apply diffs.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use shared::error::ErrorCode;
use shared::message::{BusMessage, CartUpdatePayload};
use shared::models::{Cart, CartLine, MenuItem, ModifierSelection};
use shared::util::now_millis;
use shared::{AppError, AppResult};

use crate::catalog::MenuCatalog;
use crate::message::BroadcastHub;
use crate::sessions::SessionRegistry;
use crate::storage::{PosStorage, StorageError};
use crate::utils::round_money;

/// Quantity cap per cart line
const MAX_QUANTITY: u32 = 99;

/// Cart store service
#[derive(Clone)]
pub struct CartStore {
    storage: PosStorage,
    catalog: Arc<MenuCatalog>,
    sessions: SessionRegistry,
    hub: Arc<BroadcastHub>,
}

impl CartStore {
    pub fn new(
        storage: PosStorage,
        catalog: Arc<MenuCatalog>,
        sessions: SessionRegistry,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            storage,
            catalog,
            sessions,
            hub,
        }
    }

    /// Add an item to the session's cart
    ///
    /// Name, unit price (base plus modifier deltas) and tax rate are frozen
    /// into the line at add time. Adds with an identical item + modifier set
    /// coalesce into the existing line.
    pub async fn add(
        &self,
        session_id: &str,
        menu_item_id: &str,
        quantity: u32,
        modifier_ids: &[String],
    ) -> AppResult<Cart> {
        self.sessions.require_active(session_id)?;
        check_quantity(quantity, 1)?;

        let item = self.catalog.require_item(menu_item_id)?;
        if !item.is_available {
            return Err(AppError::with_message(
                ErrorCode::MenuItemUnavailable,
                format!("{} is currently unavailable", item.name),
            ));
        }
        let modifiers = resolve_modifiers(&item, modifier_ids)?;
        let unit_price = round_money(
            item.price + modifiers.iter().map(|m| m.price_delta).sum::<f64>(),
        );
        let line_key = line_key(menu_item_id, &modifiers);

        let cart = self.mutate(session_id, |cart| {
            match cart.lines.iter_mut().find(|l| l.line_key == line_key) {
                Some(line) => {
                    line.quantity = (line.quantity + quantity).min(MAX_QUANTITY);
                }
                None => cart.lines.push(CartLine {
                    line_id: Uuid::new_v4().to_string(),
                    line_key: line_key.clone(),
                    menu_item_id: menu_item_id.to_string(),
                    name: item.name.clone(),
                    unit_price,
                    tax_rate: item.tax_rate,
                    quantity,
                    modifiers: modifiers.clone(),
                    added_at: now_millis(),
                }),
            }
            Ok(())
        })?;

        self.broadcast(&cart).await;
        Ok(cart)
    }

    /// Set a line's quantity; 0 removes the line
    pub async fn update(&self, session_id: &str, line_id: &str, quantity: u32) -> AppResult<Cart> {
        self.sessions.require_active(session_id)?;
        check_quantity(quantity, 0)?;

        let cart = self.mutate(session_id, |cart| {
            let idx = cart
                .lines
                .iter()
                .position(|l| l.line_id == line_id)
                .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound))?;
            if quantity == 0 {
                cart.lines.remove(idx);
            } else {
                cart.lines[idx].quantity = quantity;
            }
            Ok(())
        })?;

        self.broadcast(&cart).await;
        Ok(cart)
    }

    /// Remove a line
    pub async fn remove(&self, session_id: &str, line_id: &str) -> AppResult<Cart> {
        self.update(session_id, line_id, 0).await
    }

    /// Remove every line
    pub async fn clear(&self, session_id: &str) -> AppResult<Cart> {
        self.sessions.require_active(session_id)?;

        let cart = self.mutate(session_id, |cart| {
            cart.lines.clear();
            Ok(())
        })?;

        self.broadcast(&cart).await;
        Ok(cart)
    }

    /// Current cart snapshot (requires an ACTIVE session, mirroring the
    /// mutation preconditions — a closed session redirects to rejoin)
    pub fn get(&self, session_id: &str) -> AppResult<Cart> {
        self.sessions.require_active(session_id)?;
        Ok(self
            .storage
            .get_cart(session_id)?
            .unwrap_or_else(|| Cart::empty(session_id)))
    }

    /// Load-mutate-recompute-store under one write transaction
    fn mutate(
        &self,
        session_id: &str,
        apply: impl FnOnce(&mut Cart) -> AppResult<()>,
    ) -> AppResult<Cart> {
        let txn = self.storage.begin_write()?;
        let mut cart = self
            .storage
            .get_cart_txn(&txn, session_id)?
            .unwrap_or_else(|| Cart::empty(session_id));

        apply(&mut cart)?;
        recompute_totals(&mut cart);
        cart.updated_at = now_millis();

        self.storage.put_cart_txn(&txn, &cart)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(cart)
    }

    async fn broadcast(&self, cart: &Cart) {
        let payload = CartUpdatePayload { cart: cart.clone() };
        self.hub.publish(BusMessage::cart_update(&payload)).await;
    }
}

fn check_quantity(quantity: u32, min: u32) -> AppResult<()> {
    if quantity < min || quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("Quantity must be between {min} and {MAX_QUANTITY}"),
        ));
    }
    Ok(())
}

/// Map requested modifier ids onto the menu item's configured options
fn resolve_modifiers(item: &MenuItem, modifier_ids: &[String]) -> AppResult<Vec<ModifierSelection>> {
    let mut selections = Vec::with_capacity(modifier_ids.len());
    for id in modifier_ids {
        let option = item
            .modifiers
            .iter()
            .find(|m| &m.modifier_id == id)
            .ok_or_else(|| {
                AppError::validation(format!("Modifier {id} not offered on {}", item.name))
            })?;
        selections.push(ModifierSelection {
            modifier_id: option.modifier_id.clone(),
            name: option.name.clone(),
            price_delta: option.price_delta,
        });
    }
    Ok(selections)
}

/// Content hash identifying a line: same item + same modifier set coalesce
fn line_key(menu_item_id: &str, modifiers: &[ModifierSelection]) -> String {
    let mut ids: Vec<&str> = modifiers.iter().map(|m| m.modifier_id.as_str()).collect();
    ids.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(menu_item_id.as_bytes());
    for id in ids {
        hasher.update([0u8]);
        hasher.update(id.as_bytes());
    }
    hex::encode(&hasher.finalize()[..16])
}

/// Totals are recomputed from scratch on every mutation
fn recompute_totals(cart: &mut Cart) {
    cart.subtotal = round_money(cart.lines.iter().map(|l| l.line_total()).sum());
    cart.tax = round_money(
        cart.lines
            .iter()
            .map(|l| l.line_total() * l.tax_rate / 100.0)
            .sum(),
    );
    cart.total = round_money(cart.subtotal + cart.tax);
}
