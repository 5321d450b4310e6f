//! Per-session cart snapshot
//!
//! Carts are always exchanged as complete snapshots: every mutation recomputes
//! and broadcasts the whole cart, so a duplicated or out-of-order delivery is
//! a no-op on the client.

use serde::{Deserialize, Serialize};

/// One selected modifier on a cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierSelection {
    pub modifier_id: String,
    pub name: String,
    #[serde(default)]
    pub price_delta: f64,
}

/// One line in a cart
///
/// `line_key` is a content hash of the menu item plus its sorted modifier set;
/// two adds with the same key coalesce into one line. `line_id` is the opaque
/// handle clients use for update/remove.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: String,
    pub line_key: String,
    pub menu_item_id: String,
    /// Name snapshot from the menu at add time
    pub name: String,
    /// Unit price snapshot (base price plus modifier deltas)
    pub unit_price: f64,
    /// Tax rate snapshot in percent
    pub tax_rate: f64,
    /// Always >= 1; reaching 0 deletes the line
    pub quantity: u32,
    #[serde(default)]
    pub modifiers: Vec<ModifierSelection>,
    pub added_at: i64,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Complete cart snapshot for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub session_id: String,
    pub lines: Vec<CartLine>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub updated_at: i64,
}

impl Cart {
    /// Empty cart for a fresh session
    pub fn empty(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            lines: Vec::new(),
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
            updated_at: crate::util::now_millis(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }
}
