//! Menu entries as the ordering core sees them
//!
//! Catalog CRUD lives outside the core; these types are the read-side contract
//! for menu lookup at cart-add and order-placement time.

use serde::{Deserialize, Serialize};

/// A selectable modifier option on a menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierOption {
    pub modifier_id: String,
    pub name: String,
    /// Price adjustment applied per unit when selected
    #[serde(default)]
    pub price_delta: f64,
}

/// A menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub menu_item_id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Base unit price
    pub price: f64,
    /// Tax rate in percent (e.g. 5 for 5% GST)
    #[serde(default)]
    pub tax_rate: f64,
    /// Kitchen station this item routes to; `None` falls back to the default
    /// station at placement time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub modifiers: Vec<ModifierOption>,
}

fn default_available() -> bool {
    true
}
