//! Orders and the per-item status lifecycle
//!
//! An [`Order`] is immutable once placed: its line items, prices and totals
//! are frozen at placement time. The only thing that moves afterwards is each
//! item's [`ItemStatus`], and the order-level [`OrderStatus`] is derived from
//! the items on every read, never stored independently.

use serde::{Deserialize, Serialize};

use super::cart::ModifierSelection;

/// Per-item status lifecycle
///
/// ```text
/// NEW ──claim──► IN_PROGRESS ──mark ready──► READY ──serve──► SERVED
///  │                  │
///  └────cancel────────┴──────────► CANCELLED
/// ```
///
/// `SERVED` and `CANCELLED` are terminal. The transition set below is
/// exhaustive; everything else is rejected with `InvalidTransition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    New,
    InProgress,
    Ready,
    Served,
    Cancelled,
}

impl ItemStatus {
    /// Whether `self -> next` is an allowed transition
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (New, InProgress) | (InProgress, Ready) | (Ready, Served) | (New, Cancelled) | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Served | ItemStatus::Cancelled)
    }
}

/// Derived order-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// At least one item is still being worked
    Open,
    /// Every item reached a terminal state and at least one was served
    Served,
    /// Every item was cancelled
    Cancelled,
}

/// One line item of a placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    /// Unit price snapshot taken from the cart at placement time; immutable
    /// even if the menu price changes later
    pub unit_price: f64,
    pub tax_rate: f64,
    #[serde(default)]
    pub modifiers: Vec<ModifierSelection>,
    /// Station the item was routed to at placement time
    pub station: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// An immutable placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    /// Sequential per restaurant
    pub order_number: u64,
    pub session_id: String,
    pub restaurant_id: String,
    pub table_id: String,
    pub table_name: String,
    /// Client-generated dedup key; (session_id, idempotency_key) maps to
    /// exactly one order
    pub idempotency_key: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub placed_at: i64,
}

impl Order {
    /// Order-level status, derived from the items
    pub fn derived_status(&self) -> OrderStatus {
        if self.items.iter().any(|i| !i.status.is_terminal()) {
            return OrderStatus::Open;
        }
        if self.items.iter().all(|i| i.status == ItemStatus::Cancelled) {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Served
        }
    }

    /// Distinct stations referenced by this order's items
    pub fn stations(&self) -> Vec<String> {
        let mut stations: Vec<String> = Vec::new();
        for item in &self.items {
            if !stations.contains(&item.station) {
                stations.push(item.station.clone());
            }
        }
        stations
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|i| i.item_id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(status: ItemStatus) -> OrderItem {
        OrderItem {
            item_id: "i1".into(),
            menu_item_id: "m1".into(),
            name: "Masala Dosa".into(),
            quantity: 1,
            unit_price: 100.0,
            tax_rate: 5.0,
            modifiers: vec![],
            station: "grill".into(),
            status,
            claimed_by: None,
            claimed_by_name: None,
            ready_at: None,
            served_at: None,
            cancelled_at: None,
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        Order {
            order_id: "o1".into(),
            order_number: 1,
            session_id: "s1".into(),
            restaurant_id: "r1".into(),
            table_id: "t1".into(),
            table_name: "T1".into(),
            idempotency_key: "k1".into(),
            items,
            subtotal: 100.0,
            tax: 5.0,
            total: 105.0,
            placed_at: 0,
        }
    }

    #[test]
    fn allowed_transitions_are_exhaustive() {
        use ItemStatus::*;
        let all = [New, InProgress, Ready, Served, Cancelled];
        let allowed = [
            (New, InProgress),
            (InProgress, Ready),
            (Ready, Served),
            (New, Cancelled),
            (InProgress, Cancelled),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        use ItemStatus::*;
        for next in [New, InProgress, Ready, Served, Cancelled] {
            assert!(!Served.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn skipping_in_progress_is_rejected() {
        assert!(!ItemStatus::New.can_transition_to(ItemStatus::Ready));
        assert!(!ItemStatus::New.can_transition_to(ItemStatus::Served));
        assert!(!ItemStatus::Ready.can_transition_to(ItemStatus::Cancelled));
    }

    #[test]
    fn derived_status_open_while_any_item_active() {
        let o = order(vec![item(ItemStatus::Served), item(ItemStatus::Ready)]);
        assert_eq!(o.derived_status(), OrderStatus::Open);
    }

    #[test]
    fn derived_status_served_with_partial_cancellation() {
        let o = order(vec![item(ItemStatus::Served), item(ItemStatus::Cancelled)]);
        assert_eq!(o.derived_status(), OrderStatus::Served);
    }

    #[test]
    fn derived_status_cancelled_when_all_cancelled() {
        let o = order(vec![item(ItemStatus::Cancelled), item(ItemStatus::Cancelled)]);
        assert_eq!(o.derived_status(), OrderStatus::Cancelled);
    }

    #[test]
    fn stations_are_distinct_in_placement_order() {
        let mut a = item(ItemStatus::New);
        a.station = "grill".into();
        let mut b = item(ItemStatus::New);
        b.station = "fryer".into();
        let mut c = item(ItemStatus::New);
        c.station = "grill".into();
        let o = order(vec![a, b, c]);
        assert_eq!(o.stations(), vec!["grill".to_string(), "fryer".to_string()]);
    }
}
