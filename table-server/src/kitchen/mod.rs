//! Kitchen item state machine service
//!
//! Owns every status transition on placed order items:
//!
//! - `claim` (NEW -> IN_PROGRESS): kitchen actor on the item's station; the
//!   check-and-write runs inside one storage write transaction, so exactly
//!   one of any number of concurrent claimants wins and the rest get
//!   `AlreadyClaimed` — a compare-and-set, not an application lock.
//! - `mark_ready` (IN_PROGRESS -> READY): any member of the item's station.
//! - `serve` (READY -> SERVED): waiter role.
//! - `cancel` (NEW/IN_PROGRESS -> CANCELLED): any staff role.
//!
//! Check order per transition: state machine first (`InvalidTransition` /
//! `AlreadyClaimed`), then role, then station membership. Every transition
//! recomputes the derived order status, maintains the open-order index in the
//! same commit, and broadcasts `item:status-changed` to the station room, the
//! session room and the restaurant room.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shared::error::ErrorCode;
use shared::message::{BusMessage, ItemStatusPayload, Topic};
use shared::models::{ItemStatus, Order, OrderItem, OrderStatus, StaffIdentity};
use shared::util::now_millis;
use shared::{AppError, AppResult};

use crate::message::BroadcastHub;
use crate::storage::{PosStorage, StorageError};

/// Status filter for the kitchen queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueFilter {
    /// NEW and IN_PROGRESS (the working queue)
    #[default]
    Active,
    New,
    InProgress,
    Ready,
    All,
}

impl QueueFilter {
    fn matches(self, status: ItemStatus) -> bool {
        match self {
            QueueFilter::Active => {
                matches!(status, ItemStatus::New | ItemStatus::InProgress)
            }
            QueueFilter::New => status == ItemStatus::New,
            QueueFilter::InProgress => status == ItemStatus::InProgress,
            QueueFilter::Ready => status == ItemStatus::Ready,
            QueueFilter::All => true,
        }
    }
}

/// One order as a kitchen display shows it: only the items the display's
/// station and filter care about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenOrderView {
    pub order_id: String,
    pub order_number: u64,
    pub table_name: String,
    pub placed_at: i64,
    pub items: Vec<OrderItem>,
}

/// Kitchen service
#[derive(Clone)]
pub struct KitchenService {
    storage: PosStorage,
    hub: Arc<BroadcastHub>,
}

impl KitchenService {
    pub fn new(storage: PosStorage, hub: Arc<BroadcastHub>) -> Self {
        Self { storage, hub }
    }

    /// Kitchen queue: open orders trimmed to one station's view
    pub fn queue(
        &self,
        restaurant_id: &str,
        station: Option<&str>,
        filter: QueueFilter,
    ) -> AppResult<Vec<KitchenOrderView>> {
        let orders = self.storage.open_orders(restaurant_id)?;
        let mut views = Vec::new();
        for order in orders {
            let items: Vec<OrderItem> = order
                .items
                .iter()
                .filter(|item| station.is_none_or(|s| item.station == s))
                .filter(|item| filter.matches(item.status))
                .cloned()
                .collect();
            if items.is_empty() {
                continue;
            }
            views.push(KitchenOrderView {
                order_id: order.order_id,
                order_number: order.order_number,
                table_name: order.table_name,
                placed_at: order.placed_at,
                items,
            });
        }
        Ok(views)
    }

    /// NEW -> IN_PROGRESS, recording the claimant
    pub async fn claim(
        &self,
        staff: &StaffIdentity,
        order_id: &str,
        item_id: &str,
    ) -> AppResult<ItemStatusPayload> {
        self.transition(staff, order_id, item_id, ItemStatus::InProgress)
            .await
    }

    /// IN_PROGRESS -> READY
    pub async fn mark_ready(
        &self,
        staff: &StaffIdentity,
        order_id: &str,
        item_id: &str,
    ) -> AppResult<ItemStatusPayload> {
        self.transition(staff, order_id, item_id, ItemStatus::Ready)
            .await
    }

    /// READY -> SERVED
    pub async fn serve(
        &self,
        staff: &StaffIdentity,
        order_id: &str,
        item_id: &str,
    ) -> AppResult<ItemStatusPayload> {
        self.transition(staff, order_id, item_id, ItemStatus::Served)
            .await
    }

    /// NEW/IN_PROGRESS -> CANCELLED
    pub async fn cancel(
        &self,
        staff: &StaffIdentity,
        order_id: &str,
        item_id: &str,
    ) -> AppResult<ItemStatusPayload> {
        self.transition(staff, order_id, item_id, ItemStatus::Cancelled)
            .await
    }

    /// The single write path for all item transitions
    async fn transition(
        &self,
        staff: &StaffIdentity,
        order_id: &str,
        item_id: &str,
        to: ItemStatus,
    ) -> AppResult<ItemStatusPayload> {
        let (payload, restaurant_id) = self.transition_cas(staff, order_id, item_id, to)?;

        tracing::info!(
            order_id = %payload.order_id,
            item_id = %payload.item.item_id,
            status = ?payload.item.status,
            staff = %staff.staff_id,
            "Item status changed"
        );
        self.broadcast(&payload, &restaurant_id).await;
        Ok(payload)
    }

    /// Conditional update inside one write transaction
    fn transition_cas(
        &self,
        staff: &StaffIdentity,
        order_id: &str,
        item_id: &str,
        to: ItemStatus,
    ) -> AppResult<(ItemStatusPayload, String)> {
        let txn = self.storage.begin_write()?;
        let mut order: Order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

        if order.restaurant_id != staff.restaurant_id {
            return Err(AppError::permission_denied(
                "Order belongs to another restaurant",
            ));
        }

        let item = order
            .item_mut(item_id)
            .ok_or_else(|| AppError::new(ErrorCode::OrderItemNotFound))?;
        let from = item.status;

        // 1. State machine: this is the compare half of the compare-and-set
        if !from.can_transition_to(to) {
            if to == ItemStatus::InProgress && from == ItemStatus::InProgress {
                return Err(AppError::new(ErrorCode::AlreadyClaimed)
                    .with_detail("claimed_by", item.claimed_by.clone()));
            }
            return Err(AppError::with_message(
                ErrorCode::InvalidTransition,
                format!("Cannot move item from {from:?} to {to:?}"),
            ));
        }

        // 2. Role capability
        if !staff.role.may_transition(from, to) {
            return Err(AppError::with_message(
                ErrorCode::RoleRequired,
                format!("Role {:?} may not perform this transition", staff.role),
            ));
        }

        // 3. Station membership for kitchen-side transitions
        if matches!(to, ItemStatus::InProgress | ItemStatus::Ready)
            && !staff.covers_station(&item.station)
        {
            return Err(AppError::with_message(
                ErrorCode::StationMismatch,
                format!("Not assigned to station {}", item.station),
            ));
        }

        let now = now_millis();
        item.status = to;
        match to {
            ItemStatus::InProgress => {
                item.claimed_by = Some(staff.staff_id.clone());
                item.claimed_by_name = Some(staff.name.clone());
            }
            ItemStatus::Ready => item.ready_at = Some(now),
            ItemStatus::Served => item.served_at = Some(now),
            ItemStatus::Cancelled => item.cancelled_at = Some(now),
            ItemStatus::New => {}
        }
        let updated_item = item.clone();

        let order_status = order.derived_status();
        if order_status != OrderStatus::Open {
            self.storage.mark_order_closed_txn(&txn, order_id)?;
        }
        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        let payload = ItemStatusPayload {
            order_id: order.order_id,
            order_number: order.order_number,
            session_id: order.session_id,
            item: updated_item,
            order_status,
        };
        Ok((payload, order.restaurant_id))
    }

    /// Fan out to the station (queue view), the table (progress view) and
    /// the restaurant (readiness view)
    async fn broadcast(&self, payload: &ItemStatusPayload, restaurant_id: &str) {
        let topics = vec![
            Topic::station(restaurant_id, &payload.item.station),
            Topic::session(&payload.session_id),
            Topic::restaurant(restaurant_id),
        ];
        self.hub
            .publish(BusMessage::item_status_changed(payload, topics))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartStore;
    use crate::message::BroadcastHub;
    use crate::orders::OrderService;
    use crate::sessions::SessionRegistry;
    use crate::testutil::{seed_catalog, test_stack};
    use shared::models::StaffRole;
    use std::time::Duration;

    struct Fixture {
        kitchen: KitchenService,
        order: Order,
        hub: Arc<BroadcastHub>,
    }

    fn chef(id: &str, stations: &[&str]) -> StaffIdentity {
        StaffIdentity {
            staff_id: id.to_string(),
            name: format!("Chef {id}"),
            role: StaffRole::Chef,
            restaurant_id: "r1".to_string(),
            stations: stations.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn waiter(id: &str) -> StaffIdentity {
        StaffIdentity {
            staff_id: id.to_string(),
            name: format!("Waiter {id}"),
            role: StaffRole::Waiter,
            restaurant_id: "r1".to_string(),
            stations: vec![],
        }
    }

    /// Join t1, add one grill item and one curry item, place the order
    async fn fixture() -> Fixture {
        let (storage, catalog, hub) = test_stack(seed_catalog());
        let sessions = SessionRegistry::new(storage.clone(), catalog.clone(), hub.clone());
        let session = sessions.join("t1", "1234").await.unwrap();
        let carts = CartStore::new(
            storage.clone(),
            catalog.clone(),
            sessions.clone(),
            hub.clone(),
        );
        let orders = OrderService::new(
            storage.clone(),
            catalog,
            sessions,
            hub.clone(),
            Duration::from_secs(5),
        );
        carts.add(&session.session_id, "m1", 1, &[]).await.unwrap();
        carts.add(&session.session_id, "m2", 1, &[]).await.unwrap();
        let order = orders.place(&session.session_id, "k1").await.unwrap();

        Fixture {
            kitchen: KitchenService::new(storage, hub.clone()),
            order,
            hub,
        }
    }

    #[tokio::test]
    async fn claim_records_claimant() {
        let f = fixture().await;
        let item_id = f.order.items[0].item_id.clone();

        let payload = f
            .kitchen
            .claim(&chef("c1", &["grill"]), &f.order.order_id, &item_id)
            .await
            .unwrap();
        assert_eq!(payload.item.status, ItemStatus::InProgress);
        assert_eq!(payload.item.claimed_by.as_deref(), Some("c1"));
        assert_eq!(payload.order_status, OrderStatus::Open);
    }

    #[tokio::test]
    async fn losing_claim_gets_already_claimed() {
        let f = fixture().await;
        let item_id = f.order.items[0].item_id.clone();

        f.kitchen
            .claim(&chef("c1", &["grill"]), &f.order.order_id, &item_id)
            .await
            .unwrap();
        let err = f
            .kitchen
            .claim(&chef("c2", &["grill"]), &f.order.order_id, &item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyClaimed);
        assert_eq!(err.details["claimed_by"], "c1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_have_exactly_one_winner() {
        let f = fixture().await;
        let item_id = f.order.items[0].item_id.clone();
        let c1 = chef("c1", &["grill"]);
        let c2 = chef("c2", &["grill"]);

        let (a, b) = tokio::join!(
            f.kitchen.claim(&c1, &f.order.order_id, &item_id),
            f.kitchen.claim(&c2, &f.order.order_id, &item_id),
        );

        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = if a.is_err() { a } else { b };
        assert_eq!(loser.unwrap_err().code, ErrorCode::AlreadyClaimed);
    }

    #[tokio::test]
    async fn station_membership_is_enforced() {
        let f = fixture().await;
        let grill_item = f.order.items[0].item_id.clone();

        let err = f
            .kitchen
            .claim(&chef("c1", &["curry"]), &f.order.order_id, &grill_item)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StationMismatch);

        // Empty station list means every station
        f.kitchen
            .claim(&chef("c2", &[]), &f.order.order_id, &grill_item)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn role_gates() {
        let f = fixture().await;
        let item_id = f.order.items[0].item_id.clone();

        // Waiter cannot claim
        let err = f
            .kitchen
            .claim(&waiter("w1"), &f.order.order_id, &item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);

        // Chef cannot serve
        let c = chef("c1", &["grill"]);
        f.kitchen.claim(&c, &f.order.order_id, &item_id).await.unwrap();
        f.kitchen
            .mark_ready(&c, &f.order.order_id, &item_id)
            .await
            .unwrap();
        let err = f
            .kitchen
            .serve(&c, &f.order.order_id, &item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);

        // Waiter serves
        let payload = f
            .kitchen
            .serve(&waiter("w1"), &f.order.order_id, &item_id)
            .await
            .unwrap();
        assert_eq!(payload.item.status, ItemStatus::Served);
        assert!(payload.item.served_at.is_some());
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected() {
        let f = fixture().await;
        let item_id = f.order.items[0].item_id.clone();
        let c = chef("c1", &["grill"]);

        // NEW -> READY skips claiming
        let err = f
            .kitchen
            .mark_ready(&c, &f.order.order_id, &item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        // NEW -> SERVED skips everything
        let err = f
            .kitchen
            .serve(&waiter("w1"), &f.order.order_id, &item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        // READY -> CANCELLED is not allowed
        f.kitchen.claim(&c, &f.order.order_id, &item_id).await.unwrap();
        f.kitchen
            .mark_ready(&c, &f.order.order_id, &item_id)
            .await
            .unwrap();
        let err = f
            .kitchen
            .cancel(&c, &f.order.order_id, &item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        // Terminal states admit nothing
        f.kitchen
            .serve(&waiter("w1"), &f.order.order_id, &item_id)
            .await
            .unwrap();
        let err = f
            .kitchen
            .claim(&c, &f.order.order_id, &item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn full_flow_derives_served_and_closes_order() {
        let f = fixture().await;
        let grill = chef("c1", &["grill"]);
        let curry = chef("c2", &["curry"]);
        let w = waiter("w1");
        let (i1, i2) = (
            f.order.items[0].item_id.clone(),
            f.order.items[1].item_id.clone(),
        );

        f.kitchen.claim(&grill, &f.order.order_id, &i1).await.unwrap();
        f.kitchen.mark_ready(&grill, &f.order.order_id, &i1).await.unwrap();
        let p = f.kitchen.serve(&w, &f.order.order_id, &i1).await.unwrap();
        assert_eq!(p.order_status, OrderStatus::Open, "second item still NEW");

        // Second item cancelled: order completes with partial cancellation
        let p = f.kitchen.cancel(&curry, &f.order.order_id, &i2).await.unwrap();
        assert_eq!(p.order_status, OrderStatus::Served);

        // Open index drops the completed order
        assert!(f.kitchen.queue("r1", None, QueueFilter::All).unwrap().is_empty());
    }

    #[tokio::test]
    async fn queue_filters_by_station_and_status() {
        let f = fixture().await;
        let grill = chef("c1", &["grill"]);
        let i1 = f.order.items[0].item_id.clone();

        let all = f.kitchen.queue("r1", None, QueueFilter::Active).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].items.len(), 2);

        let grill_only = f
            .kitchen
            .queue("r1", Some("grill"), QueueFilter::Active)
            .unwrap();
        assert_eq!(grill_only[0].items.len(), 1);
        assert_eq!(grill_only[0].items[0].station, "grill");

        f.kitchen.claim(&grill, &f.order.order_id, &i1).await.unwrap();
        let in_progress = f
            .kitchen
            .queue("r1", Some("grill"), QueueFilter::InProgress)
            .unwrap();
        assert_eq!(in_progress[0].items.len(), 1);
        assert!(f
            .kitchen
            .queue("r1", Some("grill"), QueueFilter::New)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn transitions_broadcast_to_station_session_and_restaurant() {
        let f = fixture().await;
        let mut rx = f.hub.subscribe();
        let item_id = f.order.items[0].item_id.clone();

        f.kitchen
            .claim(&chef("c1", &["grill"]), &f.order.order_id, &item_id)
            .await
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.event_type, shared::message::EventType::ItemStatusChanged);
        assert!(msg.topics.contains(&Topic::station("r1", "grill")));
        assert!(msg.topics.contains(&Topic::session(&f.order.session_id)));
        assert!(msg.topics.contains(&Topic::restaurant("r1")));

        let payload: ItemStatusPayload = msg.parse_payload().unwrap();
        assert_eq!(payload.item.status, ItemStatus::InProgress);
    }

    #[tokio::test]
    async fn wrong_restaurant_is_denied() {
        let f = fixture().await;
        let mut foreign = chef("c1", &["grill"]);
        foreign.restaurant_id = "r2".to_string();

        let err = f
            .kitchen
            .claim(&foreign, &f.order.order_id, &f.order.items[0].item_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
