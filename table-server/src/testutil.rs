//! Shared fixtures for unit tests

use std::sync::Arc;

use shared::models::{DiningTable, KitchenStation, MenuItem, ModifierOption};

use crate::catalog::{CatalogFile, MenuCatalog};
use crate::message::BroadcastHub;
use crate::storage::PosStorage;

/// Catalog used across service tests: two tables, two stations (one
/// archived), three items including one with a paid modifier.
pub fn seed_catalog() -> CatalogFile {
    CatalogFile {
        restaurant_id: "r1".into(),
        tables: vec![
            DiningTable {
                table_id: "t1".into(),
                restaurant_id: "r1".into(),
                name: "Table 1".into(),
                pin: "1234".into(),
            },
            DiningTable {
                table_id: "t2".into(),
                restaurant_id: "r1".into(),
                name: "Table 2".into(),
                pin: "5678".into(),
            },
        ],
        stations: vec![
            KitchenStation {
                station_id: "st1".into(),
                restaurant_id: "r1".into(),
                name: "grill".into(),
                is_archived: false,
            },
            KitchenStation {
                station_id: "st2".into(),
                restaurant_id: "r1".into(),
                name: "curry".into(),
                is_archived: false,
            },
            KitchenStation {
                station_id: "st3".into(),
                restaurant_id: "r1".into(),
                name: "fryer".into(),
                is_archived: true,
            },
        ],
        items: vec![
            MenuItem {
                menu_item_id: "m1".into(),
                restaurant_id: "r1".into(),
                name: "Masala Dosa".into(),
                price: 100.0,
                tax_rate: 5.0,
                station: Some("grill".into()),
                is_available: true,
                modifiers: vec![],
            },
            MenuItem {
                menu_item_id: "m2".into(),
                restaurant_id: "r1".into(),
                name: "Paneer Roll".into(),
                price: 100.0,
                tax_rate: 5.0,
                station: Some("curry".into()),
                is_available: true,
                modifiers: vec![ModifierOption {
                    modifier_id: "cheese".into(),
                    name: "Extra Cheese".into(),
                    price_delta: 5.0,
                }],
            },
            MenuItem {
                menu_item_id: "m3".into(),
                restaurant_id: "r1".into(),
                name: "Sweet Lassi".into(),
                price: 60.0,
                tax_rate: 5.0,
                station: None,
                is_available: true,
                modifiers: vec![],
            },
        ],
    }
}

/// In-memory storage + catalog + hub
pub fn test_stack(file: CatalogFile) -> (PosStorage, Arc<MenuCatalog>, Arc<BroadcastHub>) {
    let storage = PosStorage::open_in_memory().unwrap();
    let catalog = Arc::new(MenuCatalog::from_parts(file));
    let hub = Arc::new(BroadcastHub::new());
    (storage, catalog, hub)
}
