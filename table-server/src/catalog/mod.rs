//! Menu catalog read cache
//!
//! Catalog CRUD is an external concern; the core only needs fast lookup of
//! menu items, tables and stations. The catalog is loaded from a JSON file at
//! startup and cached in lock-free maps. `reload()` swaps the contents in
//! place and bumps a version number that rides on the `menu:update` broadcast,
//! so connected clients know to re-fetch.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use shared::error::ErrorCode;
use shared::models::{DEFAULT_STATION, DiningTable, KitchenStation, MenuItem};
use shared::{AppError, AppResult};

/// On-disk catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub restaurant_id: String,
    #[serde(default)]
    pub tables: Vec<DiningTable>,
    #[serde(default)]
    pub stations: Vec<KitchenStation>,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// In-memory catalog cache
#[derive(Debug)]
pub struct MenuCatalog {
    restaurant_id: String,
    items: DashMap<String, MenuItem>,
    tables: DashMap<String, DiningTable>,
    stations: DashMap<String, KitchenStation>,
    version: AtomicU64,
}

impl MenuCatalog {
    /// Load the catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            AppError::internal(format!(
                "Failed to read catalog {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let file: CatalogFile = serde_json::from_slice(&bytes)?;
        tracing::info!(
            restaurant_id = %file.restaurant_id,
            items = file.items.len(),
            tables = file.tables.len(),
            stations = file.stations.len(),
            "Catalog loaded"
        );
        Ok(Self::from_parts(file))
    }

    /// Build a catalog from already-parsed parts
    pub fn from_parts(file: CatalogFile) -> Self {
        let catalog = Self {
            restaurant_id: file.restaurant_id.clone(),
            items: DashMap::new(),
            tables: DashMap::new(),
            stations: DashMap::new(),
            version: AtomicU64::new(1),
        };
        catalog.replace_contents(file);
        catalog
    }

    fn replace_contents(&self, file: CatalogFile) {
        self.items.clear();
        self.tables.clear();
        self.stations.clear();
        for item in file.items {
            self.items.insert(item.menu_item_id.clone(), item);
        }
        for table in file.tables {
            self.tables.insert(table.table_id.clone(), table);
        }
        for station in file.stations {
            self.stations.insert(station.name.clone(), station);
        }
    }

    /// Re-read the catalog file and bump the version
    pub fn reload(&self, path: impl AsRef<Path>) -> AppResult<u64> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            AppError::internal(format!(
                "Failed to read catalog {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let file: CatalogFile = serde_json::from_slice(&bytes)?;
        self.replace_contents(file);
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(version, "Catalog reloaded");
        Ok(version)
    }

    pub fn restaurant_id(&self) -> &str {
        &self.restaurant_id
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn item(&self, menu_item_id: &str) -> Option<MenuItem> {
        self.items.get(menu_item_id).map(|e| e.value().clone())
    }

    pub fn require_item(&self, menu_item_id: &str) -> AppResult<MenuItem> {
        self.item(menu_item_id).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::MenuItemNotFound,
                format!("Menu item {menu_item_id} not found"),
            )
        })
    }

    pub fn table(&self, table_id: &str) -> Option<DiningTable> {
        self.tables.get(table_id).map(|e| e.value().clone())
    }

    pub fn station(&self, name: &str) -> Option<KitchenStation> {
        self.stations.get(name).map(|e| e.value().clone())
    }

    /// All menu items, sorted by name
    pub fn items(&self) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self.items.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    /// All configured stations
    pub fn stations(&self) -> Vec<KitchenStation> {
        let mut stations: Vec<KitchenStation> =
            self.stations.iter().map(|e| e.value().clone()).collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        stations
    }

    /// Station an item routes to at placement time
    ///
    /// Unconfigured and archived stations both fall back to the default
    /// station; items already routed elsewhere are not affected by later
    /// catalog changes.
    pub fn resolve_station(&self, item: &MenuItem) -> String {
        match &item.station {
            Some(name) => match self.station(name) {
                Some(station) if !station.is_archived => station.name,
                Some(_) => {
                    tracing::debug!(station = %name, item = %item.menu_item_id, "Station archived, routing to default");
                    DEFAULT_STATION.to_string()
                }
                None => DEFAULT_STATION.to_string(),
            },
            None => DEFAULT_STATION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> MenuCatalog {
        MenuCatalog::from_parts(CatalogFile {
            restaurant_id: "r1".into(),
            tables: vec![DiningTable {
                table_id: "t1".into(),
                restaurant_id: "r1".into(),
                name: "Table 1".into(),
                pin: "1234".into(),
            }],
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
                    name: "fryer".into(),
                    is_archived: true,
                },
            ],
            items: vec![
                MenuItem {
                    menu_item_id: "m1".into(),
                    restaurant_id: "r1".into(),
                    name: "Paneer Tikka".into(),
                    price: 180.0,
                    tax_rate: 5.0,
                    station: Some("grill".into()),
                    is_available: true,
                    modifiers: vec![],
                },
                MenuItem {
                    menu_item_id: "m2".into(),
                    restaurant_id: "r1".into(),
                    name: "Fries".into(),
                    price: 90.0,
                    tax_rate: 5.0,
                    station: Some("fryer".into()),
                    is_available: true,
                    modifiers: vec![],
                },
                MenuItem {
                    menu_item_id: "m3".into(),
                    restaurant_id: "r1".into(),
                    name: "Lassi".into(),
                    price: 60.0,
                    tax_rate: 5.0,
                    station: None,
                    is_available: true,
                    modifiers: vec![],
                },
            ],
        })
    }

    #[test]
    fn station_resolution() {
        let catalog = test_catalog();
        let grill_item = catalog.item("m1").unwrap();
        let fryer_item = catalog.item("m2").unwrap();
        let no_station = catalog.item("m3").unwrap();

        assert_eq!(catalog.resolve_station(&grill_item), "grill");
        // Archived station falls back to the default
        assert_eq!(catalog.resolve_station(&fryer_item), DEFAULT_STATION);
        assert_eq!(catalog.resolve_station(&no_station), DEFAULT_STATION);
    }

    #[test]
    fn missing_item_is_an_error() {
        let catalog = test_catalog();
        let err = catalog.require_item("nope").unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemNotFound);
    }
}
