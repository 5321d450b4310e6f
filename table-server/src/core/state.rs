//! Shared server state
//!
//! [`ServerState`] holds every singleton the request handlers and the bus
//! need. All members are cheap to clone (`Arc` or handle types), so the state
//! itself is the axum state and is cloned per request.

use std::sync::Arc;
use std::time::Duration;

use shared::message::{BusMessage, MenuUpdatePayload};
use shared::AppResult;

use crate::auth::JwtService;
use crate::cart::CartStore;
use crate::catalog::{CatalogFile, MenuCatalog};
use crate::core::Config;
use crate::kitchen::KitchenService;
use crate::message::{BroadcastHub, BusTcpServer, RpcDispatcher};
use crate::orders::OrderService;
use crate::sessions::SessionRegistry;
use crate::storage::PosStorage;

/// Server state - shared handles on every service
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: PosStorage,
    pub catalog: Arc<MenuCatalog>,
    pub hub: Arc<BroadcastHub>,
    pub jwt: Arc<JwtService>,
    pub sessions: SessionRegistry,
    pub carts: CartStore,
    pub orders: OrderService,
    pub kitchen: KitchenService,
}

impl ServerState {
    /// Initialize all services
    ///
    /// Order: work dir structure, storage, catalog, hub, then the domain
    /// services wired on top.
    ///
    /// # Panics
    ///
    /// Panics when the work directory or database cannot be initialized;
    /// there is nothing to serve without them.
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("tabletap.redb");
        let storage = PosStorage::open(&db_path).expect("Failed to open database");

        let catalog = if std::path::Path::new(&config.catalog_path).exists() {
            Arc::new(MenuCatalog::load(&config.catalog_path).expect("Failed to load catalog"))
        } else {
            tracing::warn!(path = %config.catalog_path, "Catalog file missing, starting empty");
            Arc::new(MenuCatalog::from_parts(CatalogFile {
                restaurant_id: "default".to_string(),
                tables: vec![],
                stations: vec![],
                items: vec![],
            }))
        };

        let hub = Arc::new(BroadcastHub::new());
        let jwt = Arc::new(JwtService::new(config.jwt.clone()));

        let sessions = SessionRegistry::new(storage.clone(), catalog.clone(), hub.clone());
        let carts = CartStore::new(
            storage.clone(),
            catalog.clone(),
            sessions.clone(),
            hub.clone(),
        );
        let orders = OrderService::new(
            storage.clone(),
            catalog.clone(),
            sessions.clone(),
            hub.clone(),
            Duration::from_millis(config.place_timeout_ms),
        );
        let kitchen = KitchenService::new(storage.clone(), hub.clone());

        Self {
            config: config.clone(),
            storage,
            catalog,
            hub,
            jwt,
            sessions,
            carts,
            orders,
            kitchen,
        }
    }

    /// Start background tasks; call before `Server::run` serves traffic
    ///
    /// Currently: the broadcast-hub TCP listener.
    pub fn start_background_tasks(&self) {
        let dispatcher = Arc::new(RpcDispatcher::new(self.kitchen.clone(), self.jwt.clone()));
        let server = BusTcpServer::new(
            self.hub.clone(),
            dispatcher,
            format!("0.0.0.0:{}", self.config.bus_tcp_port),
        );
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "Bus TCP server failed");
            }
        });
    }

    /// Re-read the catalog file and notify every restaurant-room subscriber
    pub async fn reload_catalog(&self) -> AppResult<u64> {
        let version = self.catalog.reload(&self.config.catalog_path)?;
        let payload = MenuUpdatePayload {
            restaurant_id: self.catalog.restaurant_id().to_string(),
            version,
        };
        self.hub.publish(BusMessage::menu_update(&payload)).await;
        Ok(version)
    }
}
