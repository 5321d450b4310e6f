//! Domain models
//!
//! - [`session`]: table sessions (PIN join lifecycle)
//! - [`table`]: dining table configuration
//! - [`menu`]: menu entries as the catalog exposes them to the core
//! - [`cart`]: per-session cart snapshot
//! - [`order`]: immutable orders and the per-item status lifecycle
//! - [`station`]: kitchen stations
//! - [`staff`]: staff roles and capability checks

pub mod cart;
pub mod menu;
pub mod order;
pub mod session;
pub mod staff;
pub mod station;
pub mod table;

pub use cart::{Cart, CartLine, ModifierSelection};
pub use menu::{MenuItem, ModifierOption};
pub use order::{ItemStatus, Order, OrderItem, OrderStatus};
pub use session::{Session, SessionStatus};
pub use staff::{StaffIdentity, StaffRole};
pub use station::{DEFAULT_STATION, KitchenStation};
pub use table::DiningTable;
