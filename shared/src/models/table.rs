//! Dining table configuration

use serde::{Deserialize, Serialize};

/// A physical table, as configured in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub table_id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Join PIN printed on the table card
    pub pin: String,
}
