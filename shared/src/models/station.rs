//! Kitchen station configuration

use serde::{Deserialize, Serialize};

/// Station items fall back to when a menu item has no station configured, or
/// when its configured station has been archived.
pub const DEFAULT_STATION: &str = "expo";

/// A named kitchen prep area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenStation {
    pub station_id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Archived stations stop receiving newly placed items; items already
    /// routed to them complete normally.
    #[serde(default)]
    pub is_archived: bool,
}
