//! Staff roles and capability checks
//!
//! Role-based UI branching in the clients reflects these server-side checks;
//! every state-machine transition is gated here, not in the UI.

use serde::{Deserialize, Serialize};

use super::order::ItemStatus;

/// Staff role carried in the JWT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Chef,
    Waiter,
    Manager,
}

impl StaffRole {
    /// May this role perform `from -> to` on an order item?
    ///
    /// Station membership is checked separately by the caller for claim and
    /// mark-ready.
    pub fn may_transition(self, from: ItemStatus, to: ItemStatus) -> bool {
        use ItemStatus::*;
        match (from, to) {
            // Claiming and readiness are kitchen work
            (New, InProgress) | (InProgress, Ready) => {
                matches!(self, StaffRole::Chef | StaffRole::Manager)
            }
            // Serving is floor work
            (Ready, Served) => matches!(self, StaffRole::Waiter | StaffRole::Manager),
            // Any staff member may cancel an active item
            (New, Cancelled) | (InProgress, Cancelled) => true,
            _ => false,
        }
    }
}

/// Authenticated staff member, as decoded from the JWT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub staff_id: String,
    pub name: String,
    pub role: StaffRole,
    pub restaurant_id: String,
    /// Stations this staff member works; empty means all stations
    #[serde(default)]
    pub stations: Vec<String>,
}

impl StaffIdentity {
    /// Whether this staff member is assigned to `station`
    pub fn covers_station(&self, station: &str) -> bool {
        self.stations.is_empty() || self.stations.iter().any(|s| s == station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chef_claims_waiter_serves() {
        use ItemStatus::*;
        assert!(StaffRole::Chef.may_transition(New, InProgress));
        assert!(!StaffRole::Waiter.may_transition(New, InProgress));
        assert!(StaffRole::Waiter.may_transition(Ready, Served));
        assert!(!StaffRole::Chef.may_transition(Ready, Served));
        assert!(StaffRole::Manager.may_transition(Ready, Served));
    }

    #[test]
    fn anyone_cancels_active_items_only() {
        use ItemStatus::*;
        for role in [StaffRole::Chef, StaffRole::Waiter, StaffRole::Manager] {
            assert!(role.may_transition(New, Cancelled));
            assert!(role.may_transition(InProgress, Cancelled));
            assert!(!role.may_transition(Ready, Cancelled));
            assert!(!role.may_transition(Served, Cancelled));
        }
    }

    #[test]
    fn empty_station_list_covers_everything() {
        let chef = StaffIdentity {
            staff_id: "c1".into(),
            name: "Asha".into(),
            role: StaffRole::Chef,
            restaurant_id: "r1".into(),
            stations: vec![],
        };
        assert!(chef.covers_station("grill"));

        let scoped = StaffIdentity {
            stations: vec!["fryer".into()],
            ..chef
        };
        assert!(scoped.covers_station("fryer"));
        assert!(!scoped.covers_station("grill"));
    }
}
