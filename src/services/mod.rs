pub mod existence_sync;
pub mod inventory_sync;
pub mod purchase_orders;
pub mod receipts;
pub mod serials;
pub mod side_effects;
pub mod special_orders;

use serde::{Deserialize, Serialize};

/// Acting user identity, carrying the set of locations the user may
/// operate on. An empty set means unrestricted access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub staff_member_id: i64,
    #[serde(default)]
    pub allowed_location_ids: Vec<i64>,
}

impl Identity {
    pub fn unrestricted(staff_member_id: i64) -> Self {
        Self {
            staff_member_id,
            allowed_location_ids: Vec::new(),
        }
    }

    pub fn may_access_location(&self, location_id: i64) -> bool {
        self.allowed_location_ids.is_empty() || self.allowed_location_ids.contains(&location_id)
    }
}
