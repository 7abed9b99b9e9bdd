//! Line item diff engine: compares the incoming document against the
//! persisted line items and produces the insert/update/delete sets, keyed
//! by the caller-supplied stable uuid.

use std::collections::HashSet;
use uuid::Uuid;

use crate::services::purchase_orders::{dto::LineItemInput, snapshot::LineItemSnapshot};

#[derive(Debug, Clone, Default)]
pub struct LineItemDiff {
    pub inserts: Vec<LineItemInput>,
    pub updates: Vec<LineItemInput>,
    pub deletes: Vec<Uuid>,
}

pub fn diff_line_items(incoming: &[LineItemInput], existing: &[LineItemSnapshot]) -> LineItemDiff {
    let existing_uuids: HashSet<Uuid> = existing.iter().map(|li| li.uuid).collect();
    let incoming_uuids: HashSet<Uuid> = incoming.iter().map(|li| li.uuid).collect();

    let mut diff = LineItemDiff::default();
    for li in incoming {
        if existing_uuids.contains(&li.uuid) {
            diff.updates.push(li.clone());
        } else {
            diff.inserts.push(li.clone());
        }
    }
    diff.deletes = existing
        .iter()
        .filter(|li| !incoming_uuids.contains(&li.uuid))
        .map(|li| li.uuid)
        .collect();
    diff
}
