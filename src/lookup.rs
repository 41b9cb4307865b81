// 🔍 Lookup - Record search + upsert planning
//
// The QR scan path and the bulk-upload path both need the same keying rule:
// a record is identified by its card code, falling back to its normalized
// plate when the card code is blank.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::{is_blank, normalize_plate, VehicleRecord};

// ============================================================================
// KEYING
// ============================================================================

/// Identity key of a record: card code, else normalized plate, else blank
///
/// Example: card "try001" → "TRY001"; no card, plate "59-A1 234" → "59A1234"
pub fn record_key(record: &VehicleRecord) -> String {
    if !is_blank(&record.card_code) {
        return record.card_code.trim().to_uppercase();
    }
    normalize_plate(&record.plate)
}

// ============================================================================
// SEARCH
// ============================================================================

/// Find a record by card code or plate
///
/// Card code match is case-insensitive and exact; plate match compares
/// normalized plates. This is the QR scan query, minus the UI around it.
pub fn find_record<'a>(records: &'a [VehicleRecord], query: &str) -> Option<&'a VehicleRecord> {
    if is_blank(query) {
        return None;
    }

    let by_card = query.trim().to_uppercase();
    if let Some(found) = records
        .iter()
        .find(|r| r.card_code.trim().to_uppercase() == by_card)
    {
        return Some(found);
    }

    let by_plate = normalize_plate(query);
    if by_plate.is_empty() {
        return None;
    }
    records
        .iter()
        .find(|r| normalize_plate(&r.plate) == by_plate)
}

// ============================================================================
// UPSERT PLAN
// ============================================================================

/// How an incoming batch maps onto the current snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPlan {
    /// (snapshot row index, replacement record) for keys already present
    pub updates: Vec<(usize, VehicleRecord)>,

    /// Records whose key is new (or who have no key at all)
    pub inserts: Vec<VehicleRecord>,
}

impl UpsertPlan {
    pub fn summary(&self) -> String {
        format!(
            "Upsert plan: {} updates, {} inserts",
            self.updates.len(),
            self.inserts.len()
        )
    }
}

/// Split an incoming batch into updates and inserts against a snapshot
///
/// First snapshot row with a given key wins as the update target; keyless
/// incoming rows are always inserts.
pub fn plan_upsert(current: &[VehicleRecord], incoming: &[VehicleRecord]) -> UpsertPlan {
    let mut key_to_row: HashMap<String, usize> = HashMap::new();
    for (i, record) in current.iter().enumerate() {
        let key = record_key(record);
        if !key.is_empty() {
            key_to_row.entry(key).or_insert(i);
        }
    }

    let mut updates = Vec::new();
    let mut inserts = Vec::new();
    for record in incoming {
        // Empty keys are never in the map, so keyless rows fall to inserts
        match key_to_row.get(&record_key(record)) {
            Some(&row) => updates.push((row, record.clone())),
            None => inserts.push(record.clone()),
        }
    }

    UpsertPlan { updates, inserts }
}

// ============================================================================
// TESTS
// ============================================================================
