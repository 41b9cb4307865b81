// 🎁 QR Links - Payload URLs for card QR codes
//
// Each registered vehicle gets a QR code pointing at the public lookup page
// with its card code as the id parameter. This module only builds the URLs
// and groups them per unit; rendering the PNGs is an external collaborator's
// job (image encoding is out of scope here).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::lookup::record_key;
use crate::record::{is_blank, VehicleRecord, NO_UNIT};

// ============================================================================
// LINK BUILDING
// ============================================================================

/// Build the QR payload URL for one card id
///
/// Example: card_link("https://x.test/car", "TRY001")
///          → "https://x.test/car?id=TRY001"
pub fn card_link(base_url: &str, id: &str) -> String {
    format!("{}?id={}", base_url, urlencoding::encode(id))
}

/// One QR link, ready for the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrLink {
    /// Card code, or normalized plate for records without one
    pub id: String,
    pub unit_code: String,
    pub url: String,
}

// ============================================================================
// LINK BATCH
// ============================================================================

/// QR links for a whole record set, grouped per unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkBatch {
    /// unit code → links, in deterministic unit order
    pub groups: BTreeMap<String, Vec<QrLink>>,

    /// Records with neither card code nor plate, skipped
    pub skipped: usize,
}

impl LinkBatch {
    pub fn link_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} QR links across {} units ({} records skipped)",
            self.link_count(),
            self.groups.len(),
            self.skipped
        )
    }
}

/// Build QR links for every record, grouped per unit code
///
/// Records without a unit code land in the NO_UNIT group; records with no
/// usable id at all are skipped and counted.
pub fn link_batch(records: &[VehicleRecord], base_url: &str) -> LinkBatch {
    let mut groups: BTreeMap<String, Vec<QrLink>> = BTreeMap::new();
    let mut skipped = 0;

    for record in records {
        let id = record_key(record);
        if id.is_empty() {
            skipped += 1;
            continue;
        }
        let unit_code = if is_blank(&record.unit_code) {
            NO_UNIT.to_string()
        } else {
            record.unit_code.trim().to_uppercase()
        };
        let url = card_link(base_url, &id);
        groups.entry(unit_code.clone()).or_default().push(QrLink {
            id,
            unit_code,
            url,
        });
    }

    LinkBatch { groups, skipped }
}

// ============================================================================
// TESTS
// ============================================================================
