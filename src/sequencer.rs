// 🎫 Card Sequencer - Per-unit monotonic card code allocation
//
// Card codes look like TRY001: unit code prefix + zero-padded sequence
// number. The sequencer keeps one counter per unit, seeded from the highest
// number already on the sheet, and only ever ratchets upward. Codes that a
// record already carries are never overwritten.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::{is_blank, VehicleRecord};

/// Default zero-padded width of the numeric field (TRY001)
pub const DEFAULT_CARD_PAD: usize = 3;

// ============================================================================
// CARD OUTCOME
// ============================================================================

/// What happened to one record's card code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CardOutcome {
    /// Blank code on the record; a fresh one was allocated
    Assigned { code: String },

    /// Record already carried a well-formed code; counter ratcheted, code
    /// returned unchanged
    Kept { code: String },

    /// Record carried a code that does not match the unit's pattern;
    /// returned unchanged, not counted toward seeding
    Passthrough { code: String },

    /// Unit code blank; nothing allocated, caller decides what to do
    NoUnit,
}

impl CardOutcome {
    /// The card code, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            CardOutcome::Assigned { code }
            | CardOutcome::Kept { code }
            | CardOutcome::Passthrough { code } => Some(code),
            CardOutcome::NoUnit => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, CardOutcome::Assigned { .. })
    }
}

// ============================================================================
// CARD SEQUENCER
// ============================================================================

/// Per-unit sequence counters for one normalization pass
pub struct CardSequencer {
    /// unit code (uppercased) → highest sequence number seen or assigned
    counters: HashMap<String, u64>,

    /// Zero-padded width of the numeric field
    pad: usize,
}

impl CardSequencer {
    pub fn new() -> Self {
        CardSequencer {
            counters: HashMap::new(),
            pad: DEFAULT_CARD_PAD,
        }
    }

    /// Sequencer with a deployment-specific field width (3 or 6)
    pub fn with_pad(pad: usize) -> Self {
        CardSequencer {
            counters: HashMap::new(),
            pad,
        }
    }

    /// Seed counters from the current-records snapshot
    ///
    /// Every card code matching its record's unit pattern ratchets that
    /// unit's counter to the maximum observed.
    pub fn seed_from(&mut self, current: &[VehicleRecord]) {
        for record in current {
            if is_blank(&record.unit_code) || is_blank(&record.card_code) {
                continue;
            }
            let unit = record.unit_code.trim().to_uppercase();
            if let Some(n) = match_sequence(&unit, &record.card_code) {
                self.ratchet(&unit, n);
            }
        }
    }

    /// Current counter value for a unit (0 if nothing seen)
    pub fn current(&self, unit_code: &str) -> u64 {
        self.counters
            .get(&unit_code.trim().to_uppercase())
            .copied()
            .unwrap_or(0)
    }

    /// Assign or validate the card code for one record
    ///
    /// A non-blank existing code is returned verbatim: pattern matches
    /// ratchet the counter (Kept), anything else passes through uncounted
    /// (Passthrough). Only blank codes trigger allocation.
    pub fn assign(&mut self, unit_code: &str, existing_card_code: &str) -> CardOutcome {
        if is_blank(unit_code) {
            return CardOutcome::NoUnit;
        }
        let unit = unit_code.trim().to_uppercase();

        if !is_blank(existing_card_code) {
            return match match_sequence(&unit, existing_card_code) {
                Some(n) => {
                    self.ratchet(&unit, n);
                    CardOutcome::Kept {
                        code: existing_card_code.to_string(),
                    }
                }
                None => CardOutcome::Passthrough {
                    code: existing_card_code.to_string(),
                },
            };
        }

        let next = self.current(&unit) + 1;
        self.counters.insert(unit.clone(), next);
        CardOutcome::Assigned {
            code: format!("{}{:0width$}", unit, next, width = self.pad),
        }
    }

    /// Counters never decrease within a pass
    fn ratchet(&mut self, unit: &str, value: u64) {
        let entry = self.counters.entry(unit.to_string()).or_insert(0);
        if value > *entry {
            *entry = value;
        }
    }
}

impl Default for CardSequencer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PATTERN MATCHING
// ============================================================================

/// Extract the sequence number from a card code matching {unit}{digits}
///
/// Case-insensitive on the prefix. Returns None for anything else, including
/// numbers too large to represent; those are out-of-band values.
///
/// Example: match_sequence("TRY", "try005") → Some(5)
fn match_sequence(unit_code: &str, card_code: &str) -> Option<u64> {
    let unit = unit_code.trim().to_uppercase();
    let code = card_code.trim().to_uppercase();
    let rest = code.strip_prefix(&unit)?;
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u64>().ok()
}

// ============================================================================
// TESTS
// ============================================================================
