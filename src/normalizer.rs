// 🧮 Row Normalizer - Batch unit/card code assignment
//
// Takes a snapshot of current records plus an incoming batch, resolves a
// unit code for every incoming row and fills in missing card codes. State
// (unit registry, sequence counters) is seeded once from the snapshot and
// mutated row by row, so later rows in a batch see earlier rows'
// allocations. One bad row never aborts the pass; it lands in the error
// list and processing continues.
//
// NOT safe to run two passes concurrently against the same snapshot: both
// would seed the same counter maxima and allocate colliding codes on
// write-back. Serializing access to the store is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{is_blank, VehicleRecord};
use crate::sequencer::{CardOutcome, CardSequencer, DEFAULT_CARD_PAD};
use crate::units::{ResolveError, UnitDirectory, UnitRegistry};

// ============================================================================
// ROW ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowErrorKind {
    /// Unit name blank and no explicit code; no namespace to allocate in
    UnresolvableUnit,

    /// Fallback slug plus every numeric suffix already taken
    CollisionExhausted { base: String },
}

/// One incoming row the pass could not normalize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// Index of the row in the incoming batch
    pub index: usize,
    pub kind: RowErrorKind,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            RowErrorKind::UnresolvableUnit => {
                write!(f, "row {}: unit name blank, cannot resolve a unit code", self.index)
            }
            RowErrorKind::CollisionExhausted { base } => {
                write!(f, "row {}: no free unit code for slug base '{}'", self.index, base)
            }
        }
    }
}

impl std::error::Error for RowError {}

// ============================================================================
// NORMALIZE REPORT
// ============================================================================

/// Result of one normalization pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Incoming rows with unit_code/card_code filled in, error rows excluded
    pub records: Vec<VehicleRecord>,

    /// Rows the pass could not normalize, by incoming index
    pub errors: Vec<RowError>,

    /// Fresh card codes allocated this pass
    pub assigned_count: usize,

    /// Well-formed codes already on incoming rows, preserved
    pub kept_count: usize,

    /// Irregular codes tolerated as opaque values
    pub passthrough_count: usize,

    pub normalized_at: DateTime<Utc>,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Normalized {} rows: {} card codes assigned, {} kept, {} passthrough, {} error rows",
            self.records.len(),
            self.assigned_count,
            self.kept_count,
            self.passthrough_count,
            self.errors.len()
        )
    }
}

// ============================================================================
// NORMALIZE ENGINE
// ============================================================================

pub struct NormalizeEngine {
    directory: UnitDirectory,

    /// Zero-padded width of the card code numeric field (3 or 6)
    pub pad: usize,
}

impl NormalizeEngine {
    /// Engine with the office's default unit directory
    pub fn new() -> Self {
        NormalizeEngine {
            directory: UnitDirectory::with_defaults(),
            pad: DEFAULT_CARD_PAD,
        }
    }

    /// Engine with a caller-supplied directory
    pub fn with_directory(directory: UnitDirectory) -> Self {
        NormalizeEngine {
            directory,
            pad: DEFAULT_CARD_PAD,
        }
    }

    /// Set the card code field width
    pub fn with_pad(mut self, pad: usize) -> Self {
        self.pad = pad;
        self
    }

    /// Normalize an incoming batch against the current-records snapshot
    ///
    /// Registry and counters are seeded from `current` once, then every
    /// incoming row is resolved and sequenced in order. Incoming order
    /// determines sequence numbers.
    pub fn normalize_batch(
        &self,
        current: &[VehicleRecord],
        incoming: &[VehicleRecord],
    ) -> NormalizeReport {
        let mut registry = UnitRegistry::for_snapshot(self.directory.clone(), current);
        let mut sequencer = CardSequencer::with_pad(self.pad);
        sequencer.seed_from(current);

        let mut records = Vec::with_capacity(incoming.len());
        let mut errors = Vec::new();
        let mut assigned_count = 0;
        let mut kept_count = 0;
        let mut passthrough_count = 0;

        for (index, row) in incoming.iter().enumerate() {
            let unit_code = match registry.resolve(&row.unit_name, &row.unit_code) {
                Ok(code) => code,
                Err(err) => {
                    errors.push(RowError {
                        index,
                        kind: match err {
                            ResolveError::UnresolvableUnit => RowErrorKind::UnresolvableUnit,
                            ResolveError::CollisionExhausted { base } => {
                                RowErrorKind::CollisionExhausted { base }
                            }
                        },
                    });
                    continue;
                }
            };

            let mut record = row.clone();
            record.unit_code = unit_code.clone();

            match sequencer.assign(&unit_code, &row.card_code) {
                CardOutcome::Assigned { code } => {
                    record.card_code = code;
                    assigned_count += 1;
                }
                CardOutcome::Kept { .. } => kept_count += 1,
                CardOutcome::Passthrough { .. } => passthrough_count += 1,
                // resolve() never returns a blank code
                CardOutcome::NoUnit => debug_assert!(is_blank(&unit_code)),
            }

            records.push(record);
        }

        NormalizeReport {
            records,
            errors,
            assigned_count,
            kept_count,
            passthrough_count,
            normalized_at: Utc::now(),
        }
    }
}

impl Default for NormalizeEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::VehicleRecord;
    use crate::units::{Unit, UnitDirectory};

    fn incoming(unit_name: &str, card_code: &str) -> VehicleRecord {
        VehicleRecord::new()
            .with_unit_name(unit_name)
            .with_card_code(card_code)
    }

    #[test]
    fn test_empty_snapshot_sequences_from_one() {
        let mut directory = UnitDirectory::new();
        directory.register(Unit::new("Trường Y", "TRY"));
        let engine = NormalizeEngine::with_directory(directory);

        let batch = vec![incoming("Trường Y", ""), incoming("Trường Y", "")];
        let report = engine.normalize_batch(&[], &batch);

        assert!(report.is_clean());
        assert_eq!(report.records[0].unit_code, "TRY");
        assert_eq!(report.records[1].unit_code, "TRY");
        assert_eq!(report.records[0].card_code, "TRY001");
        assert_eq!(report.records[1].card_code, "TRY002");
        assert_eq!(report.assigned_count, 2);
    }

    #[test]
    fn test_sequences_continue_from_snapshot() {
        let engine = NormalizeEngine::new();
        let current = vec![VehicleRecord::new()
            .with_unit_code("RHM")
            .with_card_code("RHM005")];
        let report = engine.normalize_batch(&current, &[incoming("RHM", "")]);

        assert_eq!(report.records[0].unit_code, "RHM");
        assert_eq!(report.records[0].card_code, "RHM006");
    }

    #[test]
    fn test_blank_row_flagged_and_excluded() {
        let engine = NormalizeEngine::new();
        let batch = vec![incoming("", ""), incoming("Trường Y", "")];
        let report = engine.normalize_batch(&[], &batch);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].index, 0);
        assert_eq!(report.errors[0].kind, RowErrorKind::UnresolvableUnit);
        // The pass continued past the bad row
        assert_eq!(report.records[0].card_code, "TRY001");
    }

    #[test]
    fn test_unknown_unit_shares_slug_within_batch() {
        let engine = NormalizeEngine::new();
        let batch = vec![incoming("Phòng ABC", ""), incoming("Phòng ABC", "")];
        let report = engine.normalize_batch(&[], &batch);

        assert_eq!(report.records[0].unit_code, "PA");
        assert_eq!(report.records[1].unit_code, "PA");
        assert_eq!(report.records[0].card_code, "PA001");
        assert_eq!(report.records[1].card_code, "PA002");
    }

    #[test]
    fn test_existing_card_code_untouched() {
        let engine = NormalizeEngine::new();
        let batch = vec![
            incoming("Trường Y", "TRY009"),
            incoming("Trường Y", "THẺ-CŨ-7"),
            incoming("Trường Y", ""),
        ];
        let report = engine.normalize_batch(&[], &batch);

        assert_eq!(report.records[0].card_code, "TRY009");
        assert_eq!(report.records[1].card_code, "THẺ-CŨ-7");
        // New allocation continues above the kept code; passthrough ignored
        assert_eq!(report.records[2].card_code, "TRY010");
        assert_eq!(report.kept_count, 1);
        assert_eq!(report.passthrough_count, 1);
        assert_eq!(report.assigned_count, 1);
    }

    #[test]
    fn test_no_duplicate_card_codes_across_batch_and_snapshot() {
        let engine = NormalizeEngine::new();
        let current = vec![
            VehicleRecord::new()
                .with_unit_name("Trường Y")
                .with_unit_code("TRY")
                .with_card_code("TRY003"),
            VehicleRecord::new()
                .with_unit_name("RHM")
                .with_unit_code("RHM")
                .with_card_code("RHM001"),
        ];
        let batch = vec![
            incoming("Trường Y", ""),
            incoming("RHM", ""),
            incoming("Trường Y", ""),
        ];
        let report = engine.normalize_batch(&current, &batch);

        let mut all_codes: Vec<String> = current.iter().map(|r| r.card_code.clone()).collect();
        all_codes.extend(report.records.iter().map(|r| r.card_code.clone()));
        let unique: std::collections::HashSet<&String> = all_codes.iter().collect();
        assert_eq!(unique.len(), all_codes.len());
    }

    #[test]
    fn test_repeated_normalization_is_idempotent() {
        let engine = NormalizeEngine::new();
        let batch = vec![incoming("Trường Dược", ""), incoming("Phòng ABC", "")];

        let first = engine.normalize_batch(&[], &batch);
        // Re-import the already-normalized rows against themselves as snapshot
        let second = engine.normalize_batch(&first.records, &first.records);

        assert!(second.is_clean());
        assert_eq!(second.records, first.records);
        assert_eq!(second.assigned_count, 0);
        assert_eq!(second.kept_count, 2);
    }

    #[test]
    fn test_passengers_untouched() {
        let engine = NormalizeEngine::new();
        let mut row = incoming("Trường Y", "");
        row.full_name = "Nguyễn Văn A".to_string();
        row.plate = "59A12345".to_string();
        row.email = "a@ump.edu.vn".to_string();

        let report = engine.normalize_batch(&[], &[row]);
        let out = &report.records[0];
        assert_eq!(out.full_name, "Nguyễn Văn A");
        assert_eq!(out.plate, "59A12345");
        assert_eq!(out.email, "a@ump.edu.vn");
    }

    #[test]
    fn test_summary_counts() {
        let engine = NormalizeEngine::new();
        let batch = vec![incoming("Trường Y", ""), incoming("", "")];
        let report = engine.normalize_batch(&[], &batch);
        let summary = report.summary();
        assert!(summary.contains("1 card codes assigned"));
        assert!(summary.contains("1 error rows"));
    }
}
