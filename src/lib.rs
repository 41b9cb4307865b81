// Vehicle Registry - Core Library
// Unit/card code assignment for the university vehicle registration sheet
//
// The remote spreadsheet is the system of record; this crate owns the pure
// in-memory logic: resolving unit codes from free-text unit names, keeping
// per-unit card sequences monotonic, and normalizing record batches before
// write-back.

pub mod record;
pub mod units;
pub mod sequencer;
pub mod normalizer;
pub mod import;
pub mod lookup;
pub mod stats;
pub mod qr;

// Re-export commonly used types
pub use record::{
    coerce_headers, is_blank, normalize_plate,
    Column, VehicleRecord, COLUMNS, NO_UNIT,
};
pub use units::{
    canonicalize, slug_unit,
    ResolveError, Unit, UnitDirectory, UnitRegistry, PLACEHOLDER_UNIT_CODE,
};
pub use sequencer::{CardOutcome, CardSequencer, DEFAULT_CARD_PAD};
pub use normalizer::{NormalizeEngine, NormalizeReport, RowError, RowErrorKind};
pub use import::{load_records, write_records, SourceFileStat};
pub use lookup::{find_record, plan_upsert, record_key, UpsertPlan};
pub use stats::{unit_breakdown, UnitBreakdown, UnitCount};
pub use qr::{card_link, link_batch, LinkBatch, QrLink};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
