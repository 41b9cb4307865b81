// 🏛️ Unit Entities - Stable unit codes + name resolution
//
// Problem solved:
// - "BV ĐHYD", "bvdhyd", "BV DHYD" → all the same unit, code "BVY"
// - Units not in the office dictionary get a deterministic slugged code
// - Codes already on the sheet keep winning over everything derived
//
// Unit code is the namespace prefix for card codes, so resolution has to be
// stable: the same name must map to the same code on every pass.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::record::{is_blank, VehicleRecord};

/// Generic code for units whose name yields no usable characters
pub const PLACEHOLDER_UNIT_CODE: &str = "DV";

/// Maximum slug length in characters
const SLUG_MAX_LEN: usize = 8;

/// Bound on numeric collision suffixes before giving up
const SUFFIX_LIMIT: u32 = 9999;

// ============================================================================
// CANONICALIZATION
// ============================================================================

/// Canonicalize a name for lookup keys
///
/// NFD decomposition, combining marks stripped, Đ/đ folded to D/d,
/// whitespace collapsed, lowercased.
///
/// Example: "BV  ĐHYD" → "bv dhyd", "Trường Y" → "truong y"
pub fn canonicalize(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect();

    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a fallback unit code from a display name
///
/// Policy: uppercase initials of the canonicalized name's words; a
/// single-word name falls back to its first letters; no usable characters
/// at all yields the generic placeholder.
///
/// Example: "Phòng ABC" → "PA", "Thư viện" → "TV", "Kho" → "KHO"
pub fn slug_unit(name: &str) -> String {
    let canon = canonicalize(name);
    let words: Vec<&str> = canon
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return PLACEHOLDER_UNIT_CODE.to_string();
    }

    let initials: String = words
        .iter()
        .filter_map(|w| w.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect();

    if initials.chars().count() > 1 {
        return initials.chars().take(SLUG_MAX_LEN).collect();
    }

    // Single-word name: first letters of the flattened name
    let flat: String = canon
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_uppercase())
        .take(SLUG_MAX_LEN)
        .collect();

    if flat.is_empty() {
        PLACEHOLDER_UNIT_CODE.to_string()
    } else {
        flat
    }
}

// ============================================================================
// UNIT ENTITY
// ============================================================================

/// One organizational unit
///
/// Identity: UUID (never changes)
/// Values: canonical display name, code, known misspellings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identity
    pub id: String,

    /// Canonical display name, as the office writes it
    pub canonical_name: String,

    /// Short code, namespace prefix for card codes
    pub code: String,

    /// Known misspellings/variants that map to this unit
    pub aliases: Vec<String>,
}

impl Unit {
    /// Create a new unit entity with UUID
    pub fn new(canonical_name: &str, code: &str) -> Self {
        Unit {
            id: uuid::Uuid::new_v4().to_string(),
            canonical_name: canonical_name.to_string(),
            code: code.to_string(),
            aliases: Vec::new(),
        }
    }

    /// Add an alias to this unit
    pub fn add_alias(&mut self, alias: &str) {
        if !self.aliases.iter().any(|a| a == alias) && alias != self.canonical_name {
            self.aliases.push(alias.to_string());
        }
    }

    /// Check if a canonicalized name key matches this unit
    pub fn matches_key(&self, key: &str) -> bool {
        if canonicalize(&self.canonical_name) == key {
            return true;
        }
        self.aliases.iter().any(|a| canonicalize(a) == key)
    }
}

// ============================================================================
// UNIT DIRECTORY
// ============================================================================

/// The institution-maintained name→code dictionary plus alias table
///
/// Static configuration: ships with the office's current list, replaceable
/// wholesale by the caller. Per-pass state lives in `UnitRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDirectory {
    units: Vec<Unit>,
}

impl UnitDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        UnitDirectory { units: Vec::new() }
    }

    /// Create directory pre-loaded with the office's unit list
    pub fn with_defaults() -> Self {
        let mut directory = UnitDirectory::new();
        directory.register_default_units();
        directory
    }

    /// The unit list as maintained by the administrative office
    fn register_default_units(&mut self) {
        let entries = [
            ("HCTH", "HCT"),
            ("TCCB", "TCC"),
            ("ĐTĐH", "DTD"),
            ("ĐTSĐH", "DTS"),
            ("KHCN", "KHC"),
            ("KHTC", "KHT"),
            ("QTGT", "QTG"),
            ("TTPC", "TTP"),
            ("ĐBCLGD&KT", "DBK"),
            ("CTSV", "CTS"),
            ("Trường Y", "TRY"),
            ("Trường Dược", "TRD"),
            ("Trường ĐD-KTYH", "TRK"),
            ("KHCB", "KHB"),
            ("RHM", "RHM"),
            ("YTCC", "YTC"),
            ("PK.CKRHM", "CKR"),
            ("TT.KCCLXN", "KCL"),
            ("TT.PTTN", "PTN"),
            ("TT.ĐTNLYT", "DTL"),
            ("TT.CNTT", "CNT"),
            ("TT.KHCN UMP", "KCU"),
            ("TT.YSHPT", "YSH"),
            ("Thư viện", "TV"),
            ("KTX", "KTX"),
            ("Tạp chí Y học", "TCY"),
            ("BV ĐHYD", "BVY"),
            ("TT. GDYH", "GDY"),
            ("VPĐ", "VPD"),
            ("YHCT", "YHC"),
            ("HTQT", "HTQ"),
        ];
        for (name, code) in entries {
            self.register(Unit::new(name, code));
        }

        // Misspellings the office keeps seeing on import files
        self.add_alias("BV ĐHYD", "bvdhyd");
        self.add_alias("BV ĐHYD", "bvdvyd");
        self.add_alias("BV ĐHYD", "bv dvyd");
        self.add_alias("RHM", "rmh");
    }

    /// Register a unit
    pub fn register(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// Attach an alias to an existing unit by canonical name
    pub fn add_alias(&mut self, canonical_name: &str, alias: &str) {
        if let Some(unit) = self
            .units
            .iter_mut()
            .find(|u| u.canonical_name == canonical_name)
        {
            unit.add_alias(alias);
        }
    }

    /// Find a unit by display name (canonical name or alias, any spelling)
    pub fn find_by_name(&self, name: &str) -> Option<&Unit> {
        let key = canonicalize(name);
        // Canonical names first, aliases second
        self.units
            .iter()
            .find(|u| canonicalize(&u.canonical_name) == key)
            .or_else(|| self.units.iter().find(|u| u.matches_key(&key)))
    }

    /// Look up the code for a display name
    pub fn code_for(&self, name: &str) -> Option<String> {
        self.find_by_name(name).map(|u| u.code.clone())
    }

    /// All registered codes
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.code.as_str())
    }

    /// Number of registered units
    pub fn count(&self) -> usize {
        self.units.len()
    }
}

impl Default for UnitDirectory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// RESOLVE ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolveError {
    /// Unit name blank and no explicit code on the record
    UnresolvableUnit,

    /// Slug base plus every numeric suffix up to the bound already taken
    CollisionExhausted { base: String },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::UnresolvableUnit => write!(f, "unit name is blank, no code derivable"),
            ResolveError::CollisionExhausted { base } => {
                write!(f, "no free code left for slug base '{}'", base)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

// ============================================================================
// UNIT REGISTRY (per-pass resolve state)
// ============================================================================

/// Resolution state for one normalization pass
///
/// Built fresh from the current-records snapshot, mutated row by row as the
/// batch allocates new codes, discarded when the pass ends. Lookup order:
/// explicit code on the record, alias/dictionary, codes seen so far
/// (snapshot + this batch), fallback slug with collision suffixing.
pub struct UnitRegistry {
    directory: UnitDirectory,

    /// Canonicalized name → code, seeded from the snapshot and extended as
    /// the batch discovers new units
    seen: HashMap<String, String>,

    /// Every code that may no longer be handed out to a new slug
    used_codes: HashSet<String>,
}

impl UnitRegistry {
    /// Build resolve state from the current-records snapshot
    pub fn for_snapshot(directory: UnitDirectory, current: &[VehicleRecord]) -> Self {
        let mut used_codes: HashSet<String> =
            directory.codes().map(|c| c.to_uppercase()).collect();
        let mut seen = HashMap::new();

        for record in current {
            if is_blank(&record.unit_code) {
                continue;
            }
            let code = record.unit_code.trim().to_uppercase();
            used_codes.insert(code.clone());
            if !is_blank(&record.unit_name) {
                seen.entry(canonicalize(&record.unit_name)).or_insert(code);
            }
        }

        UnitRegistry {
            directory,
            seen,
            used_codes,
        }
    }

    /// Resolve a unit code for one record
    ///
    /// An explicit code on the record always wins, no re-derivation. Blank
    /// name with no explicit code is the caller's UnresolvableUnit case.
    pub fn resolve(&mut self, unit_name: &str, existing_code: &str) -> Result<String, ResolveError> {
        if !is_blank(existing_code) {
            let code = existing_code.trim().to_uppercase();
            self.used_codes.insert(code.clone());
            if !is_blank(unit_name) {
                self.seen
                    .entry(canonicalize(unit_name))
                    .or_insert_with(|| code.clone());
            }
            return Ok(code);
        }

        if is_blank(unit_name) {
            return Err(ResolveError::UnresolvableUnit);
        }

        let key = canonicalize(unit_name);

        // 1+2. Alias table and office dictionary
        if let Some(unit) = self.directory.find_by_name(unit_name) {
            let code = unit.code.to_uppercase();
            self.seen.entry(key).or_insert_with(|| code.clone());
            return Ok(code);
        }

        // 3. Codes already observed (snapshot or earlier in this batch)
        if let Some(code) = self.seen.get(&key) {
            return Ok(code.clone());
        }

        // 4. Fallback slug, suffixed until free
        let base = slug_unit(unit_name);
        let mut candidate = base.clone();
        let mut suffix = 2u32;
        while self.used_codes.contains(&candidate.to_uppercase()) {
            if suffix > SUFFIX_LIMIT {
                return Err(ResolveError::CollisionExhausted { base });
            }
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }

        self.used_codes.insert(candidate.to_uppercase());
        self.seen.insert(key, candidate.clone());
        Ok(candidate)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_strips_diacritics() {
        assert_eq!(canonicalize("Trường Y"), "truong y");
        assert_eq!(canonicalize("BV ĐHYD"), "bv dhyd");
        assert_eq!(canonicalize("  Thư   viện "), "thu vien");
        assert_eq!(canonicalize("ĐTSĐH"), "dtsdh");
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn test_slug_initials() {
        assert_eq!(slug_unit("Phòng ABC"), "PA");
        assert_eq!(slug_unit("Trung Tâm Dữ Liệu"), "TTDL");
        assert_eq!(slug_unit("Thư viện"), "TV");
    }

    #[test]
    fn test_slug_single_word_falls_back_to_letters() {
        assert_eq!(slug_unit("Kho"), "KHO");
        assert_eq!(slug_unit("Hậucần"), "HAUCAN");
    }

    #[test]
    fn test_slug_degenerate_names() {
        assert_eq!(slug_unit(""), PLACEHOLDER_UNIT_CODE);
        assert_eq!(slug_unit("   "), PLACEHOLDER_UNIT_CODE);
        assert_eq!(slug_unit("###"), PLACEHOLDER_UNIT_CODE);
    }

    #[test]
    fn test_directory_lookup_any_spelling() {
        let directory = UnitDirectory::with_defaults();
        assert_eq!(directory.code_for("Trường Y"), Some("TRY".to_string()));
        assert_eq!(directory.code_for("TRUONG Y"), Some("TRY".to_string()));
        assert_eq!(directory.code_for("trường y"), Some("TRY".to_string()));
        assert_eq!(directory.code_for("Phòng lạ"), None);
    }

    #[test]
    fn test_directory_alias_resolution() {
        // alias "bvdhyd" → "BV ĐHYD", dictionary "BV ĐHYD" → "BVY"
        let directory = UnitDirectory::with_defaults();
        assert_eq!(directory.code_for("bvdhyd"), Some("BVY".to_string()));
        assert_eq!(directory.code_for("BV ĐHYD"), Some("BVY".to_string()));
        assert_eq!(directory.code_for("bv dhyd"), Some("BVY".to_string()));
        assert_eq!(directory.code_for("rmh"), Some("RHM".to_string()));
    }

    #[test]
    fn test_resolve_explicit_code_wins() {
        let mut registry = UnitRegistry::for_snapshot(UnitDirectory::with_defaults(), &[]);
        // Even a dictionary name keeps its explicit code
        assert_eq!(
            registry.resolve("Trường Y", " xyz "),
            Ok("XYZ".to_string())
        );
    }

    #[test]
    fn test_resolve_snapshot_code_reused() {
        let current = vec![VehicleRecord::new()
            .with_unit_name("Ban Xe Buýt")
            .with_unit_code("BXB")];
        let mut registry = UnitRegistry::for_snapshot(UnitDirectory::with_defaults(), &current);
        assert_eq!(registry.resolve("ban xe buyt", ""), Ok("BXB".to_string()));
    }

    #[test]
    fn test_resolve_idempotent() {
        let mut registry = UnitRegistry::for_snapshot(UnitDirectory::with_defaults(), &[]);
        let first = registry.resolve("Phòng ABC", "").unwrap();
        let second = registry.resolve("Phòng ABC", "").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "PA");
    }

    #[test]
    fn test_resolve_collision_suffixing() {
        let current = vec![VehicleRecord::new()
            .with_unit_name("Phòng Kỹ Thuật")
            .with_unit_code("PA")];
        let mut registry = UnitRegistry::for_snapshot(UnitDirectory::with_defaults(), &current);
        // "Phòng ABC" slugs to "PA", which the sheet already uses
        assert_eq!(registry.resolve("Phòng ABC", ""), Ok("PA2".to_string()));
        // A third distinct unit with the same base gets the next suffix
        assert_eq!(registry.resolve("Phủ Anh", ""), Ok("PA3".to_string()));
    }

    #[test]
    fn test_resolve_blank_name_unresolvable() {
        let mut registry = UnitRegistry::for_snapshot(UnitDirectory::with_defaults(), &[]);
        assert_eq!(registry.resolve("", ""), Err(ResolveError::UnresolvableUnit));
        assert_eq!(
            registry.resolve("  ", ""),
            Err(ResolveError::UnresolvableUnit)
        );
        // Blank name with explicit code is fine
        assert_eq!(registry.resolve("", "TRY"), Ok("TRY".to_string()));
    }

    #[test]
    fn test_slug_avoids_directory_codes() {
        // "Trà Vinh" slugs to "TV", taken by "Thư viện" in the dictionary
        let mut registry = UnitRegistry::for_snapshot(UnitDirectory::with_defaults(), &[]);
        assert_eq!(registry.resolve("Trà Vinh", ""), Ok("TV2".to_string()));
    }
}
