// 🚗 Vehicle Records - Canonical row model + column coercion
// One record = one registered vehicle in the office's sheet
//
// The sheet is maintained by hand, so headers arrive in every spelling the
// staff has ever used ("Họ tên", "hoten", "name", ...). Column coercion maps
// whatever comes in onto the canonical column set; everything unrecognized
// rides along untouched in `extra`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::units::canonicalize;

/// Bucket label for records without a resolved unit code
pub const NO_UNIT: &str = "NO_UNIT";

// ============================================================================
// COLUMNS
// ============================================================================

/// Canonical columns of the registration sheet, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    Ordinal,
    FullName,
    Plate,
    CardCode,
    UnitCode,
    UnitName,
    Title,
    Phone,
    Email,
}

/// All canonical columns in sheet order
pub const COLUMNS: [Column; 9] = [
    Column::Ordinal,
    Column::FullName,
    Column::Plate,
    Column::CardCode,
    Column::UnitCode,
    Column::UnitName,
    Column::Title,
    Column::Phone,
    Column::Email,
];

impl Column {
    /// Display header as it appears on the office's sheet
    pub fn header(&self) -> &'static str {
        match self {
            Column::Ordinal => "STT",
            Column::FullName => "Họ tên",
            Column::Plate => "Biển số",
            Column::CardCode => "Mã thẻ",
            Column::UnitCode => "Mã đơn vị",
            Column::UnitName => "Tên đơn vị",
            Column::Title => "Chức vụ",
            Column::Phone => "Số điện thoại",
            Column::Email => "Email",
        }
    }

    /// Match a raw header cell against the known spelling variants
    ///
    /// Example: "hoten" → FullName, "Bien So" → Plate, "ma_the" → CardCode
    pub fn match_header(raw: &str) -> Option<Column> {
        let key = canonicalize(raw);
        let col = match key.as_str() {
            "stt" | "so thu tu" => Column::Ordinal,
            "ho ten" | "hoten" | "ho va ten" | "hovaten" | "ten" | "name" | "full name" => {
                Column::FullName
            }
            "bien so" | "bienso" | "bien so xe" | "plate" | "license plate" | "licenseplate" => {
                Column::Plate
            }
            "ma the" | "mathe" | "ma_the" | "card code" | "cardcode" => Column::CardCode,
            "ma don vi" | "madonvi" | "ma dv" | "unit code" => Column::UnitCode,
            "ten don vi" | "tendonvi" | "don vi" | "unit name" | "unit" => Column::UnitName,
            "chuc vu" | "chucvu" | "title" | "role" => Column::Title,
            "so dien thoai" | "sodienthoai" | "dien thoai" | "dienthoai" | "phone" => Column::Phone,
            "email" | "e mail" => Column::Email,
            _ => return None,
        };
        Some(col)
    }
}

/// Map a raw header row onto canonical columns
///
/// First occurrence of a column wins; later duplicates and unknown headers
/// map to None and are carried as passenger columns.
pub fn coerce_headers(raw_headers: &[String]) -> Vec<Option<Column>> {
    let mut seen = Vec::new();
    raw_headers
        .iter()
        .map(|h| match Column::match_header(h) {
            Some(col) if !seen.contains(&col) => {
                seen.push(col);
                Some(col)
            }
            _ => None,
        })
        .collect()
}

// ============================================================================
// BLANK POLICY
// ============================================================================

/// Sentinel strings the sheet uses for "no value"
const BLANK_SENTINELS: [&str; 7] = ["nan", "none", "null", "na", "n/a", "-", "_"];

/// Check whether a cell counts as blank
///
/// Empty/whitespace cells and the usual spreadsheet junk values ("nan",
/// "N/A", "-", ...) all count.
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    BLANK_SENTINELS.contains(&lower.as_str())
}

// ============================================================================
// PLATES
// ============================================================================

/// Normalize a license plate for keying: uppercase, alphanumerics only
///
/// Example: "59-A1 234.56" → "59A123456"
pub fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// ============================================================================
// VEHICLE RECORD
// ============================================================================

/// One registered vehicle
///
/// Only `unit_name`, `unit_code`, `card_code` and (for keying) `plate` are
/// ever inspected by the normalization core; every other field is an opaque
/// passenger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub ordinal: String,
    pub full_name: String,
    pub plate: String,
    pub card_code: String,
    pub unit_code: String,
    pub unit_name: String,
    pub title: String,
    pub phone: String,
    pub email: String,

    /// Unrecognized sheet columns, preserved verbatim
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl VehicleRecord {
    /// Create an empty record
    pub fn new() -> Self {
        VehicleRecord::default()
    }

    /// Builder pattern: set unit name
    pub fn with_unit_name(mut self, unit_name: &str) -> Self {
        self.unit_name = unit_name.to_string();
        self
    }

    /// Builder pattern: set unit code
    pub fn with_unit_code(mut self, unit_code: &str) -> Self {
        self.unit_code = unit_code.to_string();
        self
    }

    /// Builder pattern: set card code
    pub fn with_card_code(mut self, card_code: &str) -> Self {
        self.card_code = card_code.to_string();
        self
    }

    /// Builder pattern: set plate
    pub fn with_plate(mut self, plate: &str) -> Self {
        self.plate = plate.to_string();
        self
    }

    /// Builder pattern: set full name
    pub fn with_full_name(mut self, full_name: &str) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    /// Build a record from one data row given the coerced header mapping
    ///
    /// `raw_headers` and `mapping` come from the same header row; unmapped
    /// cells land in `extra` under their original header.
    pub fn from_fields(
        raw_headers: &[String],
        mapping: &[Option<Column>],
        fields: &[String],
    ) -> Self {
        let mut record = VehicleRecord::new();
        for (i, value) in fields.iter().enumerate() {
            match mapping.get(i).copied().flatten() {
                Some(col) => record.set(col, value),
                None => {
                    let header = raw_headers
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("column_{}", i + 1));
                    record.extra.insert(header, value.clone());
                }
            }
        }
        record
    }

    /// Get a canonical column value
    pub fn get(&self, col: Column) -> &str {
        match col {
            Column::Ordinal => &self.ordinal,
            Column::FullName => &self.full_name,
            Column::Plate => &self.plate,
            Column::CardCode => &self.card_code,
            Column::UnitCode => &self.unit_code,
            Column::UnitName => &self.unit_name,
            Column::Title => &self.title,
            Column::Phone => &self.phone,
            Column::Email => &self.email,
        }
    }

    /// Set a canonical column value
    pub fn set(&mut self, col: Column, value: &str) {
        let slot = match col {
            Column::Ordinal => &mut self.ordinal,
            Column::FullName => &mut self.full_name,
            Column::Plate => &mut self.plate,
            Column::CardCode => &mut self.card_code,
            Column::UnitCode => &mut self.unit_code,
            Column::UnitName => &mut self.unit_name,
            Column::Title => &mut self.title,
            Column::Phone => &mut self.phone,
            Column::Email => &mut self.email,
        };
        *slot = value.to_string();
    }

    /// Check whether the record has a usable card code
    pub fn has_card_code(&self) -> bool {
        !is_blank(&self.card_code)
    }

    /// Check whether the record has a resolved unit code
    pub fn has_unit_code(&self) -> bool {
        !is_blank(&self.unit_code)
    }
}

// ============================================================================
// TESTS
// ============================================================================
