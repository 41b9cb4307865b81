// 📥 Import/Export - CSV batches + source provenance
//
// Bulk files come from the staff as CSV exports of whatever spreadsheet
// they had open, so headers are coerced on the way in and row lengths are
// not trusted. Every import records file provenance (row count, SHA-256)
// for the audit trail.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

use crate::record::{coerce_headers, VehicleRecord, COLUMNS};

// ============================================================================
// SOURCE FILE STAT
// ============================================================================

/// Provenance of one imported file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileStat {
    pub source_file: String,
    pub row_count: usize,
    pub sha256: String,
}

impl SourceFileStat {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows, sha256 {}",
            self.source_file,
            self.row_count,
            &self.sha256[..12.min(self.sha256.len())]
        )
    }
}

// ============================================================================
// LOAD
// ============================================================================

/// Load a CSV file of vehicle records with header coercion
///
/// Rows shorter than the header are padded with blanks; surplus cells land
/// in `extra`. Returns the records plus provenance for the audit trail.
pub fn load_records(csv_path: &Path) -> Result<(Vec<VehicleRecord>, SourceFileStat)> {
    let bytes = std::fs::read(csv_path)
        .with_context(|| format!("Failed to read CSV file {}", csv_path.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = format!("{:x}", hasher.finalize());

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes.as_slice());

    let raw_headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mapping = coerce_headers(&raw_headers);

    let mut records = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let row = result.with_context(|| format!("Failed to parse CSV row {}", line + 2))?;
        let fields: Vec<String> = row.iter().map(|f| f.to_string()).collect();
        records.push(VehicleRecord::from_fields(&raw_headers, &mapping, &fields));
    }

    let stat = SourceFileStat {
        source_file: csv_path.display().to_string(),
        row_count: records.len(),
        sha256,
    };

    Ok((records, stat))
}

// ============================================================================
// WRITE
// ============================================================================

/// Write records as CSV in canonical column order
///
/// Passenger columns are appended after the canonical set, in sorted order
/// so output is deterministic across runs.
pub fn write_records(csv_path: &Path, records: &[VehicleRecord]) -> Result<()> {
    let extra_keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.extra.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_path(csv_path)
        .with_context(|| format!("Failed to create CSV file {}", csv_path.display()))?;

    let mut header: Vec<&str> = COLUMNS.iter().map(|c| c.header()).collect();
    header.extend(extra_keys.iter().copied());
    wtr.write_record(&header).context("Failed to write CSV header")?;

    for record in records {
        let mut row: Vec<&str> = COLUMNS.iter().map(|c| record.get(*c)).collect();
        for key in &extra_keys {
            row.push(record.extra.get(*key).map(String::as_str).unwrap_or(""));
        }
        wtr.write_record(&row).context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "vehicle-registry-test-{}-{}",
            uuid::Uuid::new_v4(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_records_coerces_headers() {
        let path = temp_csv(
            "load.csv",
            "hoten,Bien so,ma the,Tên đơn vị,Ghi chú\n\
             Nguyễn Văn A,59A12345,TRY001,Trường Y,xe mới\n\
             Trần B,51F99999,,RHM,\n",
        );
        let (records, stat) = load_records(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(stat.row_count, 2);
        assert_eq!(stat.sha256.len(), 64);
        assert_eq!(records[0].full_name, "Nguyễn Văn A");
        assert_eq!(records[0].card_code, "TRY001");
        assert_eq!(records[0].unit_name, "Trường Y");
        assert_eq!(
            records[0].extra.get("Ghi chú").map(String::as_str),
            Some("xe mới")
        );
        assert_eq!(records[1].card_code, "");
    }

    #[test]
    fn test_load_records_pads_short_rows() {
        let path = temp_csv("short.csv", "Họ tên,Biển số,Mã thẻ\nChỉ Tên\n");
        let (records, _) = load_records(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(records[0].full_name, "Chỉ Tên");
        assert_eq!(records[0].plate, "");
        assert_eq!(records[0].card_code, "");
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let mut record = VehicleRecord::new()
            .with_full_name("Nguyễn Văn A")
            .with_unit_name("Trường Y")
            .with_unit_code("TRY")
            .with_card_code("TRY001");
        record
            .extra
            .insert("Ghi chú".to_string(), "xe mới".to_string());

        let path = std::env::temp_dir().join(format!(
            "vehicle-registry-test-{}-roundtrip.csv",
            uuid::Uuid::new_v4()
        ));
        write_records(&path, &[record.clone()]).unwrap();
        let (loaded, _) = load_records(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], record);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let path = std::env::temp_dir().join("vehicle-registry-test-does-not-exist.csv");
        assert!(load_records(&path).is_err());
    }
}
