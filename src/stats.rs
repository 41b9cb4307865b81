// 📊 Statistics - Registrations per unit
//
// Feeds the per-unit reporting screen. Chart rendering stays with the
// caller; this only aggregates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::{is_blank, VehicleRecord, NO_UNIT};

// ============================================================================
// UNIT BREAKDOWN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCount {
    pub unit_code: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitBreakdown {
    /// Per-unit registration counts, largest first
    pub counts: Vec<UnitCount>,

    pub total: usize,
}

impl UnitBreakdown {
    /// Count for one unit code (0 if absent)
    pub fn count_for(&self, unit_code: &str) -> usize {
        let code = unit_code.trim().to_uppercase();
        self.counts
            .iter()
            .find(|c| c.unit_code == code)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} registrations across {} units",
            self.total,
            self.counts.len()
        )
    }
}

/// Count registrations per unit code
///
/// Records without a unit code land in the NO_UNIT bucket. Sorted by count
/// descending, code ascending for ties, so output is stable.
pub fn unit_breakdown(records: &[VehicleRecord]) -> UnitBreakdown {
    let mut by_unit: HashMap<String, usize> = HashMap::new();
    for record in records {
        let code = if is_blank(&record.unit_code) {
            NO_UNIT.to_string()
        } else {
            record.unit_code.trim().to_uppercase()
        };
        *by_unit.entry(code).or_insert(0) += 1;
    }

    let mut counts: Vec<UnitCount> = by_unit
        .into_iter()
        .map(|(unit_code, count)| UnitCount { unit_code, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.unit_code.cmp(&b.unit_code)));

    UnitBreakdown {
        total: records.len(),
        counts,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(unit_code: &str) -> VehicleRecord {
        VehicleRecord::new().with_unit_code(unit_code)
    }

    #[test]
    fn test_breakdown_counts_and_order() {
        let records = vec![
            record("TRY"),
            record("try"),
            record("RHM"),
            record("TRY"),
            record(""),
        ];
        let breakdown = unit_breakdown(&records);

        assert_eq!(breakdown.total, 5);
        assert_eq!(breakdown.counts[0], UnitCount { unit_code: "TRY".to_string(), count: 3 });
        assert_eq!(breakdown.count_for("rhm"), 1);
        assert_eq!(breakdown.count_for(NO_UNIT), 1);
        assert_eq!(breakdown.count_for("BVY"), 0);
    }

    #[test]
    fn test_breakdown_tie_order_is_stable() {
        let records = vec![record("RHM"), record("BVY")];
        let breakdown = unit_breakdown(&records);
        assert_eq!(breakdown.counts[0].unit_code, "BVY");
        assert_eq!(breakdown.counts[1].unit_code, "RHM");
    }

    #[test]
    fn test_breakdown_empty() {
        let breakdown = unit_breakdown(&[]);
        assert_eq!(breakdown.total, 0);
        assert!(breakdown.counts.is_empty());
        assert_eq!(breakdown.summary(), "0 registrations across 0 units");
    }
}
