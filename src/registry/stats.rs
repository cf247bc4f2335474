use std::collections::HashSet;

use crate::storage::models::{FileRecord, StorageStats};

/// Aggregate sizes over `records`. Records sharing a (filename, size) pair
/// count once toward the deduplicated total.
pub fn compute(records: &[FileRecord]) -> StorageStats {
    let total_original = saturating_total(records.iter().map(|f| f.size_bytes));

    let mut seen = HashSet::new();
    let total_deduplicated = saturating_total(
        records
            .iter()
            .filter(|f| seen.insert((f.filename.as_str(), f.size_bytes)))
            .map(|f| f.size_bytes),
    );

    let total_savings = total_original.saturating_sub(total_deduplicated);
    let savings_percent = if total_original == 0 {
        0
    } else {
        (total_savings as f64 * 100.0 / total_original as f64).round() as u32
    };

    StorageStats {
        total_files: records.len() as u64,
        total_original,
        total_deduplicated,
        total_savings,
        savings_percent,
    }
}

/// Sum that clamps at `u64::MAX` instead of overflowing. Stored sizes and
/// counters are not trusted to be small.
pub fn saturating_total(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0u64, u64::saturating_add)
}
