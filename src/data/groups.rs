use std::collections::{BTreeMap, BTreeSet};

use super::model::{CellValue, DataTable};

// ---------------------------------------------------------------------------
// Grouped-samples extraction
// ---------------------------------------------------------------------------

/// Numeric target observations for the whole column, as (row index, value).
///
/// Null cells are skipped (missing observations); the caller is expected to
/// have validated that the column is numeric, so any remaining non-numeric
/// cell is skipped as well.
pub fn target_samples(table: &DataTable, target: &str) -> Vec<(usize, f64)> {
    table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            row.get(target)
                .and_then(CellValue::as_f64)
                .map(|v| (i, v))
        })
        .collect()
}

/// Partition the target column by the levels of one grouping variable,
/// keeping row indices: level → [(row index, value)].
///
/// Rows with a null grouping cell belong to no level and are skipped, as are
/// rows without a numeric target observation.
pub fn grouped_indexed(
    table: &DataTable,
    target: &str,
    group: &str,
) -> BTreeMap<CellValue, Vec<(usize, f64)>> {
    let mut partitions: BTreeMap<CellValue, Vec<(usize, f64)>> = BTreeMap::new();

    for (i, row) in table.rows.iter().enumerate() {
        let level = match row.get(group) {
            Some(v) if !v.is_null() => v.clone(),
            _ => continue,
        };
        let Some(value) = row.get(target).and_then(CellValue::as_f64) else {
            continue;
        };
        partitions.entry(level).or_default().push((i, value));
    }

    partitions
}

/// Grouped samples restricted to a row subset: level → values.
///
/// This is the extraction primitive consumed by the homogeneity tests; the
/// subset is either every row or a cleaned view with flagged rows removed.
pub fn grouped_samples_in(
    table: &DataTable,
    rows: &[usize],
    target: &str,
    group: &str,
) -> BTreeMap<CellValue, Vec<f64>> {
    let mut partitions: BTreeMap<CellValue, Vec<f64>> = BTreeMap::new();

    for &i in rows {
        let row = &table.rows[i];
        let level = match row.get(group) {
            Some(v) if !v.is_null() => v.clone(),
            _ => continue,
        };
        let Some(value) = row.get(target).and_then(CellValue::as_f64) else {
            continue;
        };
        partitions.entry(level).or_default().push(value);
    }

    partitions
}

// ---------------------------------------------------------------------------
// Cleaned views
// ---------------------------------------------------------------------------

/// Row indices that survive removal of the excluded set. Original indices
/// are preserved; the table itself is never mutated.
pub fn kept_indices(table: &DataTable, excluded: &BTreeSet<usize>) -> Vec<usize> {
    (0..table.len()).filter(|i| !excluded.contains(i)).collect()
}

/// All row indices of the table, for the "no exclusion" case.
pub fn all_indices(table: &DataTable) -> Vec<usize> {
    (0..table.len()).collect()
}
