//! Cross-method reconciliation of the three outlier detectors.
//!
//! One pass runs the Z-score detector over the whole target column, then the
//! IQR and isolation-forest detectors per grouping variable and per level,
//! and merges every flag into one record per row index. Row indices are the
//! only join key; the (grouping levels, value) composite exists purely for
//! display, so the report and the cleaned view can never disagree about
//! which rows were flagged.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

use crate::data::groups;
use crate::data::model::{CellValue, DataTable};

use super::config::AnalysisConfig;
use super::detect::{Detector, Flag, forest, iqr, zscore};
use super::error::AnalysisError;

// ---------------------------------------------------------------------------
// Merged report types
// ---------------------------------------------------------------------------

/// One reconciled outlier: a flagged row and every detector that flagged it.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierRecord {
    /// Stable row index in the source table.
    pub row: usize,
    /// (grouping variable, this row's level), in selection order.
    pub levels: Vec<(String, CellValue)>,
    /// The original, unrounded target value.
    pub value: f64,
    /// Every detector that flagged this row.
    pub detectors: BTreeSet<Detector>,
}

/// The merged outlier report of one analysis pass. An empty report is a
/// valid result, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// One record per flagged row, ordered by row index.
    pub records: Vec<OutlierRecord>,
}

impl Reconciliation {
    /// Whether no detector flagged anything.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of all flagged row indices.
    pub fn flagged_indices(&self) -> BTreeSet<usize> {
        self.records.iter().map(|r| r.row).collect()
    }

    /// Row indices of the cleaned view: the table minus every flagged row.
    pub fn cleaned_indices(&self, table: &DataTable) -> Vec<usize> {
        groups::kept_indices(table, &self.flagged_indices())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a variable selection against the table before running anything.
pub fn validate(
    table: &DataTable,
    target: &str,
    grouping: &[String],
) -> Result<(), AnalysisError> {
    if !table.has_column(target) {
        return Err(AnalysisError::InvalidColumn(target.to_string()));
    }
    for group in grouping {
        if !table.has_column(group) {
            return Err(AnalysisError::InvalidColumn(group.clone()));
        }
    }
    if grouping.is_empty() {
        return Err(AnalysisError::NoGroupingVariables);
    }
    if grouping.iter().any(|g| g == target) {
        return Err(AnalysisError::TargetIsGrouping(target.to_string()));
    }

    let mut numeric = 0usize;
    for row in &table.rows {
        match row.get(target) {
            Some(v) if v.is_null() => {}
            Some(v) => match v.as_f64() {
                Some(_) => numeric += 1,
                None => {
                    return Err(AnalysisError::NonNumericTarget {
                        column: target.to_string(),
                        reason: format!("contains non-numeric value '{v}'"),
                    });
                }
            },
            None => {}
        }
    }
    if numeric == 0 {
        return Err(AnalysisError::NonNumericTarget {
            column: target.to_string(),
            reason: "all values are null".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Run all three detectors and merge their flags into one report.
pub fn reconcile(
    table: &DataTable,
    target: &str,
    grouping: &[String],
    config: &AnalysisConfig,
) -> Result<Reconciliation, AnalysisError> {
    validate(table, target, grouping)?;

    let column = groups::target_samples(table, target);
    let mut flags: Vec<Flag> = Vec::new();

    // Detector B sees the whole column once; it is independent of the
    // grouping selection.
    flags.extend(zscore::detect(&column, config.z_threshold));

    for group in grouping {
        for (level, samples) in groups::grouped_indexed(table, target, group) {
            flags.extend(iqr::detect(&samples, config.iqr_multiplier));

            if samples.len() <= 1 {
                let skip = AnalysisError::InsufficientData {
                    level: level.to_string(),
                    rows: samples.len(),
                };
                debug!("{group}: {skip}");
                continue;
            }
            flags.extend(forest::detect(&samples, config.contamination, config.seed));
        }
    }

    // Merge: one record per row index with the union of detectors. Flags
    // repeated across levels or grouping variables collapse here.
    let mut detectors_by_row: BTreeMap<usize, BTreeSet<Detector>> = BTreeMap::new();
    let mut value_by_row: BTreeMap<usize, f64> = BTreeMap::new();
    for flag in flags {
        detectors_by_row
            .entry(flag.row)
            .or_default()
            .insert(flag.detector);
        value_by_row.insert(flag.row, flag.value);
    }

    let records = detectors_by_row
        .into_iter()
        .map(|(row, detectors)| OutlierRecord {
            row,
            levels: grouping
                .iter()
                .map(|g| (g.clone(), table.cell(row, g)))
                .collect(),
            value: value_by_row[&row],
            detectors,
        })
        .collect();

    Ok(Reconciliation { records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    /// 20 rows in two groups; group "a" is [1,2,3,4,5,100] with the extreme
    /// value at row index 5.
    fn scenario_table() -> DataTable {
        let mut rows = Vec::new();
        let mut push = |group: &str, value: f64| {
            let mut row = Row::new();
            row.insert("group".into(), CellValue::String(group.into()));
            row.insert("value".into(), CellValue::Float(value));
            rows.push(row);
        };
        for v in [1.0, 2.0, 3.0, 4.0, 5.0, 100.0] {
            push("a", v);
        }
        for i in 0..14 {
            push("b", 10.0 + i as f64 * 0.1);
        }
        DataTable::new(vec!["group".into(), "value".into()], rows)
    }

    fn grouping() -> Vec<String> {
        vec!["group".into()]
    }

    #[test]
    fn extreme_row_is_merged_into_one_record() {
        let table = scenario_table();
        let config = AnalysisConfig::default();
        let recon = reconcile(&table, "value", &grouping(), &config).unwrap();

        let hits: Vec<_> = recon.records.iter().filter(|r| r.row == 5).collect();
        assert_eq!(hits.len(), 1, "row 5 must appear exactly once");
        let record = hits[0];
        assert_eq!(record.value, 100.0);
        assert!(record.detectors.contains(&Detector::Iqr));
        assert!(record.detectors.contains(&Detector::ZScore));
        assert_eq!(
            record.levels,
            vec![("group".to_string(), CellValue::String("a".into()))]
        );
    }

    #[test]
    fn reconciliation_is_deterministic() {
        let table = scenario_table();
        let config = AnalysisConfig::default();
        let first = reconcile(&table, "value", &grouping(), &config).unwrap();
        let second = reconcile(&table, "value", &grouping(), &config).unwrap();
        assert_eq!(first.records.len(), second.records.len());
        for (a, b) in first.records.iter().zip(&second.records) {
            assert_eq!(a.row, b.row);
            assert_eq!(a.detectors, b.detectors);
        }
    }

    #[test]
    fn zscore_flags_are_invariant_to_the_grouping_choice() {
        let mut table = scenario_table();
        // Second grouping column with a completely different partition.
        for (i, row) in table.rows.iter_mut().enumerate() {
            let parity = if i % 2 == 0 { "even" } else { "odd" };
            row.insert("parity".into(), CellValue::String(parity.into()));
        }
        let table = DataTable::new(
            vec!["group".into(), "parity".into(), "value".into()],
            table.rows,
        );

        let config = AnalysisConfig::default();
        let by_group = reconcile(&table, "value", &grouping(), &config).unwrap();
        let by_parity =
            reconcile(&table, "value", &["parity".to_string()], &config).unwrap();

        let zscore_rows = |recon: &Reconciliation| -> BTreeSet<usize> {
            recon
                .records
                .iter()
                .filter(|r| r.detectors.contains(&Detector::ZScore))
                .map(|r| r.row)
                .collect()
        };
        assert_eq!(zscore_rows(&by_group), zscore_rows(&by_parity));
    }

    #[test]
    fn cleaned_view_subtracts_exactly_the_flagged_rows() {
        let table = scenario_table();
        let config = AnalysisConfig::default();
        let recon = reconcile(&table, "value", &grouping(), &config).unwrap();

        let flagged = recon.flagged_indices();
        let cleaned = recon.cleaned_indices(&table);
        assert_eq!(cleaned.len(), table.len() - flagged.len());
        assert!(cleaned.iter().all(|i| !flagged.contains(i)));
    }

    #[test]
    fn single_row_level_skips_the_anomaly_model() {
        let mut rows = Vec::new();
        let mut row = Row::new();
        row.insert("group".into(), CellValue::String("only".into()));
        row.insert("value".into(), CellValue::Float(3.0));
        rows.push(row);
        let table = DataTable::new(vec!["group".into(), "value".into()], rows);

        let recon =
            reconcile(&table, "value", &grouping(), &AnalysisConfig::default()).unwrap();
        assert!(recon.is_empty());
    }

    #[test]
    fn empty_report_is_a_valid_result() {
        let mut rows = Vec::new();
        for (g, v) in [("a", 1.0), ("a", 1.1), ("a", 0.9), ("b", 2.0), ("b", 2.1), ("b", 1.9)] {
            let mut row = Row::new();
            row.insert("group".into(), CellValue::String(g.into()));
            row.insert("value".into(), CellValue::Float(v));
            rows.push(row);
        }
        let table = DataTable::new(vec!["group".into(), "value".into()], rows);
        // Very loose thresholds so nothing is flagged by A or B; the forest
        // cut is disabled by contamination 0.
        let config = AnalysisConfig {
            z_threshold: 50.0,
            iqr_multiplier: 50.0,
            contamination: 0.0,
            ..AnalysisConfig::default()
        };
        let recon = reconcile(&table, "value", &grouping(), &config).unwrap();
        assert!(recon.is_empty());
        assert_eq!(recon.cleaned_indices(&table).len(), table.len());
    }

    #[test]
    fn invalid_selections_are_rejected() {
        let table = scenario_table();
        let config = AnalysisConfig::default();

        let err = reconcile(&table, "missing", &grouping(), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidColumn(c) if c == "missing"));

        let err = reconcile(&table, "value", &["value".to_string()], &config).unwrap_err();
        assert!(matches!(err, AnalysisError::TargetIsGrouping(_)));

        let err = reconcile(&table, "value", &[], &config).unwrap_err();
        assert!(matches!(err, AnalysisError::NoGroupingVariables));

        let err = reconcile(&table, "group", &grouping(), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::TargetIsGrouping(_)));
    }

    #[test]
    fn non_numeric_target_is_rejected() {
        let mut rows = Vec::new();
        let mut row = Row::new();
        row.insert("group".into(), CellValue::String("a".into()));
        row.insert("label".into(), CellValue::String("x".into()));
        rows.push(row);
        let table = DataTable::new(vec!["group".into(), "label".into()], rows);

        let err =
            reconcile(&table, "label", &grouping(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::NonNumericTarget { .. }));
    }
}
