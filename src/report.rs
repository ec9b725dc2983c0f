use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use crate::analysis::detect::Detector;
use crate::analysis::homogeneity::TestOutcome;
use crate::analysis::reconcile::Reconciliation;
use crate::data::model::DataTable;

// ---------------------------------------------------------------------------
// Plain-text table formatting
// ---------------------------------------------------------------------------

fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render_line = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render_line(headers));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&render_line(row));
    }
    out
}

// ---------------------------------------------------------------------------
// Dataset preview
// ---------------------------------------------------------------------------

/// The first `n` rows of the table, in column order.
pub fn render_head(table: &DataTable, n: usize) -> String {
    let headers: Vec<String> = std::iter::once("row".to_string())
        .chain(table.column_names.iter().cloned())
        .collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, _)| {
            std::iter::once(i.to_string())
                .chain(
                    table
                        .column_names
                        .iter()
                        .map(|c| table.cell(i, c).to_string()),
                )
                .collect()
        })
        .collect();
    format_table(&headers, &rows)
}

// ---------------------------------------------------------------------------
// Merged outlier report
// ---------------------------------------------------------------------------

/// Render the merged outlier report.
///
/// Lines are keyed by (grouping levels, value rounded to two decimals) for
/// display: records sharing that composite collapse into one line listing
/// all of their row indices, with one presence column per detector. Absent
/// detections render as empty cells.
pub fn render_outliers(recon: &Reconciliation, grouping: &[String], target: &str) -> String {
    type DisplayKey = (Vec<String>, String);
    let mut lines: BTreeMap<DisplayKey, (BTreeSet<usize>, BTreeSet<Detector>)> = BTreeMap::new();

    for record in &recon.records {
        let levels: Vec<String> = record.levels.iter().map(|(_, v)| v.to_string()).collect();
        let value = format!("{:.2}", record.value);
        let entry = lines.entry((levels, value)).or_default();
        entry.0.insert(record.row);
        entry.1.extend(record.detectors.iter().copied());
    }

    let headers: Vec<String> = grouping
        .iter()
        .cloned()
        .chain([target.to_string(), "rows".to_string()])
        .chain(Detector::ALL.iter().map(|d| d.label().to_string()))
        .collect();

    let rows: Vec<Vec<String>> = lines
        .into_iter()
        .map(|((levels, value), (row_indices, detectors))| {
            let indices = row_indices
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(",");
            levels
                .into_iter()
                .chain([value, indices])
                .chain(Detector::ALL.iter().map(|d| {
                    if detectors.contains(d) {
                        "x".to_string()
                    } else {
                        String::new()
                    }
                }))
                .collect()
        })
        .collect();

    format_table(&headers, &rows)
}

// ---------------------------------------------------------------------------
// Homogeneity summaries
// ---------------------------------------------------------------------------

/// Render one grouping variable's test outcomes.
pub fn render_tests(outcomes: &[TestOutcome]) -> String {
    outcomes
        .iter()
        .map(|o| {
            format!(
                "  {:<14} statistic = {:>10.4}  p = {:.4}  {}",
                o.test.label(),
                o.statistic,
                o.p_value,
                o.interpretation()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Machine-readable dump of the merged report.
pub fn to_json(recon: &Reconciliation) -> Result<String> {
    Ok(serde_json::to_string(recon)?)
}
