use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::data::model::DataTable;

use super::error::AnalysisError;

/// Name of the optional JSON sidecar read from the data file's directory
/// (or the working directory when analyzing the bundled example).
const SIDECAR_NAME: &str = "groupscope.json";

// ---------------------------------------------------------------------------
// Session-scoped analysis configuration
// ---------------------------------------------------------------------------

/// Everything one analysis pass depends on besides the dataset itself:
/// variable selection and detector tunables. The analysis core is pure with
/// respect to this state; the same (table, config) always produces the same
/// outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Numeric column under test; `None` selects the first numeric column.
    pub target: Option<String>,
    /// Grouping columns; empty selects every categorical column.
    pub grouping: Vec<String>,
    /// IQR fence multiplier. Defaults to 1.2, a tighter fence than the
    /// conventional Tukey 1.5.
    pub iqr_multiplier: f64,
    /// |z| cut-off for the whole-column Z-score detector.
    pub z_threshold: f64,
    /// Expected anomalous fraction for the isolation forest.
    pub contamination: f64,
    /// Seed for the isolation forest's tree building.
    pub seed: u64,
    /// Run the homogeneity tests on the cleaned view instead of the full
    /// table.
    pub exclude_outliers: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target: None,
            grouping: Vec::new(),
            iqr_multiplier: 1.2,
            z_threshold: 2.0,
            contamination: 0.01,
            seed: 42,
            exclude_outliers: false,
        }
    }
}

impl AnalysisConfig {
    /// Read the sidecar next to `data_path` (falling back to the working
    /// directory), or the defaults when no sidecar exists.
    pub fn load(data_path: Option<&Path>) -> Result<Self> {
        let sidecar = data_path
            .and_then(Path::parent)
            .map(|dir| dir.join(SIDECAR_NAME))
            .filter(|p| p.exists())
            .or_else(|| {
                let cwd = Path::new(SIDECAR_NAME);
                cwd.exists().then(|| cwd.to_path_buf())
            });

        match sidecar {
            Some(path) => {
                info!("reading configuration from {}", path.display());
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Resolve the variable selection against a loaded table.
    ///
    /// An explicit selection is used as-is (validation happens in the
    /// reconciler); an absent one picks the first numeric column as target
    /// and every categorical column as grouping, falling back to all
    /// non-target columns when the table is entirely numeric.
    pub fn resolve_selection(
        &self,
        table: &DataTable,
    ) -> Result<(String, Vec<String>), AnalysisError> {
        let target = match &self.target {
            Some(name) => name.clone(),
            None => table
                .column_names
                .iter()
                .find(|c| table.is_numeric_column(c))
                .cloned()
                .ok_or_else(|| AnalysisError::NonNumericTarget {
                    column: "<auto>".into(),
                    reason: "the dataset has no numeric column".into(),
                })?,
        };

        let grouping = if self.grouping.is_empty() {
            let categorical: Vec<String> = table
                .column_names
                .iter()
                .filter(|c| **c != target && !table.is_numeric_column(c))
                .cloned()
                .collect();
            if categorical.is_empty() {
                table
                    .column_names
                    .iter()
                    .filter(|c| **c != target)
                    .cloned()
                    .collect()
            } else {
                categorical
            }
        } else {
            self.grouping.clone()
        };

        if grouping.is_empty() {
            return Err(AnalysisError::NoGroupingVariables);
        }
        Ok((target, grouping))
    }
}
