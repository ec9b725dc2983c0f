use thiserror::Error;

/// Failures of one analysis pass.
///
/// Only malformed input (missing or non-numeric columns, a bad variable
/// selection) aborts a pass. Per-group insufficiency is recovered locally:
/// [`AnalysisError::InsufficientData`] is logged by the reconciler and the
/// affected group is skipped.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("column '{0}' does not exist in the dataset")]
    InvalidColumn(String),

    #[error("target column '{column}' is not numeric: {reason}")]
    NonNumericTarget { column: String, reason: String },

    #[error("target variable '{0}' is also selected as a grouping variable")]
    TargetIsGrouping(String),

    #[error("no grouping variables selected")]
    NoGroupingVariables,

    #[error("group '{level}' has only {rows} row(s), not enough to fit the anomaly model")]
    InsufficientData { level: String, rows: usize },
}
