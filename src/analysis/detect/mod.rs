//! The three outlier detectors and their shared flag type.

use std::fmt;

use serde::Serialize;

pub mod forest;
pub mod iqr;
pub mod zscore;

// ---------------------------------------------------------------------------
// Detector identity
// ---------------------------------------------------------------------------

/// Identifies one of the three independent outlier detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Detector {
    Iqr,
    ZScore,
    IsolationForest,
}

impl Detector {
    /// Stable machine-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::ZScore => "z_score",
            Self::IsolationForest => "isolation_forest",
        }
    }

    /// Column header used in the merged report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Iqr => "IQR method",
            Self::ZScore => "Z-score",
            Self::IsolationForest => "IsolationForest",
        }
    }

    /// All detectors in report-column order.
    pub const ALL: [Detector; 3] = [Self::Iqr, Self::ZScore, Self::IsolationForest];
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Flag – one row flagged by one detector
// ---------------------------------------------------------------------------

/// A single flagged observation, indexed into the original table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flag {
    /// Stable row index in the source table.
    pub row: usize,
    /// The original, unrounded target value.
    pub value: f64,
    /// Which detector produced this flag.
    pub detector: Detector,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Compute a quantile by linear interpolation over sorted values.
/// `q` is in [0, 1].
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}
