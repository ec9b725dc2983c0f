//! Interquartile-range fences over one group's observations.
//!
//! Fences are Q1 - k*IQR and Q3 + k*IQR with quartiles computed by linear
//! interpolation. The multiplier k comes from the session configuration and
//! defaults to 1.2. A zero-IQR group (constant data) collapses the fences
//! onto the constant itself, so truly constant groups flag nothing.

use super::{Detector, Flag, quantile};

/// Flag the observations of one group that fall outside the IQR fences.
///
/// `samples`: (row index, value) pairs of a single level.
/// `multiplier`: fence multiplier k.
pub fn detect(samples: &[(usize, f64)], multiplier: f64) -> Vec<Flag> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<f64> = samples.iter().map(|&(_, v)| v).collect();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    if !iqr.is_finite() {
        return Vec::new();
    }

    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    samples
        .iter()
        .filter(|&&(_, v)| v < lower || v > upper)
        .map(|&(row, value)| Flag {
            row,
            value,
            detector: Detector::Iqr,
        })
        .collect()
}
