//! Whole-column Z-score thresholding.
//!
//! Computed once over the entire target column with the sample mean and the
//! sample (n-1) standard deviation; it never sees the grouping variables, so
//! its flags are invariant to the grouping selection.

use super::{Detector, Flag};

/// Flag observations whose |z| exceeds the threshold.
///
/// `samples`: (row index, value) pairs of the whole target column.
pub fn detect(samples: &[(usize, f64)], threshold: f64) -> Vec<Flag> {
    if samples.len() < 2 {
        return Vec::new();
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(|(_, v)| v).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|(_, v)| (v - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);

    if !variance.is_finite() || variance <= 0.0 {
        return Vec::new(); // All identical values, no outliers possible
    }
    let stddev = variance.sqrt();

    samples
        .iter()
        .filter(|&&(_, v)| ((v - mean) / stddev).abs() > threshold)
        .map(|&(row, value)| Flag {
            row,
            value,
            detector: Detector::ZScore,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(values: &[f64]) -> Vec<(usize, f64)> {
        values.iter().copied().enumerate().collect()
    }

    #[test]
    fn flags_extreme_value() {
        let mut values = vec![10.0, 11.0, 9.0, 10.5, 9.5, 10.2, 9.8, 10.1];
        values.push(100.0);
        let flags = detect(&indexed(&values), 2.0);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].row, 8);
        assert_eq!(flags[0].detector, Detector::ZScore);
    }

    #[test]
    fn identical_values_flag_nothing() {
        assert!(detect(&indexed(&[5.0; 30]), 2.0).is_empty());
    }

    #[test]
    fn threshold_is_respected() {
        let values = indexed(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        assert!(!detect(&values, 2.0).is_empty());
        // Nothing is 50 standard deviations out.
        assert!(detect(&values, 50.0).is_empty());
    }

    #[test]
    fn too_few_observations_flag_nothing() {
        assert!(detect(&[(0, 1.0)], 2.0).is_empty());
        assert!(detect(&[], 2.0).is_empty());
    }
}
