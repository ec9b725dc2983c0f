//! Group-homogeneity tests: one-way ANOVA, Levene, Bartlett.
//!
//! The statistics are the classical grouped sums of squares; tail
//! probabilities are delegated to `statrs` distributions. Interpretation is
//! fixed at α = 0.05.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

use crate::data::model::CellValue;

/// Significance level used for interpretation.
pub const ALPHA: f64 = 0.05;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// One of the three homogeneity tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestKind {
    Anova,
    Levene,
    Bartlett,
}

impl TestKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Anova => "One-way ANOVA",
            Self::Levene => "Levene",
            Self::Bartlett => "Bartlett",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Statistic and p-value of one test over one grouping variable.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub test: TestKind,
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    /// Whether the null hypothesis survives at [`ALPHA`].
    pub fn homogeneous(&self) -> bool {
        self.p_value >= ALPHA
    }

    pub fn interpretation(&self) -> &'static str {
        if self.homogeneous() {
            "fail to reject the null hypothesis: groups are homogeneous"
        } else {
            "reject the null hypothesis: groups are not homogeneous"
        }
    }
}

// ---------------------------------------------------------------------------
// Test runner
// ---------------------------------------------------------------------------

/// Run all three tests over one grouping variable's partitions.
///
/// Levels with fewer than two observations are dropped first. Returns an
/// empty vector when fewer than two usable levels remain; an individual
/// test whose statistic degenerates (zero variance, non-finite value) is
/// omitted rather than aborting the others.
pub fn run_all(samples: &BTreeMap<CellValue, Vec<f64>>) -> Vec<TestOutcome> {
    let groups: Vec<&[f64]> = samples
        .values()
        .filter(|v| v.len() >= 2)
        .map(|v| v.as_slice())
        .collect();
    if groups.len() < 2 {
        return Vec::new();
    }

    [anova(&groups), levene(&groups), bartlett(&groups)]
        .into_iter()
        .flatten()
        .collect()
}

fn anova(groups: &[&[f64]]) -> Option<TestOutcome> {
    let (f, df1, df2) = f_statistic(groups)?;
    Some(TestOutcome {
        test: TestKind::Anova,
        statistic: f,
        p_value: f_p_value(f, df1, df2)?,
    })
}

/// Levene's test with median centering: the ANOVA F applied to the
/// absolute deviations from each group's median.
fn levene(groups: &[&[f64]]) -> Option<TestOutcome> {
    let transformed: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let med = median(g);
            g.iter().map(|x| (x - med).abs()).collect()
        })
        .collect();
    let refs: Vec<&[f64]> = transformed.iter().map(|v| v.as_slice()).collect();

    let (w, df1, df2) = f_statistic(&refs)?;
    Some(TestOutcome {
        test: TestKind::Levene,
        statistic: w,
        p_value: f_p_value(w, df1, df2)?,
    })
}

fn bartlett(groups: &[&[f64]]) -> Option<TestOutcome> {
    let k = groups.len() as f64;
    let n: f64 = groups.iter().map(|g| g.len() as f64).sum();
    let pooled_df = n - k;
    if pooled_df <= 0.0 {
        return None;
    }

    let variances: Vec<(f64, f64)> = groups
        .iter()
        .map(|g| {
            let m = mean(g);
            let df = g.len() as f64 - 1.0;
            let var = g.iter().map(|x| (x - m).powi(2)).sum::<f64>() / df;
            (df, var)
        })
        .collect();
    if variances.iter().any(|&(_, var)| var <= 0.0) {
        return None; // A constant group makes the log-variance degenerate
    }

    let pooled = variances.iter().map(|&(df, var)| df * var).sum::<f64>() / pooled_df;
    let correction = 1.0
        + (variances.iter().map(|&(df, _)| 1.0 / df).sum::<f64>() - 1.0 / pooled_df)
            / (3.0 * (k - 1.0));
    let statistic = (pooled_df * pooled.ln()
        - variances
            .iter()
            .map(|&(df, var)| df * var.ln())
            .sum::<f64>())
        / correction;
    if !statistic.is_finite() {
        return None;
    }

    let p_value = match ChiSquared::new(k - 1.0) {
        Ok(dist) => 1.0 - dist.cdf(statistic),
        Err(_) => return None,
    };
    Some(TestOutcome {
        test: TestKind::Bartlett,
        statistic,
        p_value,
    })
}

// ---------------------------------------------------------------------------
// Statistic helpers
// ---------------------------------------------------------------------------

/// One-way F statistic and its degrees of freedom.
fn f_statistic(groups: &[&[f64]]) -> Option<(f64, f64, f64)> {
    let k = groups.len() as f64;
    let n: f64 = groups.iter().map(|g| g.len() as f64).sum();
    let df1 = k - 1.0;
    let df2 = n - k;
    if df1 <= 0.0 || df2 <= 0.0 {
        return None;
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n;
    let ss_between = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum::<f64>();
    let ss_within = groups
        .iter()
        .map(|g| {
            let m = mean(g);
            g.iter().map(|x| (x - m).powi(2)).sum::<f64>()
        })
        .sum::<f64>();

    let f = (ss_between / df1) / (ss_within / df2);
    f.is_finite().then_some((f, df1, df2))
}

fn f_p_value(f: f64, df1: f64, df2: f64) -> Option<f64> {
    match FisherSnedecor::new(df1, df2) {
        Ok(dist) => Some(1.0 - dist.cdf(f)),
        Err(_) => None,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(groups: &[(&str, &[f64])]) -> BTreeMap<CellValue, Vec<f64>> {
        groups
            .iter()
            .map(|(name, values)| (CellValue::String((*name).into()), values.to_vec()))
            .collect()
    }

    #[test]
    fn f_statistic_known_value() {
        // Hand-computed: ssb = 1.5, ssw = 4, df = (1, 4) → F = 1.5.
        let groups: Vec<&[f64]> = vec![&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]];
        let (f, df1, df2) = f_statistic(&groups).unwrap();
        assert!((f - 1.5).abs() < 1e-12);
        assert_eq!((df1, df2), (1.0, 4.0));
        let p = f_p_value(f, df1, df2).unwrap();
        assert!(p > 0.25 && p < 0.32, "p = {p}");
    }

    #[test]
    fn anova_rejects_on_separated_groups() {
        let samples = samples(&[
            ("a", &[1.0, 1.1, 0.9, 1.05, 0.95]),
            ("b", &[10.0, 10.1, 9.9, 10.05, 9.95]),
        ]);
        let outcomes = run_all(&samples);
        let anova = outcomes.iter().find(|o| o.test == TestKind::Anova).unwrap();
        assert!(anova.p_value < ALPHA);
        assert!(!anova.homogeneous());
    }

    #[test]
    fn anova_keeps_null_on_similar_groups() {
        let samples = samples(&[
            ("a", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            ("b", &[1.1, 2.1, 2.9, 4.2, 5.0]),
        ]);
        let outcomes = run_all(&samples);
        let anova = outcomes.iter().find(|o| o.test == TestKind::Anova).unwrap();
        assert!(anova.p_value >= ALPHA);
        assert!(anova.homogeneous());
        assert_eq!(
            anova.interpretation(),
            "fail to reject the null hypothesis: groups are homogeneous"
        );
    }

    #[test]
    fn levene_is_zero_for_mirrored_spreads() {
        // Both groups have identical absolute deviations from their median,
        // so the transformed ANOVA has no between-group variation.
        let samples = samples(&[("a", &[1.0, 2.0, 3.0]), ("b", &[2.0, 3.0, 4.0])]);
        let outcomes = run_all(&samples);
        let levene = outcomes.iter().find(|o| o.test == TestKind::Levene).unwrap();
        assert!(levene.statistic.abs() < 1e-12);
        assert!((levene.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bartlett_rejects_on_unequal_variances() {
        let samples = samples(&[
            ("a", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            ("b", &[0.0, 20.0, 40.0, 60.0, 80.0]),
        ]);
        let outcomes = run_all(&samples);
        let bartlett = outcomes
            .iter()
            .find(|o| o.test == TestKind::Bartlett)
            .unwrap();
        assert!(bartlett.p_value < ALPHA);
        assert!(!bartlett.homogeneous());
    }

    #[test]
    fn degenerate_partitions_are_skipped() {
        // One usable level only: nothing to compare.
        let one = samples(&[("a", &[1.0, 2.0, 3.0]), ("b", &[5.0])]);
        assert!(run_all(&one).is_empty());

        // Constant groups: ANOVA/Levene degenerate (zero within and between
        // variance), Bartlett degenerates on log of zero variance.
        let constant = samples(&[("a", &[2.0, 2.0, 2.0]), ("b", &[2.0, 2.0, 2.0])]);
        assert!(run_all(&constant).is_empty());
    }
}
