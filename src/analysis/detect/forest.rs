//! Seeded 1-D isolation forest over one group's observations.
//!
//! An ensemble of random partitioning trees built on subsamples of the
//! group; points isolated with fewer splits score closer to 1. Scores above
//! the (1 - contamination) quantile of the group's scores are flagged. Tree
//! building draws from a PCG generator seeded from the session
//! configuration, so a fixed seed reproduces the exact same flags.

use rand::Rng;
use rand::SeedableRng as _;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;

use super::{Detector, Flag, quantile};

/// Number of trees per ensemble.
const TREE_COUNT: usize = 100;
/// Per-tree subsample cap.
const MAX_SUBSAMPLE: usize = 256;

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

// ---------------------------------------------------------------------------
// Isolation tree
// ---------------------------------------------------------------------------

enum Node {
    Split {
        at: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

fn build_tree(values: &[f64], depth: usize, limit: usize, rng: &mut Pcg32) -> Node {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if values.len() <= 1 || depth >= limit || min >= max {
        return Node::Leaf {
            size: values.len(),
        };
    }

    let at = rng.random_range(min..max);
    let (left, right): (Vec<f64>, Vec<f64>) = values.iter().copied().partition(|&v| v < at);

    Node::Split {
        at,
        left: Box::new(build_tree(&left, depth + 1, limit, rng)),
        right: Box::new(build_tree(&right, depth + 1, limit, rng)),
    }
}

fn path_length(node: &Node, value: f64, depth: f64) -> f64 {
    match node {
        // Unresolved leaves stand in for the subtree they would have grown.
        Node::Leaf { size } => depth + average_path_length(*size),
        Node::Split { at, left, right } => {
            if value < *at {
                path_length(left, value, depth + 1.0)
            } else {
                path_length(right, value, depth + 1.0)
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search in a tree of `n`
/// points; normalizes raw depths into anomaly scores.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Flag the anomalous observations of one group.
///
/// `samples`: (row index, value) pairs of a single level; groups of fewer
/// than two observations cannot be fitted and produce no flags (the caller
/// decides whether that is worth reporting).
pub fn detect(samples: &[(usize, f64)], contamination: f64, seed: u64) -> Vec<Flag> {
    if samples.len() < 2 {
        return Vec::new();
    }

    let mut rng = Pcg32::seed_from_u64(seed);
    let values: Vec<f64> = samples.iter().map(|&(_, v)| v).collect();

    let psi = values.len().min(MAX_SUBSAMPLE);
    let height_limit = (psi as f64).log2().ceil() as usize;
    let norm = average_path_length(psi);

    let mut pool = values.clone();
    let mut trees = Vec::with_capacity(TREE_COUNT);
    for _ in 0..TREE_COUNT {
        pool.shuffle(&mut rng);
        trees.push(build_tree(&pool[..psi], 0, height_limit, &mut rng));
    }

    let scores: Vec<f64> = values
        .iter()
        .map(|&v| {
            let mean_depth = trees
                .iter()
                .map(|tree| path_length(tree, v, 0.0))
                .sum::<f64>()
                / TREE_COUNT as f64;
            2f64.powf(-mean_depth / norm)
        })
        .collect();

    let mut sorted = scores.clone();
    sorted.sort_by(f64::total_cmp);
    let cutoff = quantile(&sorted, 1.0 - contamination);

    // Strictly above the cut-off: a constant group scores uniformly and
    // produces no flags.
    samples
        .iter()
        .zip(&scores)
        .filter(|&(_, &score)| score > cutoff)
        .map(|(&(row, value), _)| Flag {
            row,
            value,
            detector: Detector::IsolationForest,
        })
        .collect()
}
