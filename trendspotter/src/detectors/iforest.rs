//! Isolation forest detector: flags rows that isolate in few splits.
//!
//! An ensemble of randomized binary trees, each grown on a subsample of
//! rows. A split picks a random column with spread in the node and a
//! random threshold between that column's minimum and maximum. Rows that
//! separate from the rest in few splits — short average path lengths — are
//! the easy-to-isolate ones and score close to 1; rows that take as many
//! splits as a random search tree would need score near 0.5 or below.
//!
//! Path lengths are truncated at `ceil(log2(subsample))` and extended by
//! the expected depth of an unsplit node, the standard average-path
//! normalization.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::stats;
use super::{reduce_for_fit, DetectorOutcome, FitInput, OutlierDetector};
use crate::config::Contamination;
use crate::frame::NumericFrame;

/// Trees per forest.
const TREE_COUNT: usize = 100;

/// Rows sampled per tree, capped at the dataset size.
const MAX_SUBSAMPLE: usize = 256;

/// Score above which a row counts as an outlier without an assumed rate.
const AUTO_SCORE_CUTOFF: f64 = 0.5;

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Isolation forest detector with an injectable seed.
///
/// The same dataset, contamination, and seed always produce the same
/// flags; reports are reproducible across runs and machines.
#[derive(Debug, Clone)]
pub struct IsolationForestDetector {
    contamination: Contamination,
    seed: u64,
}

enum Tree {
    Split {
        feature: usize,
        threshold: f64,
        below: Box<Tree>,
        above: Box<Tree>,
    },
    Leaf {
        size: usize,
    },
}

/// Expected path length of an unsuccessful search in a random binary
/// search tree over `m` values.
fn average_path_length(m: usize) -> f64 {
    match m {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let m = m as f64;
            2.0 * ((m - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (m - 1.0) / m
        }
    }
}

/// Partial Fisher-Yates: the first `count` entries of a shuffled 0..n.
fn sample_rows(n: usize, count: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..count {
        let j = rng.random_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(count);
    indices
}

fn grow(points: &[Vec<f64>], sample: &[usize], depth: usize, limit: usize, rng: &mut StdRng) -> Tree {
    if depth >= limit || sample.len() <= 1 {
        return Tree::Leaf {
            size: sample.len(),
        };
    }

    // Only columns with spread inside this node can split it.
    let dimensions = points[sample[0]].len();
    let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(dimensions);
    for feature in 0..dimensions {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &row in sample {
            let value = points[row][feature];
            lo = lo.min(value);
            hi = hi.max(value);
        }
        if hi > lo {
            candidates.push((feature, lo, hi));
        }
    }
    if candidates.is_empty() {
        return Tree::Leaf {
            size: sample.len(),
        };
    }

    let (feature, lo, hi) = candidates[rng.random_range(0..candidates.len())];
    let threshold = rng.random_range(lo..hi);
    let (below, above): (Vec<usize>, Vec<usize>) = sample
        .iter()
        .copied()
        .partition(|&row| points[row][feature] < threshold);

    Tree::Split {
        feature,
        threshold,
        below: Box::new(grow(points, &below, depth + 1, limit, rng)),
        above: Box::new(grow(points, &above, depth + 1, limit, rng)),
    }
}

fn path_length(tree: &Tree, point: &[f64], depth: usize) -> f64 {
    match tree {
        Tree::Leaf { size } => depth as f64 + average_path_length(*size),
        Tree::Split {
            feature,
            threshold,
            below,
            above,
        } => {
            if point[*feature] < *threshold {
                path_length(below, point, depth + 1)
            } else {
                path_length(above, point, depth + 1)
            }
        }
    }
}

impl IsolationForestDetector {
    /// Creates a detector with the given contamination and seed.
    pub fn new(contamination: Contamination, seed: u64) -> Self {
        Self {
            contamination,
            seed,
        }
    }

    fn scores(&self, view: &NumericFrame) -> Vec<f64> {
        let points = view.row_vectors();
        let n = points.len();
        let subsample = MAX_SUBSAMPLE.min(n);
        let height_limit = (subsample as f64).log2().ceil() as usize;
        let normalizer = average_path_length(subsample);
        trace!(rows = n, subsample, trees = TREE_COUNT, "growing forest");

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut path_sums = vec![0.0f64; n];
        for _ in 0..TREE_COUNT {
            let sample = sample_rows(n, subsample, &mut rng);
            let tree = grow(&points, &sample, 0, height_limit, &mut rng);
            for (row, point) in points.iter().enumerate() {
                path_sums[row] += path_length(&tree, point, 0);
            }
        }

        path_sums
            .into_iter()
            .map(|sum| {
                let average = sum / TREE_COUNT as f64;
                2.0f64.powf(-average / normalizer)
            })
            .collect()
    }
}

impl OutlierDetector for IsolationForestDetector {
    fn name(&self) -> &str {
        "anomaly_iforest"
    }

    fn description(&self) -> &str {
        "flags rows that randomized trees isolate in unusually few splits"
    }

    fn detect(&self, frame: &NumericFrame) -> DetectorOutcome {
        match reduce_for_fit(frame)? {
            FitInput::Degenerate(rows) => Ok(vec![false; rows]),
            FitInput::Ready(view) => {
                let scores = self.scores(&view);
                let threshold = match self.contamination {
                    Contamination::Auto => AUTO_SCORE_CUTOFF,
                    Contamination::Fixed(rate) => {
                        stats::percentile(&scores, 100.0 * (1.0 - rate))
                    }
                };
                Ok(scores.into_iter().map(|score| score > threshold).collect())
            }
        }
    }
}
