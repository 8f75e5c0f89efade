//! Density detector: local outlier factor over the numeric view.
//!
//! The classic construction: for each row, find its k nearest neighbors by
//! Euclidean distance, derive reachability distances from the neighbors'
//! k-distances, invert the mean reachability into a local density, and
//! score the row as the ratio of its neighbors' densities to its own. A
//! score near 1 means the row sits in a neighborhood as dense as its
//! neighbors'; scores well above 1 mean the row is comparatively isolated.
//!
//! Distances are computed pairwise, so this detector is quadratic in the
//! row count.

use tracing::trace;

use super::stats;
use super::{reduce_for_fit, DetectorOutcome, FitInput, OutlierDetector, Unavailable};
use crate::config::Contamination;
use crate::frame::NumericFrame;

/// Score above which a row counts as an outlier without an assumed rate.
const AUTO_SCORE_CUTOFF: f64 = 1.5;

/// Keeps a density of coincident points finite.
const DENSITY_EPSILON: f64 = 1e-10;

/// Local-outlier-factor detector.
///
/// The neighborhood size is clamped to `rows - 1` at fit time, so small
/// datasets still produce answers. By default the score cutoff is the
/// fixed [`AUTO_SCORE_CUTOFF`]; a fixed contamination rate switches to a
/// percentile threshold over the computed scores.
#[derive(Debug, Clone)]
pub struct LofDetector {
    neighbor_count: usize,
    contamination: Contamination,
}

impl LofDetector {
    /// Creates a detector with the given neighborhood size and the
    /// score-based auto cutoff.
    pub fn new(neighbor_count: usize) -> Self {
        Self {
            neighbor_count,
            contamination: Contamination::Auto,
        }
    }

    /// Switches the cutoff to a fixed contamination rate.
    pub fn with_contamination(mut self, contamination: Contamination) -> Self {
        self.contamination = contamination;
        self
    }

    fn scores(&self, view: &NumericFrame) -> Result<Vec<f64>, Unavailable> {
        let points = view.row_vectors();
        let n = points.len();
        let k = self.neighbor_count.min(n - 1).max(1);
        trace!(rows = n, neighborhood = k, "computing density scores");

        let mut distances = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let distance = stats::euclidean_distance(&points[i], &points[j]);
                distances[i][j] = distance;
                distances[j][i] = distance;
            }
        }

        // Nearest neighbors per row, ties broken by row index so the
        // result does not depend on sort internals.
        let mut neighbors: Vec<Vec<usize>> = Vec::with_capacity(n);
        let mut k_distance = vec![0.0f64; n];
        for i in 0..n {
            let mut order: Vec<usize> = (0..n).filter(|&j| j != i).collect();
            order.sort_by(|&a, &b| distances[i][a].total_cmp(&distances[i][b]).then(a.cmp(&b)));
            order.truncate(k);
            k_distance[i] = distances[i][order[k - 1]];
            neighbors.push(order);
        }

        // Local reachability density: inverse mean reachability distance.
        let mut density = vec![0.0f64; n];
        for i in 0..n {
            let reach_sum: f64 = neighbors[i]
                .iter()
                .map(|&o| k_distance[o].max(distances[i][o]))
                .sum();
            density[i] = 1.0 / (reach_sum / k as f64 + DENSITY_EPSILON);
        }

        let scores: Vec<f64> = (0..n)
            .map(|i| {
                let neighbor_density: f64 = neighbors[i].iter().map(|&o| density[o]).sum();
                neighbor_density / (k as f64 * density[i])
            })
            .collect();

        if scores.iter().any(|score| !score.is_finite()) {
            return Err(Unavailable::Numerical(
                "non-finite density score".to_string(),
            ));
        }
        Ok(scores)
    }
}

impl OutlierDetector for LofDetector {
    fn name(&self) -> &str {
        "anomaly_lof"
    }

    fn description(&self) -> &str {
        "flags rows whose local density is low relative to their nearest neighbors"
    }

    fn detect(&self, frame: &NumericFrame) -> DetectorOutcome {
        match reduce_for_fit(frame)? {
            FitInput::Degenerate(rows) => Ok(vec![false; rows]),
            FitInput::Ready(view) => {
                let scores = self.scores(&view)?;
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
