//! Cluster-distance detector: flags rows far from every cluster center.
//!
//! Columns are standardized to zero mean and unit variance so that no
//! single scale dominates the distance, then k-means partitions the rows.
//! Each row's distance to its assigned centroid is the anomaly signal:
//! rows above a configured percentile of those distances are flagged.
//!
//! The requested cluster count adapts to small samples — fitting five
//! clusters to three rows is meaningless, so k drops to `max(2, rows / 2)`
//! when there are fewer rows than requested clusters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::stats;
use super::{reduce_for_fit, DetectorOutcome, FitInput, OutlierDetector};
use crate::frame::NumericFrame;

/// Lloyd iteration cap per restart.
const MAX_ITERATIONS: usize = 300;

/// Centroid shift below which an iteration counts as converged.
const CONVERGENCE_TOL: f64 = 1e-4;

/// Independent k-means restarts; the lowest-inertia fit wins.
const RESTARTS: usize = 10;

/// K-means distance detector with an injectable seed.
#[derive(Debug, Clone)]
pub struct ClusterDistanceDetector {
    cluster_count: usize,
    distance_percentile: f64,
    seed: u64,
}

/// Shrinks the requested cluster count when the sample cannot support it.
fn reduced_cluster_count(requested: usize, rows: usize) -> usize {
    if rows < requested {
        (rows / 2).max(2)
    } else {
        requested
    }
}

/// Standardized row vectors: every column scaled to mean 0, deviation 1.
/// Callers guarantee no column is constant.
fn standardized_points(view: &NumericFrame) -> Vec<Vec<f64>> {
    let scales: Vec<(f64, f64)> = view
        .columns()
        .iter()
        .map(|column| {
            (
                stats::mean(column.values()),
                stats::population_std_dev(column.values()),
            )
        })
        .collect();

    (0..view.row_count())
        .map(|row| {
            view.columns()
                .iter()
                .zip(scales.iter())
                .map(|(column, (center, deviation))| (column.values()[row] - center) / deviation)
                .collect()
        })
        .collect()
}

/// K-means++ seeding: spread the initial centroids with squared-distance
/// weighted choices.
fn init_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())].clone());

    let mut weights: Vec<f64> = points
        .iter()
        .map(|point| stats::squared_euclidean_distance(point, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = weights.iter().sum();
        let chosen = if total > 0.0 {
            let mut target = rng.random_range(0.0..total);
            let mut index = points.len() - 1;
            for (candidate, weight) in weights.iter().enumerate() {
                if target < *weight {
                    index = candidate;
                    break;
                }
                target -= weight;
            }
            index
        } else {
            // Remaining mass is zero once every point coincides with a
            // centroid; any pick is as good as another.
            rng.random_range(0..points.len())
        };

        let centroid = points[chosen].clone();
        for (index, weight) in weights.iter_mut().enumerate() {
            *weight = weight.min(stats::squared_euclidean_distance(&points[index], &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

struct Fit {
    inertia: f64,
    assignment: Vec<usize>,
    centroids: Vec<Vec<f64>>,
}

fn lloyd(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Fit {
    let dimensions = points[0].len();
    let mut centroids = init_centroids(points, k, rng);
    let mut assignment = vec![0usize; points.len()];
    let mut nearest = vec![0.0f64; points.len()];

    for _ in 0..MAX_ITERATIONS {
        for (row, point) in points.iter().enumerate() {
            let (cluster, distance) = nearest_centroid(point, &centroids);
            assignment[row] = cluster;
            nearest[row] = distance;
        }

        let mut sums = vec![vec![0.0f64; dimensions]; k];
        let mut counts = vec![0usize; k];
        for (row, point) in points.iter().enumerate() {
            counts[assignment[row]] += 1;
            for (dimension, value) in point.iter().enumerate() {
                sums[assignment[row]][dimension] += value;
            }
        }

        let mut shift = 0.0f64;
        for cluster in 0..k {
            let updated = if counts[cluster] == 0 {
                // An empty cluster steals the row currently worst served
                // by its centroid.
                let stray = farthest_row(&nearest);
                nearest[stray] = 0.0;
                points[stray].clone()
            } else {
                sums[cluster]
                    .iter()
                    .map(|sum| sum / counts[cluster] as f64)
                    .collect()
            };
            shift = shift.max(stats::euclidean_distance(&centroids[cluster], &updated));
            centroids[cluster] = updated;
        }

        if shift <= CONVERGENCE_TOL {
            break;
        }
    }

    let mut inertia = 0.0f64;
    for (row, point) in points.iter().enumerate() {
        let (cluster, distance) = nearest_centroid(point, &centroids);
        assignment[row] = cluster;
        inertia += distance * distance;
    }

    Fit {
        inertia,
        assignment,
        centroids,
    }
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0usize;
    let mut best_distance = f64::INFINITY;
    for (cluster, centroid) in centroids.iter().enumerate() {
        let distance = stats::euclidean_distance(point, centroid);
        if distance < best_distance {
            best = cluster;
            best_distance = distance;
        }
    }
    (best, best_distance)
}

fn farthest_row(nearest: &[f64]) -> usize {
    let mut stray = 0usize;
    for (row, distance) in nearest.iter().enumerate() {
        if *distance > nearest[stray] {
            stray = row;
        }
    }
    stray
}

impl ClusterDistanceDetector {
    /// Creates a detector with the given cluster count, distance
    /// percentile, and seed.
    pub fn new(cluster_count: usize, distance_percentile: f64, seed: u64) -> Self {
        Self {
            cluster_count,
            distance_percentile,
            seed,
        }
    }
}

impl OutlierDetector for ClusterDistanceDetector {
    fn name(&self) -> &str {
        "anomaly_cluster_dist"
    }

    fn description(&self) -> &str {
        "flags rows unusually far from their nearest cluster centroid"
    }

    fn detect(&self, frame: &NumericFrame) -> DetectorOutcome {
        match reduce_for_fit(frame)? {
            FitInput::Degenerate(rows) => Ok(vec![false; rows]),
            FitInput::Ready(view) => {
                let points = standardized_points(&view);
                let k = reduced_cluster_count(self.cluster_count, points.len());
                trace!(rows = points.len(), clusters = k, "fitting clusters");

                let mut rng = StdRng::seed_from_u64(self.seed);
                let mut best: Option<Fit> = None;
                for _ in 0..RESTARTS {
                    let fit = lloyd(&points, k, &mut rng);
                    let improved = match &best {
                        Some(current) => fit.inertia < current.inertia,
                        None => true,
                    };
                    if improved {
                        best = Some(fit);
                    }
                }
                // RESTARTS > 0, so a fit always exists.
                let Some(fit) = best else {
                    return Ok(vec![false; points.len()]);
                };

                let distances: Vec<f64> = points
                    .iter()
                    .zip(fit.assignment.iter())
                    .map(|(point, &cluster)| {
                        stats::euclidean_distance(point, &fit.centroids[cluster])
                    })
                    .collect();
                let threshold = stats::percentile(&distances, self.distance_percentile);
                Ok(distances
                    .into_iter()
                    .map(|distance| distance > threshold)
                    .collect())
            }
        }
    }
}
