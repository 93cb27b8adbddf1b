//! K-means clustering over taste vectors.
//!
//! Lloyd's algorithm with random-sample initialization:
//!
//! 1. Pick `k` distinct points at random as the initial centroids
//! 2. Assign each point to its nearest centroid
//! 3. Move each centroid to the mean of its points
//! 4. Repeat until no assignment changes or `max_iterations` is reached
//!
//! The random source is passed in by the caller, so a seeded generator
//! reproduces a run exactly. With an entropy-seeded generator only the
//! stability of the final partition is guaranteed, not which local optimum
//! is reached.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distance::nearest_index;
use crate::vector::{Point, TasteVector, DIMENSION};

/// Default bound on refinement passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Result of a k-means run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    /// Final centroids.
    pub centroids: Vec<TasteVector>,
    /// Centroid index per point, parallel to the input points.
    pub assignments: Vec<usize>,
    /// Number of assignment passes executed.
    pub iterations: usize,
}

impl Clustering {
    /// Number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Number of points assigned to each cluster.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &a in &self.assignments {
            if let Some(size) = sizes.get_mut(a) {
                *size += 1;
            }
        }
        sizes
    }

    /// Returns `true` when reassigning `points` to the final centroids
    /// would not move any point.
    #[must_use]
    pub fn reassign_is_stable(&self, points: &[Point]) -> bool {
        points.len() == self.assignments.len()
            && points
                .iter()
                .zip(&self.assignments)
                .all(|(p, &a)| nearest_index(&p.vector, &self.centroids) == Some(a))
    }
}

/// K-means clusterer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
}

impl KMeans {
    /// Creates a clusterer for `k` clusters with the default iteration bound.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the iteration bound. At least one pass always runs.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Requested number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Iteration bound.
    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Partitions `points` into at most `k` clusters.
    ///
    /// The effective `k` is clamped to `[1, points.len()]`. Empty input
    /// returns an empty clustering without iterating. A run that hits the
    /// iteration bound returns its current partition, which is still a
    /// valid result.
    pub fn fit<R: Rng + ?Sized>(&self, points: &[Point], rng: &mut R) -> Clustering {
        if points.is_empty() {
            return Clustering::default();
        }

        let k = self.k.clamp(1, points.len());
        let mut centroids = pick_initial_centroids(points, k, rng);
        let mut assignments = vec![usize::MAX; points.len()];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations.max(1) {
            iterations += 1;
            let changed = assign(points, &centroids, &mut assignments);
            update_centroids(points, &assignments, &mut centroids);
            if !changed {
                converged = true;
                break;
            }
        }

        if converged {
            tracing::debug!(k, iterations, "k-means converged");
        } else {
            tracing::debug!(
                k,
                iterations,
                "k-means reached the iteration bound before converging"
            );
        }

        Clustering {
            centroids,
            assignments,
            iterations,
        }
    }
}

/// Picks `k` initial centroids by sampling distinct points without
/// replacement; when `k` exceeds the number of points, the remainder is
/// filled by cycling through the points in order.
fn pick_initial_centroids<R: Rng + ?Sized>(
    points: &[Point],
    k: usize,
    rng: &mut R,
) -> Vec<TasteVector> {
    if points.is_empty() {
        return Vec::new();
    }

    let sampled = k.min(points.len());
    let mut centroids: Vec<TasteVector> = rand::seq::index::sample(rng, points.len(), sampled)
        .into_iter()
        .map(|idx| points[idx].vector)
        .collect();

    while centroids.len() < k {
        centroids.push(points[centroids.len() % points.len()].vector);
    }

    centroids
}

/// Assigns every point to its nearest centroid. Returns whether any
/// assignment changed.
fn assign(points: &[Point], centroids: &[TasteVector], assignments: &mut [usize]) -> bool {
    let mut changed = false;
    for (point, slot) in points.iter().zip(assignments.iter_mut()) {
        let best = nearest_index(&point.vector, centroids).unwrap_or(0);
        if *slot != best {
            *slot = best;
            changed = true;
        }
    }
    changed
}

/// Moves each centroid to the mean of its assigned points. Centroids with
/// no points keep their previous position.
fn update_centroids(points: &[Point], assignments: &[usize], centroids: &mut [TasteVector]) {
    let mut sums = vec![[0.0_f32; DIMENSION]; centroids.len()];
    let mut counts = vec![0_usize; centroids.len()];

    for (point, &a) in points.iter().zip(assignments) {
        counts[a] += 1;
        for i in 0..DIMENSION {
            sums[a][i] += point.vector[i];
        }
    }

    for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        if count == 0 {
            continue;
        }
        // Reason: cluster sizes are catalog-sized, far below f32's exact integer range.
        #[allow(clippy::cast_precision_loss)]
        let n = count as f32;
        for i in 0..DIMENSION {
            centroid[i] = (sum[i] / n).clamp(0.0, 1.0);
        }
    }
}

/// Cluster-count heuristic for a catalog of `n` points:
/// `round(sqrt(n / 2))` clamped to `[min_k, max_k]`.
#[must_use]
pub fn choose_k(n: usize, min_k: usize, max_k: usize) -> usize {
    // Reason: n is a catalog size; the square root is small and non-negative.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let k = (n as f64 / 2.0).sqrt().round() as usize;
    k.clamp(min_k, max_k.max(min_k))
}

#[cfg(test)]
mod init_tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f32 / n.max(1) as f32;
                Point::new(i.to_string(), [x; DIMENSION])
            })
            .collect()
    }

    #[test]
    fn test_initial_centroids_are_distinct_points() {
        let pts = points(10);
        let mut rng = StdRng::seed_from_u64(7);
        let centroids = pick_initial_centroids(&pts, 4, &mut rng);
        assert_eq!(centroids.len(), 4);
        for (i, a) in centroids.iter().enumerate() {
            assert!(pts.iter().any(|p| &p.vector == a));
            for b in &centroids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_initial_centroids_cycle_when_k_exceeds_points() {
        let pts = points(2);
        let mut rng = StdRng::seed_from_u64(7);
        let centroids = pick_initial_centroids(&pts, 5, &mut rng);
        assert_eq!(centroids.len(), 5);
        assert_eq!(centroids[2], pts[0].vector);
        assert_eq!(centroids[3], pts[1].vector);
        assert_eq!(centroids[4], pts[0].vector);
    }

    #[test]
    fn test_initial_centroids_empty_points() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_initial_centroids(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let pts = vec![
            Point::new("a", [0.0; DIMENSION]),
            Point::new("b", [0.1; DIMENSION]),
            Point::new("c", [0.9; DIMENSION]),
            Point::new("d", [1.0; DIMENSION]),
        ];
        let mut centroids = vec![[0.0; DIMENSION], [0.5; DIMENSION], [1.0; DIMENSION]];
        let mut assignments = vec![usize::MAX; pts.len()];

        assert!(assign(&pts, &centroids, &mut assignments));
        assert_eq!(assignments, vec![0, 0, 2, 2]);

        update_centroids(&pts, &assignments, &mut centroids);
        assert_eq!(centroids[1], [0.5; DIMENSION]);
        assert!((centroids[0][0] - 0.05).abs() < 1e-6);
        assert!((centroids[2][0] - 0.95).abs() < 1e-6);
    }
}
