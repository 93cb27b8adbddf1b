//! A fitted cluster model: the points, their clusters and the centroids.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cluster::Clustering;
use crate::config::ClusteringConfig;
use crate::vector::{Point, TasteVector, VectorSet};

/// Points partitioned into clusters, ready for [`crate::recommend::recommend`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    /// Clustered points.
    pub points: Vec<Point>,
    /// Cluster centroids.
    pub centroids: Vec<TasteVector>,
    /// Cluster index per point, parallel to `points`.
    pub assignments: Vec<usize>,
    /// Assignment passes the clustering took.
    pub iterations: usize,
}

impl ClusterModel {
    /// Pairs `points` with the clustering computed over them.
    #[must_use]
    pub fn new(points: Vec<Point>, clustering: Clustering) -> Self {
        debug_assert_eq!(points.len(), clustering.assignments.len());
        Self {
            points,
            centroids: clustering.centroids,
            assignments: clustering.assignments,
            iterations: clustering.iterations,
        }
    }

    /// Clusters a vector set with the configured parameters.
    ///
    /// Returns `None` when the set is empty; there is nothing to cluster
    /// and recommendations must come from elsewhere.
    pub fn from_vector_set<R: Rng + ?Sized>(
        set: &VectorSet,
        config: &ClusteringConfig,
        rng: &mut R,
    ) -> Option<Self> {
        if set.is_empty() {
            return None;
        }
        let kmeans = config.kmeans_for(set.points.len());
        let clustering = kmeans.fit(&set.points, rng);
        tracing::info!(
            points = set.points.len(),
            k = clustering.k(),
            iterations = clustering.iterations,
            "built cluster model"
        );
        Some(Self::new(set.points.clone(), clustering))
    }

    /// Number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Returns `true` when the model has no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Points assigned to `cluster`, in model order.
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = &Point> {
        self.points
            .iter()
            .zip(&self.assignments)
            .filter(move |(_, a)| **a == cluster)
            .map(|(p, _)| p)
    }

    /// Cluster of the point with the given id.
    #[must_use]
    pub fn cluster_of(&self, id: &str) -> Option<usize> {
        self.points
            .iter()
            .position(|p| p.id == id)
            .and_then(|i| self.assignments.get(i).copied())
    }

    /// Number of points in each cluster.
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
}
