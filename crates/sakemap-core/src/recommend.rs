//! Recommendation from the cluster nearest to a preference.
//!
//! The preference vector picks the nearest centroid; the members of that
//! cluster that exist in the current brand list are returned, closest
//! first.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Brand;
use crate::distance::{euclidean, nearest_index};
use crate::model::ClusterModel;
use crate::preference::{preference_from_answers, AnswerSet};
use crate::vector::TasteVector;

/// Output of [`recommend`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Brands of the chosen cluster, nearest first.
    pub results: Vec<Brand>,
    /// Chosen cluster, or `None` when no cluster model is available.
    ///
    /// `None` is not a failure: callers are expected to fall back to
    /// another strategy (see [`crate::fallback`]).
    pub cluster: Option<usize>,
    /// The preference the brands were ranked against.
    pub preference: TasteVector,
}

impl Recommendation {
    /// Returns `true` when there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Index of the centroid nearest to `preference`; the lowest index wins
/// ties. `None` when there are no centroids.
#[must_use]
pub fn nearest_cluster(preference: &TasteVector, centroids: &[TasteVector]) -> Option<usize> {
    nearest_index(preference, centroids)
}

/// Ranks the brands of the cluster nearest to `preference`.
///
/// Points whose id has no brand in `brands` are skipped. Ranking is by
/// Euclidean distance to the preference, ascending; equal distances keep
/// the point order of the model.
#[must_use]
pub fn recommend(preference: &TasteVector, brands: &[Brand], model: &ClusterModel) -> Recommendation {
    let Some(cluster) = nearest_cluster(preference, &model.centroids) else {
        return Recommendation {
            results: Vec::new(),
            cluster: None,
            preference: *preference,
        };
    };

    let brand_by_id: HashMap<&str, &Brand> = brands.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut ranked: Vec<(f32, &Brand)> = model
        .members(cluster)
        .filter_map(|point| {
            let brand = brand_by_id.get(point.id.as_str())?;
            Some((euclidean(preference, &point.vector), *brand))
        })
        .collect();

    // Stable: ties keep model order.
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    tracing::debug!(
        cluster,
        candidates = ranked.len(),
        "ranked brands in nearest cluster"
    );

    Recommendation {
        results: ranked.into_iter().map(|(_, brand)| brand.clone()).collect(),
        cluster: Some(cluster),
        preference: *preference,
    }
}

/// Maps `answers` to a preference and recommends from it.
#[must_use]
pub fn recommend_from_answers(
    answers: &AnswerSet,
    brands: &[Brand],
    model: &ClusterModel,
) -> Recommendation {
    recommend(&preference_from_answers(answers), brands, model)
}
