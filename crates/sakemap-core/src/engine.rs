//! The end-to-end matching flow.
//!
//! [`Engine`] ties the pieces together: it loads the catalog through a
//! [`CatalogCache`], builds the cluster model once from the flavor charts,
//! records the user's preference and answers questionnaires with either a
//! clustered recommendation or the tag-based fallback.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::{CatalogCache, CatalogSource};
use crate::catalog::{Brand, CatalogSnapshot};
use crate::config::SakemapConfig;
use crate::error::Result;
use crate::fallback::{default_rules, score_by_tags, ScoredBrand, TagRule};
use crate::model::ClusterModel;
use crate::preference::{preference_from_answers, AnswerSet};
use crate::recommend::recommend;
use crate::store::PreferenceStore;
use crate::vector::{TasteVector, VectorSet};

/// Where a set of results came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Outcome {
    /// Members of the cluster nearest to the preference.
    Clustered {
        /// Chosen cluster.
        cluster: usize,
        /// Brands, nearest first.
        results: Vec<Brand>,
    },
    /// Tag-rule scoring.
    Fallback {
        /// Brands with their scores.
        results: Vec<ScoredBrand>,
    },
}

impl Outcome {
    /// The brands, in ranking order.
    #[must_use]
    pub fn brands(&self) -> Vec<&Brand> {
        match self {
            Self::Clustered { results, .. } => results.iter().collect(),
            Self::Fallback { results } => results.iter().map(|s| &s.brand).collect(),
        }
    }

    /// Number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Clustered { results, .. } => results.len(),
            Self::Fallback { results } => results.len(),
        }
    }

    /// Returns `true` when there are no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Answer to a questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Preference derived from the answers.
    pub preference: TasteVector,
    /// Ranked brands.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Catalog, cluster model and preference store behind one handle.
pub struct Engine<S> {
    cache: CatalogCache<S>,
    config: SakemapConfig,
    rules: Vec<TagRule>,
    store: Option<Arc<dyn PreferenceStore>>,
    model: Mutex<Option<Arc<ClusterModel>>>,
}

impl<S: CatalogSource> Engine<S> {
    /// Creates an engine over `source`.
    pub fn new(source: S, config: SakemapConfig) -> Self {
        Self {
            cache: CatalogCache::new(source),
            config,
            rules: default_rules(),
            store: None,
            model: Mutex::new(None),
        }
    }

    /// Persists every derived preference to `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the fallback rules.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<TagRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Effective configuration.
    pub fn config(&self) -> &SakemapConfig {
        &self.config
    }

    /// The catalog cache.
    pub fn cache(&self) -> &CatalogCache<S> {
        &self.cache
    }

    /// Loads the catalog (cached).
    pub fn catalog(&self, include_flavor_charts: bool) -> Result<Arc<CatalogSnapshot>> {
        self.cache.load(include_flavor_charts)
    }

    /// The cluster model, built on first use.
    ///
    /// `Ok(None)` means the catalog has no usable flavor charts.
    pub fn model(&self) -> Result<Option<Arc<ClusterModel>>> {
        let mut slot = self.model.lock();
        if let Some(model) = slot.as_ref() {
            return Ok(Some(Arc::clone(model)));
        }

        let snapshot = self.cache.load(true)?;
        let Some(charts) = snapshot.flavor_charts.as_ref() else {
            return Ok(None);
        };
        let vectors = VectorSet::from_flavor_charts(charts);
        let mut rng = self.config.clustering.rng();
        let model = ClusterModel::from_vector_set(&vectors, &self.config.clustering, &mut rng)
            .map(Arc::new);
        if model.is_none() {
            tracing::warn!("flavor charts yielded no vectors; recommendations use tag rules");
        }
        slot.clone_from(&model);
        Ok(model)
    }

    /// Maps `answers` to a preference, stores it and ranks brands.
    ///
    /// Clustered results are preferred; when there is no model or the
    /// chosen cluster has no known brands, the tag rules decide.
    pub fn answer(&self, answers: &AnswerSet) -> Result<Answer> {
        let preference = preference_from_answers(answers);

        if let Some(store) = &self.store {
            if let Err(err) = store.save(&preference) {
                tracing::warn!(error = %err, "could not persist preference");
            }
        }

        let snapshot = self.cache.load(true)?;
        if let Some(model) = self.model()? {
            let rec = recommend(&preference, &snapshot.brands, &model);
            if let (Some(cluster), false) = (rec.cluster, rec.is_empty()) {
                return Ok(Answer {
                    preference,
                    outcome: Outcome::Clustered {
                        cluster,
                        results: rec.results,
                    },
                });
            }
        }

        let results = score_by_tags(
            answers,
            &snapshot,
            &self.rules,
            self.config.recommend.fallback_limit,
        );
        Ok(Answer {
            preference,
            outcome: Outcome::Fallback { results },
        })
    }

    /// Drops the cached catalog and cluster model.
    pub fn reset(&self) {
        self.cache.clear();
        *self.model.lock() = None;
    }
}

impl<S> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("rules", &self.rules.len())
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
