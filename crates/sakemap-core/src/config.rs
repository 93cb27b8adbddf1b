//! Configuration for sakemap.
//!
//! Values are layered with `figment`: built-in defaults, then a
//! `sakemap.toml` file, then `SAKEMAP_` environment variables (`__`
//! separates nested keys, e.g. `SAKEMAP_CLUSTERING__SEED=7`).
//!
//! ```toml
//! [clustering]
//! max_iterations = 50
//! min_clusters = 2
//! max_clusters = 20
//! seed = 42
//!
//! [recommend]
//! fallback_limit = 3
//!
//! [catalog]
//! data_dir = "./data"
//! ```

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cluster::{choose_k, KMeans, DEFAULT_MAX_ITERATIONS};
use crate::error::{Error, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "sakemap.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SAKEMAP_";

/// Clustering parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Bound on refinement passes.
    pub max_iterations: usize,
    /// Lower bound of the cluster-count heuristic.
    pub min_clusters: usize,
    /// Upper bound of the cluster-count heuristic.
    pub max_clusters: usize,
    /// Seed for centroid initialization. Unset draws from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            min_clusters: 2,
            max_clusters: 20,
            seed: None,
        }
    }
}

impl ClusteringConfig {
    /// Cluster count for a catalog of `n` points.
    #[must_use]
    pub fn k_for(&self, n: usize) -> usize {
        choose_k(n, self.min_clusters, self.max_clusters)
    }

    /// A clusterer sized for `n` points.
    #[must_use]
    pub fn kmeans_for(&self, n: usize) -> KMeans {
        KMeans::new(self.k_for(n)).with_max_iterations(self.max_iterations)
    }

    /// Random source for centroid initialization.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Recommendation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Number of brands returned by the tag-based fallback.
    pub fallback_limit: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self { fallback_limit: 3 }
    }
}

/// Where catalog data is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding `brands.json`, `flavor-charts.json`, ...
    pub data_dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Where the preference vector is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the preference file. Unset keeps preferences in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_dir: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SakemapConfig {
    /// Clustering parameters.
    pub clustering: ClusteringConfig,
    /// Recommendation parameters.
    pub recommend: RecommendConfig,
    /// Catalog source.
    pub catalog: CatalogConfig,
    /// Preference storage.
    pub storage: StorageConfig,
}

impl SakemapConfig {
    /// Loads `sakemap.toml` from the working directory (if present) and
    /// the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE_NAME)
    }

    /// Loads the given file (if present) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = Self::figment(path.as_ref()).extract()?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// The layered provider stack: defaults, file, environment.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        let clustering = &self.clustering;
        if clustering.min_clusters == 0 {
            return Err(Error::Config(
                "clustering.min_clusters must be at least 1".to_string(),
            ));
        }
        if clustering.min_clusters > clustering.max_clusters {
            return Err(Error::Config(format!(
                "clustering.min_clusters ({}) exceeds clustering.max_clusters ({})",
                clustering.min_clusters, clustering.max_clusters
            )));
        }
        if clustering.max_iterations == 0 {
            return Err(Error::Config(
                "clustering.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
