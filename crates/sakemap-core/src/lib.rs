//! # sakemap core
//!
//! Taste-space matching for sake brands.
//!
//! Brands are placed in a six-axis taste space (floral, mellow, rich, mild,
//! dry, light) from their flavor charts, grouped with k-means, and matched
//! against a preference vector derived from a short questionnaire.
//!
//! ## Pipeline
//!
//! - [`vector::build_vectors`]: raw flavor-chart records to normalized points
//! - [`cluster::KMeans`]: points to clusters
//! - [`preference::preference_from_answers`]: questionnaire answers to a preference
//! - [`recommend::recommend`]: brands of the nearest cluster, closest first
//!
//! When no cluster model can be built, [`fallback::score_by_tags`] ranks
//! brands by their flavor tags instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use sakemap_core::{
//!     build_vectors, recommend, AnswerSet, Brand, ClusterModel, ClusteringConfig,
//!     preference_from_answers,
//! };
//! use serde_json::json;
//!
//! let charts = vec![
//!     json!({"brandId": 1, "f1": 0.9, "f2": 0.2, "f3": 0.1, "f4": 0.3, "f5": 0.2, "f6": 0.8}),
//!     json!({"brandId": 2, "f1": 0.1, "f2": 0.8, "f3": 0.9, "f4": 0.6, "f5": 0.7, "f6": 0.1}),
//!     json!({"brandId": 3, "f1": 0.8, "f2": 0.3, "f3": 0.2, "f4": 0.4, "f5": 0.1, "f6": 0.9}),
//! ];
//! let vectors = build_vectors(&charts);
//!
//! let config = ClusteringConfig::default();
//! let mut rng = StdRng::seed_from_u64(7);
//! let model = ClusterModel::from_vector_set(&vectors, &config, &mut rng).unwrap();
//!
//! let brands = vec![Brand::new("1", "華"), Brand::new("2", "濃"), Brand::new("3", "軽")];
//! let answers = AnswerSet::new().with("aroma", "華やか");
//! let rec = recommend(&preference_from_answers(&answers), &brands, &model);
//! assert!(rec.cluster.is_some());
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::float_cmp,
        clippy::cast_precision_loss
    )
)]

pub mod cache;
pub mod catalog;
pub mod cluster;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod distance;
pub mod engine;
pub mod error;
pub mod export;
pub mod fallback;
pub mod model;
pub mod preference;
pub mod questionnaire;
pub mod recommend;
pub mod store;
#[cfg(test)]
mod store_tests;
pub mod vector;

pub use cache::{CatalogCache, CatalogSource, DirectorySource, Resource};
pub use catalog::{Brand, BrandFlavorTags, CatalogSnapshot, FlavorTag};
pub use cluster::{choose_k, Clustering, KMeans};
pub use config::{ClusteringConfig, SakemapConfig};
pub use engine::{Answer, Engine, Outcome};
pub use error::{Error, Result};
pub use export::write_cluster_csv;
pub use fallback::{default_rules, score_by_tags, ScoredBrand, TagRule};
pub use model::ClusterModel;
pub use preference::{preference_from_answers, AnswerSet, Question};
pub use questionnaire::{is_complete, questions, visible_questions, QuestionSpec};
pub use recommend::{recommend, recommend_from_answers, Recommendation};
pub use store::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Subscription};
pub use vector::{build_vectors, FlavorAxis, Point, TasteVector, VectorSet, DIMENSION, NEUTRAL};
