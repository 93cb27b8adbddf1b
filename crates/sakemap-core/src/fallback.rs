//! Tag-based ranking for when no cluster model is available.
//!
//! Each rule maps a question/answer pair to flavor tag names and a weight.
//! A brand scores the rule's weight once for every named tag it carries.
//! Tag names are resolved to ids against the catalog, so the rules survive
//! id renumbering.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Brand, CatalogSnapshot};
use crate::preference::AnswerSet;

/// Default number of brands returned.
pub const DEFAULT_LIMIT: usize = 3;

/// Weight of situation rules.
pub const SITUATION_WEIGHT: u32 = 50;
/// Weight of type rules.
pub const TYPE_WEIGHT: u32 = 20;

/// One scoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    /// Question id the rule listens to.
    pub question: String,
    /// Answer that activates the rule.
    pub answer: String,
    /// Flavor tag names that earn the weight.
    pub tags: Vec<String>,
    /// Points per matching tag.
    pub weight: u32,
}

impl TagRule {
    /// Creates a rule.
    pub fn new(question: &str, answer: &str, tags: &[&str], weight: u32) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
            weight,
        }
    }

    fn is_active(&self, answers: &AnswerSet) -> bool {
        answers.get_raw(&self.question) == Some(self.answer.as_str())
    }
}

/// The built-in `situation` and `type` rules.
#[must_use]
pub fn default_rules() -> Vec<TagRule> {
    const SITUATION: &[(&str, &[&str])] = &[
        ("ごはん", &["旨味", "辛口", "スッキリ"]),
        ("デザート", &["フルーティ", "甘味", "酸味"]),
        ("乾杯", &["フルーティ", "スッキリ", "酸味"]),
        ("一人でゆっくり", &["旨味", "酸味"]),
        ("おつまみ", &["スッキリ", "辛口", "酸味"]),
    ];
    const TYPE: &[(&str, &[&str])] = &[
        ("しっかり", &["旨味"]),
        ("スッキリ", &["スッキリ"]),
        ("甘め", &["甘味", "フルーティ"]),
        ("香り重視", &["フルーティ"]),
        ("飲みやすさ", &["スッキリ", "フルーティ"]),
        ("個性・深み", &["旨味"]),
    ];

    SITUATION
        .iter()
        .map(|(answer, tags)| TagRule::new("situation", answer, tags, SITUATION_WEIGHT))
        .chain(
            TYPE.iter()
                .map(|(answer, tags)| TagRule::new("type", answer, tags, TYPE_WEIGHT)),
        )
        .collect()
}

/// A brand with its fallback score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredBrand {
    /// The brand.
    #[serde(flatten)]
    pub brand: Brand,
    /// Accumulated rule weight.
    pub score: u32,
}

/// Ranks brands by the tag rules activated by `answers`.
///
/// Returns at most `limit` brands with a positive score, highest first;
/// equal scores keep catalog order. When the catalog has no brand/tag data
/// or nothing scores, the first `limit` brands are returned with score 1.
#[must_use]
pub fn score_by_tags(
    answers: &AnswerSet,
    snapshot: &CatalogSnapshot,
    rules: &[TagRule],
    limit: usize,
) -> Vec<ScoredBrand> {
    let first_brands = || {
        snapshot
            .brands
            .iter()
            .take(limit)
            .map(|brand| ScoredBrand {
                brand: brand.clone(),
                score: 1,
            })
            .collect::<Vec<_>>()
    };

    if snapshot.brand_flavor_tags.is_empty() {
        tracing::debug!("no brand flavor tags; returning leading brands");
        return first_brands();
    }

    let tag_id_by_name: HashMap<&str, u64> = snapshot
        .tags
        .iter()
        .map(|t| (t.tag.as_str(), t.id))
        .collect();
    let tags_by_brand: HashMap<&str, HashSet<u64>> = snapshot
        .brand_flavor_tags
        .iter()
        .map(|e| (e.brand_id.as_str(), e.tag_ids.iter().copied().collect()))
        .collect();

    let active: Vec<(u32, Vec<u64>)> = rules
        .iter()
        .filter(|rule| rule.is_active(answers))
        .map(|rule| {
            let ids = rule
                .tags
                .iter()
                .filter_map(|name| tag_id_by_name.get(name.as_str()).copied())
                .collect();
            (rule.weight, ids)
        })
        .collect();

    let empty = HashSet::new();
    let mut scored: Vec<ScoredBrand> = snapshot
        .brands
        .iter()
        .filter_map(|brand| {
            let brand_tags = tags_by_brand.get(brand.id.as_str()).unwrap_or(&empty);
            let score: u32 = active
                .iter()
                .map(|(weight, ids)| {
                    let hits = ids.iter().filter(|id| brand_tags.contains(id)).count();
                    weight.saturating_mul(u32::try_from(hits).unwrap_or(u32::MAX))
                })
                .fold(0, u32::saturating_add);
            (score > 0).then(|| ScoredBrand {
                brand: brand.clone(),
                score,
            })
        })
        .collect();

    if scored.is_empty() {
        tracing::debug!(rules = active.len(), "no brand matched a tag rule");
        return first_brands();
    }

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}
