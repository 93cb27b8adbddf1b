//! Mapping questionnaire answers to a preference vector.
//!
//! A preference starts at [`NEUTRAL`] and is pushed along the taste axes by
//! one delta per answered question. Questions are applied in a fixed order
//! and the vector is clamped back into `[0, 1]` after every step, so when
//! several answers push the same axis past a bound, the order matters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vector::{TasteVector, DIMENSION, NEUTRAL};

/// A recognized questionnaire question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    /// What the sake accompanies.
    Pairing,
    /// Which kind of meal (asked after a meal pairing).
    RiceDetail,
    /// Which kind of dessert (asked after a dessert pairing).
    DessertDetail,
    /// Sweet or dry.
    SweetDry,
    /// Light or rich body.
    Richness,
    /// Aroma style.
    Aroma,
}

// Delta tables. Axis order: floral, mellow, rich, mild, dry, light.
const PAIRING_DELTAS: &[(&str, TasteVector)] = &[
    ("食事と一緒に", [0.0, 0.0, 0.0, 0.5, 1.0, 0.0]),
    ("デザートと一緒に", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ("おつまみと一緒に", [0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
    ("そのまま", [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
];

const RICE_DETAIL_DELTAS: &[(&str, TasteVector)] = &[
    ("肉系", [0.0, 1.0, 1.0, 0.0, 0.0, 0.0]),
    ("魚系", [0.0, 0.0, 0.0, 1.0, 0.0, 1.0]),
    ("野菜・あっさり", [0.0, 0.0, 0.0, 1.0, 0.0, 1.0]),
];

const DESSERT_DETAIL_DELTAS: &[(&str, TasteVector)] = &[
    ("フルーツやショートケーキなど", [1.0, 0.6, 0.0, 0.0, 0.0, 0.0]),
    ("チョコレート系", [0.0, 1.0, 1.0, 0.0, 0.0, 0.0]),
    ("和菓子", [0.0, 0.6, 0.0, 0.8, 0.4, 0.8]),
];

const SWEET_DRY_DELTAS: &[(&str, TasteVector)] = &[
    ("甘口がいい", [0.6, 0.4, 0.0, 0.0, -0.5, 0.0]),
    ("どちらでもない", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ("辛口がいい", [0.0, 0.0, 0.0, 0.0, 1.0, 0.2]),
];

const RICHNESS_DELTAS: &[(&str, TasteVector)] = &[
    ("軽い", [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
    ("バランス", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ("濃い", [0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
];

const AROMA_DELTAS: &[(&str, TasteVector)] = &[
    ("華やか", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ("穏やか", [0.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
];

impl Question {
    /// All questions in the order they are applied.
    pub const ALL: [Question; 6] = [
        Self::Pairing,
        Self::RiceDetail,
        Self::DessertDetail,
        Self::SweetDry,
        Self::Richness,
        Self::Aroma,
    ];

    /// Wire identifier of the question.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Pairing => "pairing",
            Self::RiceDetail => "rice_detail",
            Self::DessertDetail => "dessert_detail",
            Self::SweetDry => "sweet_dry",
            Self::Richness => "richness",
            Self::Aroma => "aroma",
        }
    }

    /// Looks a question up by its wire identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.id() == id)
    }

    fn deltas(self) -> &'static [(&'static str, TasteVector)] {
        match self {
            Self::Pairing => PAIRING_DELTAS,
            Self::RiceDetail => RICE_DETAIL_DELTAS,
            Self::DessertDetail => DESSERT_DETAIL_DELTAS,
            Self::SweetDry => SWEET_DRY_DELTAS,
            Self::Richness => RICHNESS_DELTAS,
            Self::Aroma => AROMA_DELTAS,
        }
    }

    /// The answer values this question recognizes, in display order.
    pub fn options(self) -> impl Iterator<Item = &'static str> {
        self.deltas().iter().map(|(value, _)| *value)
    }

    /// Delta applied for `answer`, or `None` for an unrecognized value.
    #[must_use]
    pub fn delta(self, answer: &str) -> Option<&'static TasteVector> {
        self.deltas()
            .iter()
            .find(|(value, _)| *value == answer)
            .map(|(_, delta)| delta)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Answers keyed by question identifier.
///
/// Keys are free-form: identifiers the mapper does not know are kept (the
/// tag-based fallback reads some of them) but contribute nothing to the
/// preference vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, String>);

impl AnswerSet {
    /// Creates an empty answer set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an answer, builder style.
    #[must_use]
    pub fn with(mut self, question: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(question, value);
        self
    }

    /// Records an answer, replacing any previous one for the question.
    pub fn insert(&mut self, question: impl Into<String>, value: impl Into<String>) {
        self.0.insert(question.into(), value.into());
    }

    /// Removes an answer.
    pub fn remove(&mut self, question: &str) -> Option<String> {
        self.0.remove(question)
    }

    /// Answer to a recognized question. Empty answers count as unanswered.
    #[must_use]
    pub fn get(&self, question: Question) -> Option<&str> {
        self.get_raw(question.id())
    }

    /// Answer by raw question identifier. Empty answers count as unanswered.
    #[must_use]
    pub fn get_raw(&self, question: &str) -> Option<&str> {
        self.0
            .get(question)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Number of recorded answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing has been answered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(question, answer)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }

    /// Parses a `question=value` pair, e.g. from a command line.
    #[must_use]
    pub fn parse_pair(pair: &str) -> Option<(String, String)> {
        let (question, value) = pair.split_once('=')?;
        let question = question.trim();
        if question.is_empty() {
            return None;
        }
        Some((question.to_string(), value.trim().to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Adds `delta` to `vector` and clamps every component into `[0, 1]`.
#[must_use]
pub fn apply_delta(vector: &TasteVector, delta: &TasteVector) -> TasteVector {
    let mut out = *vector;
    for i in 0..DIMENSION {
        out[i] = (out[i] + delta[i]).clamp(0.0, 1.0);
    }
    out
}

/// Applies a single answer. Unrecognized answers return the vector unchanged.
#[must_use]
pub fn apply_answer(vector: &TasteVector, question: Question, answer: &str) -> TasteVector {
    match question.delta(answer) {
        Some(delta) => apply_delta(vector, delta),
        None => *vector,
    }
}

/// Builds a preference vector from a set of answers.
///
/// Starts from the neutral vector and applies every answered, recognized
/// question in [`Question::ALL`] order, clamping after each step.
#[must_use]
pub fn preference_from_answers(answers: &AnswerSet) -> TasteVector {
    Question::ALL
        .into_iter()
        .fold(NEUTRAL, |vector, question| match answers.get(question) {
            Some(answer) => apply_answer(&vector, question, answer),
            None => vector,
        })
}
