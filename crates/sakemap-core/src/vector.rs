//! Taste vectors built from flavor-chart records.
//!
//! Each brand's flavor chart carries six scalar axes. Records are read
//! through [`AttributeRecord::from_value`], the single adapter that knows
//! the accepted field names, then rescaled per axis to `[0, 1]` using the
//! min/max observed across the whole catalog.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{first_field, id_string, resolve_list, ID_FIELDS};

/// Number of taste axes. Item vectors, preferences and centroids all share it.
pub const DIMENSION: usize = 6;

/// A point in taste space.
pub type TasteVector = [f32; DIMENSION];

/// The midpoint of taste space.
pub const NEUTRAL: TasteVector = [0.5; DIMENSION];

/// Keys under which a flavor-chart payload may wrap its record list.
const FLAVOR_CHART_KEYS: &[&str] = &["flavorCharts", "flavor_charts"];

/// One axis of the flavor chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlavorAxis {
    /// 華やか
    Floral,
    /// 芳醇
    Mellow,
    /// 重厚
    Rich,
    /// 穏やか
    Mild,
    /// ドライ
    Dry,
    /// 軽快
    Light,
}

impl FlavorAxis {
    /// All axes in vector order.
    pub const ALL: [FlavorAxis; DIMENSION] = [
        Self::Floral,
        Self::Mellow,
        Self::Rich,
        Self::Mild,
        Self::Dry,
        Self::Light,
    ];

    /// Position of this axis in a [`TasteVector`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Floral => 0,
            Self::Mellow => 1,
            Self::Rich => 2,
            Self::Mild => 3,
            Self::Dry => 4,
            Self::Light => 5,
        }
    }

    /// Accepted record field names for this axis, in priority order.
    ///
    /// The provider's canonical `f1`..`f6` come first; the descriptive
    /// names appear in some mirrors of the data.
    #[must_use]
    pub const fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Floral => &["f1", "floral"],
            Self::Mellow => &["f2", "mellow"],
            Self::Rich => &["f3", "rich", "heavy"],
            Self::Mild => &["f4", "mild"],
            Self::Dry => &["f5", "dry"],
            Self::Light => &["f6", "light"],
        }
    }

    /// Short English label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Floral => "floral",
            Self::Mellow => "mellow",
            Self::Rich => "rich",
            Self::Mild => "mild",
            Self::Dry => "dry",
            Self::Light => "light",
        }
    }
}

/// Reads a finite number from a JSON number or a numeric string.
pub(crate) fn finite_number(value: &Value) -> Option<f32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    // Reason: clamped into f32 range first, so the cast cannot produce inf.
    #[allow(clippy::cast_possible_truncation)]
    let n = n.clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32;
    Some(n)
}

/// A usable flavor-chart record: an id plus all six raw axis values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Item identifier.
    pub id: String,
    /// Raw (unnormalized) axis values.
    pub values: TasteVector,
}

impl AttributeRecord {
    /// Extracts a record, or `None` when the id or any axis is missing or
    /// not a finite number. Partial vectors are never produced.
    #[must_use]
    pub fn from_value(record: &Value) -> Option<Self> {
        if !record.is_object() {
            return None;
        }
        let id = first_field(record, ID_FIELDS).and_then(id_string)?;

        let mut values = [0.0; DIMENSION];
        for axis in FlavorAxis::ALL {
            values[axis.index()] = first_field(record, axis.field_names()).and_then(finite_number)?;
        }

        Some(Self { id, values })
    }
}

/// Per-axis range observed across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorStats {
    /// Per-axis minimum.
    pub min: TasteVector,
    /// Per-axis maximum.
    pub max: TasteVector,
}

impl Default for VectorStats {
    fn default() -> Self {
        Self {
            min: [0.0; DIMENSION],
            max: [1.0; DIMENSION],
        }
    }
}

impl VectorStats {
    /// Computes the per-axis min/max of `vectors`, or the default range
    /// when there are none.
    #[must_use]
    pub fn from_vectors<'a>(vectors: impl IntoIterator<Item = &'a TasteVector>) -> Self {
        let mut min = [f32::INFINITY; DIMENSION];
        let mut max = [f32::NEG_INFINITY; DIMENSION];
        let mut seen = false;

        for vector in vectors {
            seen = true;
            for i in 0..DIMENSION {
                min[i] = min[i].min(vector[i]);
                max[i] = max[i].max(vector[i]);
            }
        }

        if seen {
            Self { min, max }
        } else {
            Self::default()
        }
    }

    /// Rescales a raw vector into `[0, 1]` per axis.
    ///
    /// A degenerate axis (`max == min`) maps to exactly 0.5. Values outside
    /// the observed range saturate at the bounds.
    #[must_use]
    // Reason: the ratio is clamped to [0, 1] before narrowing to f32.
    #[allow(clippy::cast_possible_truncation)]
    pub fn normalize(&self, raw: &TasteVector) -> TasteVector {
        let mut out = [0.0; DIMENSION];
        for i in 0..DIMENSION {
            // Computed in f64: the span of two f32 extremes can overflow f32.
            let min = f64::from(self.min[i]);
            let denom = f64::from(self.max[i]) - min;
            out[i] = if !denom.is_finite() || denom == 0.0 {
                0.5
            } else {
                ((f64::from(raw[i]) - min) / denom).clamp(0.0, 1.0) as f32
            };
        }
        out
    }
}

/// A catalog item in taste space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Item identifier.
    pub id: String,
    /// Normalized taste vector.
    pub vector: TasteVector,
}

impl Point {
    /// Creates a point.
    pub fn new(id: impl Into<String>, vector: TasteVector) -> Self {
        Self {
            id: id.into(),
            vector,
        }
    }
}

/// Output of [`build_vectors`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorSet {
    /// Range used for normalization.
    pub stats: VectorStats,
    /// Normalized points in first-seen id order.
    pub points: Vec<Point>,
    /// Normalized vector per item id.
    pub vector_by_id: HashMap<String, TasteVector>,
}

impl VectorSet {
    /// Builds the set from a raw flavor-chart payload of any accepted shape.
    #[must_use]
    pub fn from_flavor_charts(raw: &Value) -> Self {
        build_vectors(resolve_list(raw, FLAVOR_CHART_KEYS))
    }

    /// Returns `true` when no usable record was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Builds normalized taste vectors from raw flavor-chart records.
///
/// Malformed records are dropped. Every valid record contributes to the
/// min/max statistics; when an id repeats, its point keeps the position of
/// the first occurrence and the values of the last.
#[must_use]
pub fn build_vectors(records: &[Value]) -> VectorSet {
    let mut raw_vectors: Vec<TasteVector> = Vec::with_capacity(records.len());
    let mut by_id: IndexMap<String, TasteVector> = IndexMap::with_capacity(records.len());

    for record in records.iter().filter_map(AttributeRecord::from_value) {
        raw_vectors.push(record.values);
        by_id.insert(record.id, record.values);
    }

    let dropped = records.len() - raw_vectors.len();
    if dropped > 0 {
        tracing::debug!(
            kept = raw_vectors.len(),
            dropped,
            "dropped flavor-chart records with missing or non-finite values"
        );
    }

    if raw_vectors.is_empty() {
        return VectorSet::default();
    }

    let stats = VectorStats::from_vectors(&raw_vectors);
    let points: Vec<Point> = by_id
        .into_iter()
        .map(|(id, raw)| Point {
            id,
            vector: stats.normalize(&raw),
        })
        .collect();
    let vector_by_id = points
        .iter()
        .map(|p| (p.id.clone(), p.vector))
        .collect();

    VectorSet {
        stats,
        points,
        vector_by_id,
    }
}
