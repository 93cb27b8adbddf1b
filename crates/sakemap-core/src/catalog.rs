//! Shape-tolerant ingestion of catalog resources.
//!
//! The upstream data provider has changed its response shapes over time:
//! some endpoints return a bare list, others wrap the list in an object
//! under a resource key, and a few nest it one level deeper. Everything in
//! this module turns such payloads into typed records without failing; a
//! payload that cannot be resolved yields an empty list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names accepted for a record identifier, in priority order.
pub const ID_FIELDS: &[&str] = &["brandId", "brand_id", "id"];

/// Field names accepted for a brand identifier on brand records.
const BRAND_ID_FIELDS: &[&str] = &["id", "brandId", "brand_id"];

/// Field names accepted for the tag-id list of a brand/flavor-tag record.
const TAG_ID_FIELDS: &[&str] = &["tagIds", "flavorTagIds", "flavor_tags"];

/// Resolves a raw payload to the list of records it carries.
///
/// Resolution order:
/// 1. The first of `keys` present (and non-null) on `raw` replaces it.
/// 2. An array is returned as is.
/// 3. For an object, the first array-valued member is returned.
/// 4. An object carrying a `brandId` is treated as a single record.
///
/// Anything else resolves to an empty list.
#[must_use]
pub fn resolve_list<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    let base = keys
        .iter()
        .find_map(|key| raw.get(*key).filter(|v| !v.is_null()))
        .unwrap_or(raw);

    match base {
        Value::Array(items) => items,
        Value::Object(map) => {
            if let Some(items) = map.values().find_map(Value::as_array) {
                items
            } else if map.get("brandId").is_some_and(|v| !v.is_null()) {
                std::slice::from_ref(base)
            } else {
                &[]
            }
        }
        _ => &[],
    }
}

/// Returns the first non-null field among `names`.
pub(crate) fn first_field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| record.get(*name).filter(|v| !v.is_null()))
}

/// Renders an identifier value as a string.
///
/// Integral numbers render without a fractional part so that `42` and
/// `42.0` correlate. Strings are taken verbatim; other JSON types are not
/// identifiers.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    None
                } else if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    // Reason: integral and well inside i64's exact range.
                    #[allow(clippy::cast_possible_truncation)]
                    Some((f as i64).to_string())
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}

/// Reads a non-negative integer from a number or a numeric string.
pub(crate) fn integer_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            let f = n.as_f64()?;
            // Reason: checked integral, non-negative and below 2^53.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < 9.0e15).then_some(f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A sake brand from the catalog.
///
/// Only `id` is interpreted by the engine; the remaining fields are carried
/// through to the consumer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    /// Brand identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Brewery identifier, when known.
    #[serde(rename = "breweryId", default, skip_serializing_if = "Option::is_none")]
    pub brewery_id: Option<String>,
    /// Any other fields of the source record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Brand {
    /// Creates a brand with just an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brewery_id: None,
            extra: Map::new(),
        }
    }

    /// Sets the brewery id.
    #[must_use]
    pub fn with_brewery(mut self, brewery_id: impl Into<String>) -> Self {
        self.brewery_id = Some(brewery_id.into());
        self
    }

    /// Builds a brand from a raw record; `None` when it has no usable id.
    #[must_use]
    pub fn from_value(record: &Value) -> Option<Self> {
        let object = record.as_object()?;
        let id = first_field(record, BRAND_ID_FIELDS).and_then(id_string)?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let brewery_id = first_field(record, &["breweryId", "brewery_id"]).and_then(id_string);

        let extra = object
            .iter()
            .filter(|(key, _)| {
                !BRAND_ID_FIELDS.contains(&key.as_str())
                    && !matches!(key.as_str(), "name" | "breweryId" | "brewery_id")
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            id,
            name,
            brewery_id,
            extra,
        })
    }
}

/// A flavor tag (e.g. "フルーティ").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorTag {
    /// Tag identifier.
    pub id: u64,
    /// Tag name.
    pub tag: String,
}

/// The flavor tags attached to one brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandFlavorTags {
    /// Brand identifier.
    #[serde(rename = "brandId")]
    pub brand_id: String,
    /// Tag identifiers.
    #[serde(rename = "tagIds")]
    pub tag_ids: Vec<u64>,
}

impl BrandFlavorTags {
    fn from_value(record: &Value) -> Option<Self> {
        let object = record.as_object()?;
        let brand_id = first_field(record, ID_FIELDS).and_then(id_string)?;
        let list = first_field(record, TAG_ID_FIELDS)
            .or_else(|| object.values().find(|v| v.is_array()));
        let tag_ids = list
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(integer_value).collect())
            .unwrap_or_default();
        Some(Self { brand_id, tag_ids })
    }
}

/// A brewery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brewery {
    /// Brewery identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Area identifier, when known.
    #[serde(rename = "areaId", default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
}

/// A prefecture-level area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Area identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

fn id_and_name(record: &Value) -> Option<(String, String)> {
    let id = record.get("id").and_then(id_string)?;
    let name = record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((id, name))
}

fn parse_records<T>(raw: &Value, keys: &[&str], parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    let records = resolve_list(raw, keys);
    let parsed: Vec<T> = records.iter().filter_map(parse).collect();
    if parsed.len() < records.len() {
        tracing::debug!(
            resource = keys.first().copied().unwrap_or_default(),
            kept = parsed.len(),
            dropped = records.len() - parsed.len(),
            "dropped unusable catalog records"
        );
    }
    parsed
}

/// Parses the brands payload.
#[must_use]
pub fn parse_brands(raw: &Value) -> Vec<Brand> {
    parse_records(raw, &["brands"], Brand::from_value)
}

/// Parses the flavor-tags payload.
#[must_use]
pub fn parse_flavor_tags(raw: &Value) -> Vec<FlavorTag> {
    parse_records(raw, &["tags"], |record| {
        let id = record.get("id").and_then(integer_value)?;
        let tag = record.get("tag").and_then(Value::as_str)?.to_string();
        Some(FlavorTag { id, tag })
    })
}

/// Parses the breweries payload.
#[must_use]
pub fn parse_breweries(raw: &Value) -> Vec<Brewery> {
    parse_records(raw, &["breweries"], |record| {
        let (id, name) = id_and_name(record)?;
        let area_id = first_field(record, &["areaId", "area_id"]).and_then(id_string);
        Some(Brewery { id, name, area_id })
    })
}

/// Parses the areas payload.
#[must_use]
pub fn parse_areas(raw: &Value) -> Vec<Area> {
    parse_records(raw, &["areas"], |record| {
        let (id, name) = id_and_name(record)?;
        Some(Area { id, name })
    })
}

/// Parses the brand/flavor-tag payload.
///
/// Besides the list shapes handled by [`resolve_list`] (also nested one
/// level deeper), this accepts a map from brand id to tag-id list, e.g.
/// `{"12": [1, 4], "15": [2]}`.
#[must_use]
pub fn parse_brand_flavor_tags(raw: &Value) -> Vec<BrandFlavorTags> {
    let base = first_field(raw, &["brandFlavorTags"]).unwrap_or(raw);

    if let Some(map) = base.as_object() {
        if !map.is_empty() && map.keys().all(|key| key.trim().parse::<u64>().is_ok()) {
            return map
                .iter()
                .map(|(brand_id, tag_ids)| BrandFlavorTags {
                    brand_id: brand_id.trim().to_string(),
                    tag_ids: tag_ids
                        .as_array()
                        .map(|ids| ids.iter().filter_map(integer_value).collect())
                        .unwrap_or_default(),
                })
                .collect();
        }

        if map.get("brandId").is_some_and(|v| !v.is_null()) {
            return BrandFlavorTags::from_value(base).into_iter().collect();
        }

        if !map.values().any(Value::is_array) {
            let nested = map.values().find_map(|v| {
                v.as_object()
                    .and_then(|inner| inner.values().find(|vv| vv.is_array()))
            });
            if let Some(nested) = nested {
                return parse_records(nested, &[], BrandFlavorTags::from_value);
            }
        }
    }

    parse_records(base, &[], BrandFlavorTags::from_value)
}

/// Everything the engine and its fallback need from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Brands.
    pub brands: Vec<Brand>,
    /// Flavor tag names.
    pub tags: Vec<FlavorTag>,
    /// Flavor tags per brand.
    pub brand_flavor_tags: Vec<BrandFlavorTags>,
    /// Breweries.
    pub breweries: Vec<Brewery>,
    /// Areas.
    pub areas: Vec<Area>,
    /// Raw flavor-chart payload, absent for light snapshots.
    pub flavor_charts: Option<Value>,
}

impl CatalogSnapshot {
    /// Returns `true` when the snapshot carries flavor charts.
    #[must_use]
    pub fn has_flavor_charts(&self) -> bool {
        self.flavor_charts.is_some()
    }

    /// Looks up a brewery name by id.
    #[must_use]
    pub fn brewery_name(&self, brewery_id: &str) -> Option<&str> {
        self.breweries
            .iter()
            .find(|b| b.id == brewery_id)
            .map(|b| b.name.as_str())
    }
}
