//! Catalog sources and an explicit snapshot cache.
//!
//! A [`CatalogCache`] keeps at most two snapshots: a light one (no flavor
//! charts) and a full one. A full snapshot also answers light requests.
//! The cache is owned by the caller and emptied with [`CatalogCache::clear`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::catalog::{
    parse_areas, parse_brand_flavor_tags, parse_brands, parse_breweries, parse_flavor_tags,
    CatalogSnapshot,
};
use crate::error::{Error, Result};

/// A catalog resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Brand records.
    Brands,
    /// Flavor tag names.
    FlavorTags,
    /// Flavor tags per brand.
    BrandFlavorTags,
    /// Breweries.
    Breweries,
    /// Areas.
    Areas,
    /// Six-axis flavor charts.
    FlavorCharts,
}

impl Resource {
    /// Resources of a light snapshot.
    pub const LIGHT: [Resource; 5] = [
        Resource::Brands,
        Resource::FlavorTags,
        Resource::BrandFlavorTags,
        Resource::Breweries,
        Resource::Areas,
    ];

    /// Resource name as used in paths.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Brands => "brands",
            Self::FlavorTags => "flavor-tags",
            Self::BrandFlavorTags => "brand-flavor-tags",
            Self::Breweries => "breweries",
            Self::Areas => "areas",
            Self::FlavorCharts => "flavor-charts",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where raw catalog payloads come from.
pub trait CatalogSource: Send + Sync {
    /// Fetches the raw JSON payload of one resource.
    fn fetch(&self, resource: Resource) -> Result<Value>;
}

impl<S: CatalogSource + ?Sized> CatalogSource for Arc<S> {
    fn fetch(&self, resource: Resource) -> Result<Value> {
        (**self).fetch(resource)
    }
}

/// Reads `<dir>/<resource>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Creates a source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a resource file.
    #[must_use]
    pub fn path_of(&self, resource: Resource) -> PathBuf {
        self.dir.join(format!("{}.json", resource.name()))
    }
}

impl CatalogSource for DirectorySource {
    fn fetch(&self, resource: Resource) -> Result<Value> {
        let path = self.path_of(resource);
        let bytes = fs::read(&path)
            .map_err(|e| Error::catalog(resource.name(), format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::catalog(resource.name(), format!("{}: {e}", path.display())))
    }
}

#[derive(Default)]
struct Slots {
    light: Option<Arc<CatalogSnapshot>>,
    full: Option<Arc<CatalogSnapshot>>,
}

/// Caches catalog snapshots fetched from a [`CatalogSource`].
pub struct CatalogCache<S> {
    source: S,
    slots: Mutex<Slots>,
}

impl<S: CatalogSource> CatalogCache<S> {
    /// Creates an empty cache over `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: Mutex::new(Slots::default()),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns a snapshot, fetching it on first use.
    ///
    /// Concurrent callers wait for a single fetch. Failed fetches are not
    /// cached; the next call tries again.
    pub fn load(&self, include_flavor_charts: bool) -> Result<Arc<CatalogSnapshot>> {
        let mut slots = self.slots.lock();

        if let Some(full) = &slots.full {
            return Ok(Arc::clone(full));
        }
        if !include_flavor_charts {
            if let Some(light) = &slots.light {
                return Ok(Arc::clone(light));
            }
        }

        let snapshot = match self.fetch_snapshot(include_flavor_charts) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, include_flavor_charts, "catalog fetch failed");
                return Err(err);
            }
        };

        if include_flavor_charts {
            slots.full = Some(Arc::clone(&snapshot));
        }
        slots.light = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drops every cached snapshot.
    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        slots.light = None;
        slots.full = None;
        tracing::debug!("catalog cache cleared");
    }

    /// Returns `true` when a snapshot of the requested kind is cached.
    pub fn is_cached(&self, include_flavor_charts: bool) -> bool {
        let slots = self.slots.lock();
        slots.full.is_some() || (!include_flavor_charts && slots.light.is_some())
    }

    fn fetch_snapshot(&self, include_flavor_charts: bool) -> Result<CatalogSnapshot> {
        let brands = self.source.fetch(Resource::Brands)?;
        let tags = self.source.fetch(Resource::FlavorTags)?;
        let brand_flavor_tags = self.source.fetch(Resource::BrandFlavorTags)?;
        let breweries = self.source.fetch(Resource::Breweries)?;
        let areas = self.source.fetch(Resource::Areas)?;
        let flavor_charts = if include_flavor_charts {
            Some(self.source.fetch(Resource::FlavorCharts)?)
        } else {
            None
        };

        let snapshot = CatalogSnapshot {
            brands: parse_brands(&brands),
            tags: parse_flavor_tags(&tags),
            brand_flavor_tags: parse_brand_flavor_tags(&brand_flavor_tags),
            breweries: parse_breweries(&breweries),
            areas: parse_areas(&areas),
            flavor_charts,
        };
        tracing::debug!(
            brands = snapshot.brands.len(),
            tags = snapshot.tags.len(),
            include_flavor_charts,
            "catalog snapshot fetched"
        );
        Ok(snapshot)
    }
}

impl<S> fmt::Debug for CatalogCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("CatalogCache")
            .field("light", &slots.light.is_some())
            .field("full", &slots.full.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        payloads: HashMap<&'static str, Value>,
        fetches: AtomicUsize,
    }

    impl CountingSource {
        fn sample() -> Self {
            let mut payloads = HashMap::new();
            payloads.insert("brands", json!({"brands": [{"id": 1, "name": "而今"}]}));
            payloads.insert("flavor-tags", json!({"tags": [{"id": 3, "tag": "華やか"}]}));
            payloads.insert(
                "brand-flavor-tags",
                json!({"flavorTags": [{"brandId": 1, "tagIds": [3]}]}),
            );
            payloads.insert("breweries", json!({"breweries": []}));
            payloads.insert("areas", json!({"areas": [{"id": 1, "name": "三重県"}]}));
            payloads.insert(
                "flavor-charts",
                json!({"flavorCharts": [{"brandId": 1, "f1": 0.4, "f2": 0.4, "f3": 0.4, "f4": 0.4, "f5": 0.4, "f6": 0.4}]}),
            );
            Self {
                payloads,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl CatalogSource for CountingSource {
        fn fetch(&self, resource: Resource) -> Result<Value> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.payloads
                .get(resource.name())
                .cloned()
                .ok_or_else(|| Error::catalog(resource.name(), "missing"))
        }
    }

    #[test]
    fn test_light_load_is_cached() {
        let cache = CatalogCache::new(CountingSource::sample());
        let first = cache.load(false).unwrap();
        assert!(!first.has_flavor_charts());
        assert_eq!(first.brands.len(), 1);
        assert_eq!(cache.source().fetches(), 5);

        let second = cache.load(false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.source().fetches(), 5);
    }

    #[test]
    fn test_light_does_not_satisfy_full() {
        let cache = CatalogCache::new(CountingSource::sample());
        cache.load(false).unwrap();
        assert!(!cache.is_cached(true));
        let full = cache.load(true).unwrap();
        assert!(full.has_flavor_charts());
        assert_eq!(cache.source().fetches(), 11);
    }

    #[test]
    fn test_full_satisfies_light() {
        let cache = CatalogCache::new(CountingSource::sample());
        let full = cache.load(true).unwrap();
        let light = cache.load(false).unwrap();
        assert!(Arc::ptr_eq(&full, &light));
        assert_eq!(cache.source().fetches(), 6);
    }

    #[test]
    fn test_clear_forces_refetch() {
        let cache = CatalogCache::new(CountingSource::sample());
        cache.load(true).unwrap();
        cache.clear();
        assert!(!cache.is_cached(false));
        cache.load(false).unwrap();
        assert_eq!(cache.source().fetches(), 11);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut source = CountingSource::sample();
        source.payloads.remove("flavor-charts");
        let cache = CatalogCache::new(source);
        let err = cache.load(true).unwrap_err();
        assert!(err.to_string().contains("flavor-charts"));
        assert!(!cache.is_cached(false));
        assert!(cache.load(true).is_err());
        assert_eq!(cache.source().fetches(), 12);
    }

    #[test]
    fn test_directory_source_reads_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("brands.json"), r#"[{"id": 7, "name": "十四代"}]"#).unwrap();
        let source = DirectorySource::new(dir.path());
        let raw = source.fetch(Resource::Brands).unwrap();
        assert_eq!(parse_brands(&raw)[0].id, "7");

        let err = source.fetch(Resource::Areas).unwrap_err();
        assert!(matches!(err, Error::Catalog { ref resource, .. } if resource == "areas"));
    }

    #[test]
    fn test_directory_source_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("areas.json"), "not json").unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(source.fetch(Resource::Areas).is_err());
    }
}
