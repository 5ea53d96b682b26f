//! Static region definitions and the loaders that provide them
use serde::{Deserialize, Serialize};

use crate::CatalogLoader;

const BUNDLED_REGIONS: &str = include_str!("../data/regions.json");

/// A single completable step within a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Never read from catalog data; overlaid from the persisted completion record.
    #[serde(default, skip_deserializing)]
    pub completed: bool,
}

impl Step {
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            completed: false,
        }
    }
}

/// An ordered collection of steps. Sequence order, not id order, drives navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Region {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            steps,
        }
    }

    #[must_use]
    pub fn step(&self, step_id: u32) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    #[must_use]
    pub fn step_index(&self, step_id: u32) -> Option<usize> {
        self.steps.iter().position(|step| step.id == step_id)
    }

    #[must_use]
    pub fn first_step(&self) -> Option<&Step> {
        self.steps.first()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|step| step.completed).count()
    }
}

/// Container for all region definitions, in catalog order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegionCatalog {
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl RegionCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    #[must_use]
    pub const fn from_regions(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Parse a catalog from its JSON form.
    ///
    /// Completion flags in the input are ignored; every step starts incomplete.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the region definitions bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled data is malformed.
    pub fn load_from_static() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_REGIONS)
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.regions.iter().map(|r| r.steps.len()).sum()
    }

    #[must_use]
    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }
}

impl<'a> IntoIterator for &'a RegionCatalog {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog source unavailable: {0}")]
    Unavailable(String),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loader for the catalog embedded at compile time
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

impl CatalogLoader for BundledCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<RegionCatalog, Self::Error> {
        RegionCatalog::load_from_static().map_err(CatalogError::Json)
    }
}

/// Loader over an in-memory JSON document, for catalogs read from elsewhere
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    json: String,
}

impl JsonCatalog {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl CatalogLoader for JsonCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<RegionCatalog, Self::Error> {
        RegionCatalog::from_json(&self.json).map_err(CatalogError::Json)
    }
}

/// Run a loader, degrading to an empty catalog when it fails.
pub fn load_catalog_or_empty<L: CatalogLoader>(loader: &L) -> RegionCatalog {
    match loader.load_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            log::warn!("Failed to load region catalog, continuing with no regions: {e}");
            RegionCatalog::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "regions": [
                {
                    "id": "west-limgrave",
                    "name": "West Limgrave",
                    "steps": [
                        { "id": 1, "title": "Start", "completed": true },
                        { "id": 2, "title": "Church", "description": "Rest here" }
                    ]
                }
            ]
        }"#;

        let catalog = RegionCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        let region = catalog.get_by_id("west-limgrave").unwrap();
        assert_eq!(region.steps.len(), 2);
        assert!(!region.steps[0].completed, "static data never carries completion");
        assert_eq!(region.steps[1].description.as_deref(), Some("Rest here"));
        assert_eq!(region.step_index(2), Some(1));
    }

    #[test]
    fn bundled_catalog_is_well_formed() {
        let catalog = BundledCatalog.load_catalog().unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.regions[0].id, "west-limgrave");
        for region in &catalog {
            assert!(!region.steps.is_empty(), "{} has no steps", region.id);
            assert!(region.steps.iter().all(|s| !s.completed));
        }
    }

    #[test]
    fn malformed_catalog_degrades_to_empty() {
        let loader = JsonCatalog::new("{ not json");
        assert!(loader.load_catalog().is_err());
        let catalog = load_catalog_or_empty(&loader);
        assert!(catalog.is_empty());
        assert_eq!(catalog.total_steps(), 0);
    }

    #[test]
    fn missing_fields_default() {
        let catalog = RegionCatalog::from_json(r#"{"regions":[{"id":"empty"}]}"#).unwrap();
        let region = catalog.get_by_id("empty").unwrap();
        assert!(region.name.is_empty());
        assert!(region.first_step().is_none());
        assert_eq!(region.completed_count(), 0);
    }
}
