//! Catalog sources selectable from the command line
use std::path::PathBuf;

use waystone_game::{BundledCatalog, CatalogError, CatalogLoader, RegionCatalog};

#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// Regions compiled into the binary
    Bundled,
    /// Regions read from a JSON file on every load
    File(PathBuf),
}

impl CatalogSource {
    #[must_use]
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Bundled, Self::File)
    }
}

impl CatalogLoader for CatalogSource {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<RegionCatalog, Self::Error> {
        match self {
            Self::Bundled => BundledCatalog.load_catalog(),
            Self::File(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    CatalogError::Unavailable(format!("{}: {e}", path.display()))
                })?;
                Ok(RegionCatalog::from_json(&json)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_unavailable() {
        let source = CatalogSource::from_arg(Some(PathBuf::from("/nonexistent/regions.json")));
        assert!(matches!(
            source.load_catalog(),
            Err(CatalogError::Unavailable(_))
        ));
    }

    #[test]
    fn no_path_uses_bundled_regions() {
        let catalog = CatalogSource::from_arg(None).load_catalog().unwrap();
        assert!(catalog.get_by_id("west-limgrave").is_some());
    }
}
