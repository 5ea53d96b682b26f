//! Waystone Progression Engine
//!
//! Platform-agnostic tracking of a player's progress through ordered regions of
//! ordered steps. This crate provides the catalog model, the progress rules and
//! write-through persistence without UI or platform-specific dependencies.

pub mod completion;
pub mod data;
pub mod state;
pub mod storage;
pub mod tracker;

// Re-export commonly used types
pub use completion::{CompletionRecord, step_key};
pub use data::{
    BundledCatalog, CatalogError, JsonCatalog, Region, RegionCatalog, Step, load_catalog_or_empty,
};
pub use state::{CompletedStep, DEFAULT_STEP_ID, ProgressState, RegionSummary};
pub use storage::{COMPLETED_STEPS_KEY, MemoryStorage, SELECTED_REGION_KEY};
pub use tracker::{DEFAULT_REGION_ID, Persisted, ProgressTracker, TrackerConfig};

/// Trait for abstracting region catalog loading
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the ordered region definitions, with every step incomplete
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog source is missing or malformed.
    fn load_catalog(&self) -> Result<RegionCatalog, Self::Error>;
}

/// Trait for abstracting key-value persistence
/// Platform-specific implementations should provide this
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written (quota, storage disabled).
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete `key`; deleting a missing key succeeds
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be modified.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}
