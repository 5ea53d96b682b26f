//! Write-through progress tracker
//!
//! [`ProgressTracker`] owns the session's [`ProgressState`] and mirrors every
//! mutation into a [`ProgressStorage`]. Storage is best-effort: a failed read
//! falls back to defaults, a failed write is logged and reported as
//! [`Persisted::Failed`], and the in-memory state keeps working either way.
use serde::{Deserialize, Serialize};

use crate::completion::CompletionRecord;
use crate::data::{Region, Step, load_catalog_or_empty};
use crate::state::{ProgressState, RegionSummary};
use crate::storage::{COMPLETED_STEPS_KEY, SELECTED_REGION_KEY};
use crate::{CatalogLoader, ProgressStorage};

/// Region selected when nothing usable has been saved.
pub const DEFAULT_REGION_ID: &str = "west-limgrave";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub default_region_id: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_region_id: DEFAULT_REGION_ID.to_string(),
        }
    }
}

/// What happened to the durable copy of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persisted {
    /// Every write the operation needed went through.
    Saved,
    /// Nothing needed writing (lookup miss or the change was already stored).
    Skipped,
    /// At least one write failed; the change lives in memory only.
    Failed,
}

impl Persisted {
    const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Failed, _) | (_, Self::Failed) => Self::Failed,
            (Self::Saved, _) | (_, Self::Saved) => Self::Saved,
            _ => Self::Skipped,
        }
    }
}

pub struct ProgressTracker<L, S>
where
    L: CatalogLoader,
    S: ProgressStorage,
{
    loader: L,
    storage: S,
    config: TrackerConfig,
    state: ProgressState,
    completed: CompletionRecord,
}

impl<L, S> ProgressTracker<L, S>
where
    L: CatalogLoader,
    S: ProgressStorage,
{
    /// Load the catalog, overlay persisted completion and restore the last
    /// selected region. Never fails: every missing or unreadable input falls
    /// back to a default.
    ///
    /// When the completion record cannot be read, the session starts with an
    /// empty one, and the first saved completion replaces whatever the
    /// unreadable record held.
    pub fn open(loader: L, storage: S, config: TrackerConfig) -> Self {
        let catalog = load_catalog_or_empty(&loader);
        let mut tracker = Self {
            loader,
            storage,
            state: ProgressState::new(catalog, config.default_region_id.clone()),
            config,
            completed: CompletionRecord::new(),
        };
        if let Some(record) = tracker.read_completion() {
            tracker.completed = record;
        }
        tracker.state.apply_completion(&tracker.completed);
        tracker.restore_selection();
        tracker
    }

    fn restore_selection(&mut self) {
        let mut candidates: Vec<String> = self.read_selected_region().into_iter().collect();
        candidates.push(self.config.default_region_id.clone());
        candidates.extend(self.state.regions.first().map(|r| r.id.clone()));
        for region_id in candidates {
            if self.state.select_region(&region_id) {
                return;
            }
            log::debug!("Region {region_id} is not in the catalog, trying the next fallback");
        }
    }

    fn read_selected_region(&self) -> Option<String> {
        match self.storage.get(SELECTED_REGION_KEY) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read {SELECTED_REGION_KEY}: {e}");
                None
            }
        }
    }

    /// `None` means storage could not be read at all.
    fn read_completion(&self) -> Option<CompletionRecord> {
        match self.storage.get(COMPLETED_STEPS_KEY) {
            Ok(Some(json)) => Some(CompletionRecord::from_json_lossy(&json)),
            Ok(None) => Some(CompletionRecord::new()),
            Err(e) => {
                log::warn!("Failed to read {COMPLETED_STEPS_KEY}: {e}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Persisted {
        match self.storage.set(key, value) {
            Ok(()) => Persisted::Saved,
            Err(e) => {
                log::warn!("Failed to save {key}, change kept for this session only: {e}");
                Persisted::Failed
            }
        }
    }

    fn remove(&self, key: &str) -> Persisted {
        match self.storage.remove(key) {
            Ok(()) => Persisted::Saved,
            Err(e) => {
                log::warn!("Failed to remove {key}: {e}");
                Persisted::Failed
            }
        }
    }

    fn write_completion(&self) -> Persisted {
        match self.completed.to_json() {
            Ok(json) => self.write(COMPLETED_STEPS_KEY, &json),
            Err(e) => {
                log::warn!("Failed to encode completion record: {e}");
                Persisted::Failed
            }
        }
    }

    /// Reload the catalog and overlay the persisted completion record.
    /// Does not write anything.
    pub fn load_regions(&mut self) {
        let catalog = load_catalog_or_empty(&self.loader);
        if let Some(record) = self.read_completion() {
            self.completed = record;
        }
        self.state.replace_regions(catalog, &self.completed);
    }

    /// Switch to `region_id` and persist the selection. Unknown ids are ignored.
    pub fn select_region(&mut self, region_id: &str) -> Persisted {
        if !self.state.select_region(region_id) {
            log::debug!("Ignoring selection of unknown region {region_id}");
            return Persisted::Skipped;
        }
        self.write(SELECTED_REGION_KEY, region_id)
    }

    /// Complete `step_id` in the current region and record it durably.
    pub fn complete_step(&mut self, step_id: u32) -> Persisted {
        let Some(done) = self.state.complete_step(step_id) else {
            log::debug!(
                "Ignoring completion of step {step_id}: not found in region {}",
                self.state.current_region_id
            );
            return Persisted::Skipped;
        };
        if !self.completed.insert(&done.region_id, done.step_id) {
            return Persisted::Skipped;
        }
        self.write_completion()
    }

    /// Forget every completion, in memory and in storage.
    pub fn reset_progress(&mut self) -> Persisted {
        self.state.reset();
        self.completed.clear();
        self.write_completion()
    }

    /// Remove every persisted key, then reset progress.
    pub fn clear_storage(&mut self) -> Persisted {
        let removed = self
            .remove(SELECTED_REGION_KEY)
            .and(self.remove(COMPLETED_STEPS_KEY));
        self.state.reset();
        self.completed.clear();
        removed
    }

    pub fn switch_to_next_region(&mut self) -> Persisted {
        match self.state.next_region().map(|r| r.id.clone()) {
            Some(id) => self.select_region(&id),
            None => Persisted::Skipped,
        }
    }

    pub fn switch_to_previous_region(&mut self) -> Persisted {
        match self.state.previous_region().map(|r| r.id.clone()) {
            Some(id) => self.select_region(&id),
            None => Persisted::Skipped,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ProgressState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The session's view of the persisted completion set.
    #[must_use]
    pub const fn completion_record(&self) -> &CompletionRecord {
        &self.completed
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.state.regions
    }

    #[must_use]
    pub fn current_region(&self) -> Option<&Region> {
        self.state.current_region()
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.state.current_step()
    }

    #[must_use]
    pub fn next_step(&self) -> Option<&Step> {
        self.state.next_step()
    }

    #[must_use]
    pub fn next_region(&self) -> Option<&Region> {
        self.state.next_region()
    }

    #[must_use]
    pub fn previous_region(&self) -> Option<&Region> {
        self.state.previous_region()
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    #[must_use]
    pub fn overview(&self) -> Vec<RegionSummary> {
        self.state.overview()
    }

    /// Hand back the storage, e.g. to reopen a tracker over the same data.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }
}
