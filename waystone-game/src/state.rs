//! Progress state and the rules that move it
//!
//! Everything here is pure: no operation touches storage. The tracker layers
//! write-through persistence on top of these transitions.
use serde::{Deserialize, Serialize};

use crate::completion::CompletionRecord;
use crate::data::{Region, RegionCatalog, Step};

/// Step id used when no region is available to supply a first step.
pub const DEFAULT_STEP_ID: u32 = 1;

/// Per-region completion figures, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub id: String,
    pub name: String,
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

/// Result of a successful `complete_step` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedStep {
    pub region_id: String,
    pub step_id: u32,
    /// False when the step had already been completed earlier.
    pub newly_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub regions: Vec<Region>,
    pub current_region_id: String,
    pub current_step_id: u32,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            current_region_id: String::new(),
            current_step_id: DEFAULT_STEP_ID,
        }
    }
}

impl ProgressState {
    /// Build a state over `catalog` positioned at `current_region_id`.
    ///
    /// The region id is taken as-is; call [`Self::select_region`] to validate it
    /// and derive the current step.
    #[must_use]
    pub fn new(catalog: RegionCatalog, current_region_id: impl Into<String>) -> Self {
        Self {
            regions: catalog.into_regions(),
            current_region_id: current_region_id.into(),
            current_step_id: DEFAULT_STEP_ID,
        }
    }

    /// Overlay completion flags from the persisted record onto every step.
    pub fn apply_completion(&mut self, record: &CompletionRecord) {
        for region in &mut self.regions {
            for step in &mut region.steps {
                step.completed = record.contains(&region.id, step.id);
            }
        }
    }

    /// Swap in a fresh catalog, with completion taken from `record`.
    pub fn replace_regions(&mut self, catalog: RegionCatalog, record: &CompletionRecord) {
        self.regions = catalog.into_regions();
        self.apply_completion(record);
    }

    #[must_use]
    pub fn region(&self, region_id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == region_id)
    }

    fn region_index(&self, region_id: &str) -> Option<usize> {
        self.regions.iter().position(|r| r.id == region_id)
    }

    #[must_use]
    pub fn current_region(&self) -> Option<&Region> {
        self.region(&self.current_region_id)
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.current_region()?.step(self.current_step_id)
    }

    /// First incomplete step after the current one, by sequence position.
    #[must_use]
    pub fn next_step(&self) -> Option<&Step> {
        self.next_step_after(&self.current_region_id, self.current_step_id)
    }

    /// First incomplete step positioned after `step_id` in `region_id`.
    /// An unknown `step_id` scans the region from its start. Never wraps.
    #[must_use]
    pub fn next_step_after(&self, region_id: &str, step_id: u32) -> Option<&Step> {
        let region = self.region(region_id)?;
        let start = region.step_index(step_id).map_or(0, |idx| idx + 1);
        region.steps.iter().skip(start).find(|s| !s.completed)
    }

    /// Step to resume `region_id` at: the first incomplete one, or the first
    /// step when everything is done.
    #[must_use]
    pub fn resume_step(&self, region_id: &str) -> Option<&Step> {
        let region = self.region(region_id)?;
        region
            .steps
            .iter()
            .find(|s| !s.completed)
            .or_else(|| region.first_step())
    }

    #[must_use]
    pub fn next_region(&self) -> Option<&Region> {
        let idx = self.region_index(&self.current_region_id)?;
        self.regions.get(idx + 1)
    }

    #[must_use]
    pub fn previous_region(&self) -> Option<&Region> {
        let idx = self.region_index(&self.current_region_id)?;
        idx.checked_sub(1).and_then(|prev| self.regions.get(prev))
    }

    /// Completion percentage of the current region.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.region_progress(&self.current_region_id)
    }

    /// Completion percentage of `region_id`; 0 when unknown or empty.
    #[must_use]
    pub fn region_progress(&self, region_id: &str) -> f64 {
        self.region(region_id).map_or(0.0, percent_complete)
    }

    #[must_use]
    pub fn overview(&self) -> Vec<RegionSummary> {
        self.regions
            .iter()
            .map(|region| RegionSummary {
                id: region.id.clone(),
                name: region.name.clone(),
                completed: region.completed_count(),
                total: region.steps.len(),
                percent: percent_complete(region),
            })
            .collect()
    }

    /// Make `region_id` current and move to its resume step.
    /// Returns false, leaving state untouched, when the region is unknown.
    pub fn select_region(&mut self, region_id: &str) -> bool {
        if self.region(region_id).is_none() {
            return false;
        }
        // A region without steps has no resume step.
        self.current_step_id = self
            .resume_step(region_id)
            .map_or(DEFAULT_STEP_ID, |s| s.id);
        self.current_region_id = region_id.to_string();
        true
    }

    /// Mark `step_id` in the current region completed and advance to the next
    /// incomplete step after it. The current step is kept when none remains.
    pub fn complete_step(&mut self, step_id: u32) -> Option<CompletedStep> {
        let region_idx = self.region_index(&self.current_region_id)?;
        let region = &mut self.regions[region_idx];
        let step_idx = region.step_index(step_id)?;

        let newly_completed = !region.steps[step_idx].completed;
        region.steps[step_idx].completed = true;

        if let Some(next) = region.steps[step_idx + 1..].iter().find(|s| !s.completed) {
            self.current_step_id = next.id;
        }

        Some(CompletedStep {
            region_id: region.id.clone(),
            step_id,
            newly_completed,
        })
    }

    /// Clear every completion flag and return to the first step of the
    /// current region.
    pub fn reset(&mut self) {
        for step in self.regions.iter_mut().flat_map(|r| r.steps.iter_mut()) {
            step.completed = false;
        }
        self.current_step_id = self
            .current_region()
            .and_then(Region::first_step)
            .map_or(DEFAULT_STEP_ID, |s| s.id);
    }
}

fn percent_complete(region: &Region) -> f64 {
    let total = region.steps.len();
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = region.completed_count() as f64 / total as f64;
    ratio * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: &str, step_ids: &[u32]) -> Region {
        Region::new(
            id,
            id,
            step_ids
                .iter()
                .map(|&sid| Step::new(sid, format!("step {sid}")))
                .collect(),
        )
    }

    fn fixture() -> ProgressState {
        let catalog = RegionCatalog::from_regions(vec![
            region("west-limgrave", &[1, 2, 3]),
            region("weeping-peninsula", &[1, 2]),
            region("stormveil-castle", &[10, 20, 30]),
        ]);
        let mut state = ProgressState::new(catalog, "west-limgrave");
        assert!(state.select_region("west-limgrave"));
        state
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn completing_steps_advances_and_tracks_progress() {
        let mut state = fixture();
        state.complete_step(1).unwrap();
        assert!(state.current_region().unwrap().steps[0].completed);
        assert_eq!(state.current_step_id, 2);
        assert_close(state.progress(), 33.33);

        state.complete_step(2).unwrap();
        assert_eq!(state.current_step_id, 3);
        assert_close(state.progress(), 66.67);

        state.complete_step(3).unwrap();
        assert_eq!(state.current_step_id, 3);
        assert!(state.next_step().is_none());
        assert_close(state.progress(), 100.0);
    }

    #[test]
    fn completion_skips_already_completed_steps() {
        let mut state = fixture();
        state.complete_step(2).unwrap();
        // Step 2 done out of order; finishing step 1 jumps straight to 3.
        state.complete_step(1).unwrap();
        assert_eq!(state.current_step_id, 3);
    }

    #[test]
    fn completion_is_idempotent() {
        let mut state = fixture();
        let first = state.complete_step(1).unwrap();
        let snapshot = state.clone();
        let second = state.complete_step(1).unwrap();
        assert!(first.newly_completed);
        assert!(!second.newly_completed);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn unknown_step_is_a_no_op() {
        let mut state = fixture();
        let before = state.clone();
        assert!(state.complete_step(99).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn next_step_does_not_wrap() {
        let mut state = fixture();
        state.complete_step(1).unwrap();
        state.current_step_id = 3;
        assert!(state.next_step().is_none());
        state.current_step_id = 1;
        assert_eq!(state.next_step().map(|s| s.id), Some(2));
    }

    #[test]
    fn selecting_unknown_region_keeps_state() {
        let mut state = fixture();
        let before = state.clone();
        assert!(!state.select_region("non-existent"));
        assert_eq!(state, before);
    }

    #[test]
    fn selecting_region_moves_to_first_incomplete_step() {
        let mut state = fixture();
        assert!(state.select_region("stormveil-castle"));
        assert_eq!(state.current_step_id, 10);

        state.complete_step(10).unwrap();
        state.complete_step(20).unwrap();
        state.select_region("west-limgrave");
        state.select_region("stormveil-castle");
        assert_eq!(state.current_step_id, 30);

        state.complete_step(30).unwrap();
        state.select_region("west-limgrave");
        state.select_region("stormveil-castle");
        assert_eq!(state.current_step_id, 10, "fully done region restarts at its first step");
    }

    #[test]
    fn adjacent_regions_follow_catalog_order() {
        let mut state = fixture();
        assert!(state.previous_region().is_none());
        assert_eq!(state.next_region().unwrap().id, "weeping-peninsula");

        state.select_region("stormveil-castle");
        assert!(state.next_region().is_none());
        assert_eq!(state.previous_region().unwrap().id, "weeping-peninsula");
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = fixture();
        state.complete_step(1).unwrap();
        state.complete_step(2).unwrap();
        state.reset();
        assert_eq!(state.current_step_id, 1);
        for summary in state.overview() {
            assert_eq!(summary.completed, 0);
            assert_close(summary.percent, 0.0);
        }
    }

    #[test]
    fn progress_guards_empty_and_missing_regions() {
        let catalog = RegionCatalog::from_regions(vec![region("empty", &[])]);
        let mut state = ProgressState::new(catalog, "missing");
        assert_close(state.progress(), 0.0);
        assert!(state.current_region().is_none());
        assert!(state.current_step().is_none());

        assert!(state.select_region("empty"));
        assert_close(state.progress(), 0.0);
        assert_eq!(state.current_step_id, DEFAULT_STEP_ID);
        assert!(state.current_step().is_none());
    }

    #[test]
    fn completion_overlay_reflects_record() {
        let mut state = fixture();
        let mut record = CompletionRecord::new();
        record.insert("weeping-peninsula", 2);
        state.apply_completion(&record);
        let peninsula = state.region("weeping-peninsula").unwrap();
        assert!(!peninsula.steps[0].completed);
        assert!(peninsula.steps[1].completed);
        assert_close(state.region_progress("weeping-peninsula"), 50.0);
        assert_eq!(
            state.resume_step("weeping-peninsula").map(|s| s.id),
            Some(1)
        );
    }
}
