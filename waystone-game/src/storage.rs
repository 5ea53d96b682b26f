//! Key-value persistence used for durable progress
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use crate::ProgressStorage;

/// Key holding the id of the last selected region.
pub const SELECTED_REGION_KEY: &str = "selected-region";
/// Key holding the JSON-encoded completion record.
pub const COMPLETED_STEPS_KEY: &str = "completed_steps_by_region";

/// In-memory storage. Clones share the same map, so a second tracker opened
/// over a clone observes everything the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ProgressStorage for MemoryStorage {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set(SELECTED_REGION_KEY, "liurnia").unwrap();
        assert_eq!(
            other.get(SELECTED_REGION_KEY).unwrap().as_deref(),
            Some("liurnia")
        );
        other.remove(SELECTED_REGION_KEY).unwrap();
        assert!(storage.get(SELECTED_REGION_KEY).unwrap().is_none());
        assert!(storage.is_empty());
    }
}
