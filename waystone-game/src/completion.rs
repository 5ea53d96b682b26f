//! Persisted completion record: the durable set of `regionId-stepId` keys
use serde::{Deserialize, Serialize};

/// Composite key identifying a step across all regions.
#[must_use]
pub fn step_key(region_id: &str, step_id: u32) -> String {
    format!("{region_id}-{step_id}")
}

/// Insertion-ordered, duplicate-free set of completed step keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CompletionRecord(Vec<String>);

impl CompletionRecord {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn contains(&self, region_id: &str, step_id: u32) -> bool {
        let key = step_key(region_id, step_id);
        self.0.iter().any(|k| *k == key)
    }

    /// Record a completion. Returns false when the key was already present.
    pub fn insert(&mut self, region_id: &str, step_id: u32) -> bool {
        if self.contains(region_id, step_id) {
            return false;
        }
        self.0.push(step_key(region_id, step_id));
        true
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Encode as a JSON array of keys.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a stored record. Anything that is not a JSON array of strings
    /// is treated as no prior data.
    #[must_use]
    pub fn from_json_lossy(json: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(json) {
            Ok(keys) => {
                let mut record = Self::new();
                for key in keys {
                    if !record.0.contains(&key) {
                        record.0.push(key);
                    }
                }
                record
            }
            Err(e) => {
                log::warn!("Discarding unreadable completion record: {e}");
                Self::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_join_region_and_step() {
        assert_eq!(step_key("west-limgrave", 3), "west-limgrave-3");
    }

    #[test]
    fn insert_is_idempotent() {
        let mut record = CompletionRecord::new();
        assert!(record.insert("west-limgrave", 1));
        assert!(!record.insert("west-limgrave", 1));
        assert!(record.insert("liurnia", 1));
        assert_eq!(record.len(), 2);
        assert!(record.contains("liurnia", 1));
        assert!(!record.contains("liurnia", 2));
    }

    #[test]
    fn encodes_as_plain_array() {
        let mut record = CompletionRecord::new();
        record.insert("west-limgrave", 2);
        record.insert("west-limgrave", 1);
        assert_eq!(
            record.to_json().unwrap(),
            r#"["west-limgrave-2","west-limgrave-1"]"#
        );
    }

    #[test]
    fn unreadable_input_is_empty() {
        assert!(CompletionRecord::from_json_lossy("{oops").is_empty());
        assert!(CompletionRecord::from_json_lossy(r#"{"a":1}"#).is_empty());
        assert!(CompletionRecord::from_json_lossy("[1,2]").is_empty());
    }

    #[test]
    fn decoding_drops_duplicates() {
        let record = CompletionRecord::from_json_lossy(r#"["r-1","r-2","r-1"]"#);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["r-1", "r-2"]);
    }
}
