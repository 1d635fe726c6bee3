use std::collections::BTreeMap;

use super::{KeyValueStore, PrefValue};

/// In-memory preferences (tests, and fallback when no durable backend opens)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, PrefValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, PrefValue>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &BTreeMap<String, PrefValue> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str) -> Option<i32> {
        match self.entries.get(key) {
            Some(PrefValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.entries.insert(key.to_string(), PrefValue::Int(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(PrefValue::Text(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), PrefValue::Text(value.to_string()));
    }

    fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn delete_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::keys;

    #[test]
    fn test_type_mismatch_reads_as_missing() {
        let mut store = MemoryStore::new();
        store.set_string(keys::LEVEL, "three");
        assert_eq!(store.get_int(keys::LEVEL), None);
        assert!(store.has_key(keys::LEVEL));
        assert_eq!(store.get_int_or(keys::LEVEL, 1), 1);
    }

    #[test]
    fn test_delete_all() {
        let mut store = MemoryStore::new();
        store.set_int(keys::LEVEL, 4);
        store.set_string(keys::CURRENT_OBSTACLES, "0,1,2,3");
        store.delete_all();
        assert!(store.is_empty());
        assert!(!store.has_key(keys::LEVEL));
    }
}
