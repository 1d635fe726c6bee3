//! Persisted player preferences
//!
//! A small key-value store in the spirit of engine "player prefs": integers
//! and strings under well-known keys. Backends:
//! - `MemoryStore`: in-process, used by tests and as a fallback
//! - `FileStore`: versioned JSON envelope on disk (native)
//! - `LocalStorageStore`: browser LocalStorage (wasm)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageStore;

/// Well-known preference keys
pub mod keys {
    /// Level the player is on
    pub const LEVEL: &str = "Level";
    /// Level whose colors/obstacles were last generated
    pub const SAVED_LEVEL: &str = "SavedLevel";
    /// Best session total
    pub const HIGH_SCORE: &str = "HighScore";
    /// Best single-attempt streak
    pub const HIGHEST_CONSECUTIVE: &str = "HighestConsecutiveCurrentScore";
    /// Comma-separated archetype indices for the current level
    pub const CURRENT_OBSTACLES: &str = "CurrentObstacles";
    pub const PLATE_COLOR: &str = "PlayerPlateMaterialColor";
    pub const BASE_COLOR: &str = "PlayerBaseMaterialColor";
    /// JSON-encoded `Settings`
    pub const SETTINGS: &str = "Settings";
}

/// Errors at the storage boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("preferences are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported preferences version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("browser storage unavailable: {0}")]
    Unavailable(String),
}

/// A stored preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Int(i32),
    Text(String),
}

/// Preference storage used by the score tracker, level generator and settings
///
/// Reads of a key holding the other value type behave like a missing key.
pub trait KeyValueStore {
    fn get_int(&self, key: &str) -> Option<i32>;
    fn set_int(&mut self, key: &str, value: i32);
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&mut self, key: &str, value: &str);
    fn has_key(&self, key: &str) -> bool;
    /// Remove every preference
    fn delete_all(&mut self);

    /// Make pending writes durable
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn get_int_or(&self, key: &str, default: i32) -> i32 {
        self.get_int(key).unwrap_or(default)
    }

    /// Non-negative counter stored as an int
    fn get_count(&self, key: &str) -> u32 {
        self.get_int(key)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    }

    fn set_count(&mut self, key: &str, value: u32) {
        self.set_int(key, i32::try_from(value).unwrap_or(i32::MAX));
    }
}

/// Flush a store, logging instead of failing the caller
pub fn flush_logged(store: &mut dyn KeyValueStore) {
    if let Err(err) = store.flush() {
        log::warn!("Failed to persist preferences: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_clamp_negative_values() {
        let mut store = MemoryStore::new();
        store.set_int(keys::HIGH_SCORE, -5);
        assert_eq!(store.get_count(keys::HIGH_SCORE), 0);

        store.set_count(keys::HIGH_SCORE, 42);
        assert_eq!(store.get_int(keys::HIGH_SCORE), Some(42));
    }

    #[test]
    fn test_pref_value_json_shape() {
        let json = serde_json::to_string(&PrefValue::Int(3)).unwrap();
        assert_eq!(json, "3");
        let text: PrefValue = serde_json::from_str("\"0,1,2,3\"").unwrap();
        assert_eq!(text, PrefValue::Text("0,1,2,3".into()));
    }
}
