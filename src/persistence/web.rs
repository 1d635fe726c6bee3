//! Browser LocalStorage backend
//!
//! Each preference is its own LocalStorage item, prefixed so that wiping
//! preferences leaves unrelated site data alone. Values are stored as JSON
//! so ints and strings round-trip with their type.

use web_sys::Storage;

use super::{KeyValueStore, PrefValue, StoreError};

const KEY_PREFIX: &str = "helix_drop:";

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StoreError::Unavailable("LocalStorage disabled".into()))?;
        log::info!("Using LocalStorage for preferences");
        Ok(Self { storage })
    }

    fn item(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    fn read(&self, key: &str) -> Option<PrefValue> {
        let json = self.storage.get_item(&Self::item(key)).ok()??;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("Ignoring unreadable preference {}: {}", key, err);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &PrefValue) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if self.storage.set_item(&Self::item(key), &json).is_err() {
                    log::warn!("LocalStorage rejected preference {}", key);
                }
            }
            Err(err) => log::warn!("Failed to encode preference {}: {}", key, err),
        }
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get_int(&self, key: &str) -> Option<i32> {
        match self.read(key)? {
            PrefValue::Int(v) => Some(v),
            PrefValue::Text(_) => None,
        }
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.write(key, &PrefValue::Int(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.read(key)? {
            PrefValue::Text(v) => Some(v),
            PrefValue::Int(_) => None,
        }
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.write(key, &PrefValue::Text(value.to_string()));
    }

    fn has_key(&self, key: &str) -> bool {
        matches!(self.storage.get_item(&Self::item(key)), Ok(Some(_)))
    }

    fn delete_all(&mut self) {
        let len = self.storage.length().unwrap_or(0);
        let ours: Vec<String> = (0..len)
            .filter_map(|i| self.storage.key(i).ok().flatten())
            .filter(|k| k.starts_with(KEY_PREFIX))
            .collect();
        for key in &ours {
            let _ = self.storage.remove_item(key);
        }
        log::info!("Deleted {} preferences", ours.len());
    }
}
