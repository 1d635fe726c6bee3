//! Native preference file
//!
//! Layout on disk is a versioned JSON envelope. Writes go to a temp file
//! first, the previous file is rotated to `.bak`, then the temp file takes
//! its place. A corrupted main file falls back to the backup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{KeyValueStore, MemoryStore, PrefValue, StoreError};

const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    entries: BTreeMap<String, PrefValue>,
}

/// Preferences persisted to a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    prefs: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Open (or start) the preference file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let prefs = if path.exists() {
            match read_envelope(&path) {
                Ok(entries) => entries,
                Err(err) => {
                    let backup = backup_path(&path);
                    if !backup.exists() {
                        return Err(err);
                    }
                    log::warn!("Preferences at {} unreadable ({}), using backup", path.display(), err);
                    read_envelope(&backup)?
                }
            }
        } else {
            log::info!("No preferences at {}, starting fresh", path.display());
            MemoryStore::new()
        };

        log::info!("Loaded {} preferences from {}", prefs.len(), path.display());
        Ok(Self {
            path,
            prefs,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<(), StoreError> {
        let envelope = Envelope {
            version: ENVELOPE_VERSION,
            entries: self.prefs.entries().clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
        if self.path.exists() {
            let backup = backup_path(&self.path);
            fs::rename(&self.path, &backup).map_err(|e| io_error(&backup, e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("bak")
}

fn read_envelope(path: &Path) -> Result<MemoryStore, StoreError> {
    let json = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let envelope: Envelope = serde_json::from_str(&json)?;
    if envelope.version != ENVELOPE_VERSION {
        return Err(StoreError::Version {
            found: envelope.version,
            expected: ENVELOPE_VERSION,
        });
    }
    Ok(MemoryStore::from_entries(envelope.entries))
}

impl KeyValueStore for FileStore {
    fn get_int(&self, key: &str) -> Option<i32> {
        self.prefs.get_int(key)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.prefs.set_int(key, value);
        self.dirty = true;
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.prefs.get_string(key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.prefs.set_string(key, value);
        self.dirty = true;
    }

    fn has_key(&self, key: &str) -> bool {
        self.prefs.has_key(key)
    }

    fn delete_all(&mut self) {
        self.prefs.delete_all();
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        self.write()?;
        self.dirty = false;
        log::debug!("Preferences saved to {}", self.path.display());
        Ok(())
    }
}
