//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time and seeding
//! - Preference storage (LocalStorage on web, a JSON file natively)
//! - Tuning files (native only)

use crate::persistence::{KeyValueStore, MemoryStore};

/// Environment variable overriding the native preferences path
#[cfg(not(target_arch = "wasm32"))]
pub const PREFS_ENV: &str = "HELIX_DROP_PREFS";
/// Default native preferences file
#[cfg(not(target_arch = "wasm32"))]
pub const DEFAULT_PREFS_PATH: &str = "helix_drop_prefs.json";

/// Milliseconds since the Unix epoch
pub fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Session seed from the wall clock
pub fn seed_from_clock() -> u64 {
    now_ms() as u64
}

/// Open the platform's preference store, falling back to memory when it is
/// unavailable (private browsing, unreadable file)
pub fn open_store() -> Box<dyn KeyValueStore> {
    #[cfg(target_arch = "wasm32")]
    let opened = crate::persistence::LocalStorageStore::open()
        .map(|s| Box::new(s) as Box<dyn KeyValueStore>);

    #[cfg(not(target_arch = "wasm32"))]
    let opened = {
        let path = std::env::var_os(PREFS_ENV)
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| std::path::PathBuf::from(DEFAULT_PREFS_PATH));
        log::info!("Preferences file: {}", path.display());
        crate::persistence::FileStore::open(path).map(|s| Box::new(s) as Box<dyn KeyValueStore>)
    };

    match opened {
        Ok(store) => store,
        Err(err) => {
            log::warn!("Preferences unavailable, progress will not be saved: {}", err);
            Box::new(MemoryStore::new())
        }
    }
}

/// Read and validate a tuning file
#[cfg(not(target_arch = "wasm32"))]
pub fn read_tuning(path: &std::path::Path) -> Result<crate::tuning::Tuning, crate::tuning::TuningError> {
    let json = std::fs::read_to_string(path).map_err(|source| crate::tuning::TuningError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    crate::tuning::Tuning::from_json(&json)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::tuning::TuningError;
    use std::io::Write;

    #[test]
    fn test_read_tuning_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "tower": {{ "rotation_speed_deg": 60.0 }} }}"#).unwrap();
        let tuning = read_tuning(file.path()).unwrap();
        assert_eq!(tuning.tower.rotation_speed_deg, 60.0);
    }

    #[test]
    fn test_missing_tuning_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_tuning(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TuningError::Io { .. }));
    }

    #[test]
    fn test_clock_seed_is_nonzero() {
        assert!(now_ms() > 0.0);
        assert!(seed_from_clock() > 0);
    }
}
