//! Player settings
//!
//! Stored as a JSON blob under the `Settings` preference key.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_PARTICLES, TRAIL_LENGTH};
use crate::persistence::{KeyValueStore, keys};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Splash particle cap for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => MAX_PARTICLES / 4,
            QualityPreset::Medium => MAX_PARTICLES / 2,
            QualityPreset::High => MAX_PARTICLES,
        }
    }

    /// Trail length multiplier (1.0 = full)
    pub fn trail_quality(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }

    /// Whether the goal glow gradient is drawn
    pub fn glow_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Ball trail
    pub trails: bool,
    /// Bounce splash particles
    pub particles: bool,

    // === HUD ===
    pub show_fps: bool,

    // === Audio ===
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Accessibility ===
    /// Reduced motion (no debris spin, shorter trail)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            trails: true,
            particles: true,
            show_fps: false,
            sound_enabled: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            reduced_motion: false,
        }
    }
}

impl Settings {
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Trail points to draw
    pub fn trail_points(&self) -> usize {
        if !self.trails {
            return 0;
        }
        let mut quality = self.quality.trail_quality();
        if self.reduced_motion {
            quality *= 0.5;
        }
        (TRAIL_LENGTH as f32 * quality) as usize
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get_string(keys::SETTINGS) {
            Some(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(err) => {
                    log::warn!("Discarding unreadable settings: {}", err);
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => {
                store.set_string(keys::SETTINGS, &json);
                log::info!("Settings saved");
            }
            Err(err) => log::warn!("Failed to encode settings: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_settings_round_trip_through_store() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.sound_enabled = false;
        settings.save(&mut store);

        let loaded = Settings::load(&store);
        assert_eq!(loaded.quality, QualityPreset::High);
        assert!(!loaded.sound_enabled);
    }

    #[test]
    fn test_unreadable_settings_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set_string(keys::SETTINGS, "{ nope");
        let loaded = Settings::load(&store);
        assert!(loaded.sound_enabled);
        assert_eq!(loaded.quality, QualityPreset::Medium);
    }

    #[test]
    fn test_disabled_effects_zero_caps() {
        let settings = Settings {
            trails: false,
            particles: false,
            ..Settings::default()
        };
        assert_eq!(settings.max_particles(), 0);
        assert_eq!(settings.trail_points(), 0);
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
    }
}
