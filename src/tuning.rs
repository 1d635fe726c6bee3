//! Data-driven game balance
//!
//! Every value has a default, so a tuning file only needs the fields it
//! overrides. Speeds are in world units per second.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tuning file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Ball movement and invincibility resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Downward speed while the fall input is held
    pub fall_speed: f32,
    /// Upward speed applied on every bounce
    pub rise_speed: f32,
    pub gravity: f32,
    pub radius: f32,
    /// Ball height when the scene loads
    pub start_height: f32,
    /// Upper bound of the invincibility timer
    pub invincibility_duration: f32,
    /// Drain rate while the shield is active
    pub shield_deactivation_rate: f32,
    /// Charge rate while falling cleanly
    pub fall_timer_increment_rate: f32,
    /// Drain rate while not falling (or after a failed contact)
    pub fall_timer_decrement_rate: f32,
    /// Meter stays hidden below this charge unless the shield is active
    pub meter_visible_threshold: f32,
    /// Hazard stay time that ends a run after a passable stay
    pub sustained_fail_secs: f32,
    pub shatter_points: u32,
    pub invincible_shatter_points: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            fall_speed: 14.0,
            rise_speed: 5.0,
            gravity: 9.81,
            radius: 0.15,
            start_height: 0.6,
            invincibility_duration: 1.0,
            shield_deactivation_rate: 0.35,
            fall_timer_increment_rate: 0.8,
            fall_timer_decrement_rate: 0.5,
            meter_visible_threshold: 0.15,
            sustained_fail_secs: 0.1,
            shatter_points: 2,
            invincible_shatter_points: 1,
        }
    }
}

/// Subset slots the difficulty ranges draw from
pub const DIFFICULTY_SLOTS: usize = 4;

/// Level layout and difficulty
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    pub initial_level: u32,
    /// Archetypes drawn from the catalog for one level
    pub obstacles_per_level: usize,
    /// Extra corridor depth added to the level number
    pub level_addition: u32,
    /// Level thresholds that move the archetype range to harder slots
    pub difficulty_thresholds: [u32; 3],
    /// Vertical distance between rings
    pub ring_spacing: f32,
    /// Rings and goal sit this far below their nominal height
    pub placement_offset: f32,
    /// Ring yaw in degrees per unit of height
    pub yaw_per_unit_deg: f32,
    /// Middle zone as fractions of the level number (full flip)
    pub mid_zone: (f32, f32),
    /// Late zone start as a fraction of the level number (quarter turn)
    pub late_zone: f32,
    /// The level's random factor must exceed this for late rings to turn
    pub late_turn_chance: f32,
    /// Gray added to the plate color to derive the base color
    pub base_gray: f32,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            initial_level: 1,
            obstacles_per_level: 4,
            level_addition: 7,
            difficulty_thresholds: [20, 50, 100],
            ring_spacing: 0.5,
            placement_offset: 0.01,
            yaw_per_unit_deg: 8.0,
            mid_zone: (0.3, 0.6),
            late_zone: 0.8,
            late_turn_chance: 0.75,
            base_gray: 0.5,
        }
    }
}

/// Debris physics for shattered rings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShatterTuning {
    pub force_range: (f32, f32),
    pub torque_range: (f32, f32),
    /// Vertical component of the push direction before normalizing
    pub upward_bias: f32,
    /// Downward speed every piece starts with
    pub settle_speed: f32,
    pub piece_mass: f32,
    pub despawn_secs: f32,
    pub gravity: f32,
}

impl Default for ShatterTuning {
    fn default() -> Self {
        Self {
            force_range: (20.0, 35.0),
            torque_range: (110.0, 180.0),
            upward_bias: 1.5,
            settle_speed: 1.0,
            piece_mass: 8.0,
            despawn_secs: 1.0,
            gravity: 9.81,
        }
    }
}

/// Camera follow and goal column
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub initial_position: [f32; 3],
    /// Camera stops following once it is this close above the goal
    pub y_offset: f32,
    pub smooth_time: f32,
    /// World units visible from the bottom to the top of the screen
    pub view_height: f32,
    /// Vertical shift of the goal column center. The renderer draws the
    /// column's exact span as the pole, so 0 keeps it flush with the goal;
    /// a scene whose column pivot sits off the goal would set it here.
    pub column_offset: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            initial_position: [0.0, 0.0, -5.0],
            y_offset: 4.0,
            smooth_time: 0.3,
            view_height: 7.0,
            column_offset: 0.0,
        }
    }
}

/// Tower geometry and spin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTuning {
    pub rotation_speed_deg: f32,
    pub pole_radius: f32,
    pub ring_inner: f32,
    pub ring_outer: f32,
    pub ring_thickness: f32,
    pub goal_thickness: f32,
}

impl Default for TowerTuning {
    fn default() -> Self {
        Self {
            rotation_speed_deg: 100.0,
            pole_radius: 0.35,
            ring_inner: 0.35,
            ring_outer: 1.1,
            ring_thickness: 0.12,
            goal_thickness: 0.2,
        }
    }
}

impl TowerTuning {
    pub fn ring_band(&self) -> f32 {
        self.ring_outer - self.ring_inner
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub level: LevelTuning,
    pub shatter: ShatterTuning,
    pub camera: CameraTuning,
    pub tower: TowerTuning,
}

impl Tuning {
    /// Parse and validate a tuning file
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
            TuningError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        let p = &self.player;
        if p.fall_speed <= 0.0 || p.rise_speed <= 0.0 {
            return Err(invalid("player.fall_speed", "speeds must be positive"));
        }
        if p.radius <= 0.0 {
            return Err(invalid("player.radius", "must be positive"));
        }
        if p.invincibility_duration <= 0.0 {
            return Err(invalid("player.invincibility_duration", "must be positive"));
        }

        let l = &self.level;
        // Difficulty slots index into the level's subset, and the subset
        // must fit in the catalog
        let catalog_len = crate::sim::builtin_catalog().len();
        if l.obstacles_per_level < DIFFICULTY_SLOTS || l.obstacles_per_level > catalog_len {
            return Err(invalid(
                "level.obstacles_per_level",
                format!(
                    "must be between {} and {}, got {}",
                    DIFFICULTY_SLOTS, catalog_len, l.obstacles_per_level
                ),
            ));
        }
        if l.ring_spacing <= 0.0 {
            return Err(invalid("level.ring_spacing", "must be positive"));
        }
        let [t1, t2, t3] = l.difficulty_thresholds;
        if !(t1 < t2 && t2 < t3) {
            return Err(invalid(
                "level.difficulty_thresholds",
                format!("must be strictly ascending, got {t1}, {t2}, {t3}"),
            ));
        }
        if l.mid_zone.0 > l.mid_zone.1 {
            return Err(invalid("level.mid_zone", "start must not exceed end"));
        }

        let s = &self.shatter;
        if s.force_range.0 > s.force_range.1 || s.torque_range.0 > s.torque_range.1 {
            return Err(invalid("shatter.force_range", "ranges must be ordered"));
        }
        if s.piece_mass <= 0.0 {
            return Err(invalid("shatter.piece_mass", "must be positive"));
        }

        let t = &self.tower;
        if t.ring_band() <= 0.0 {
            return Err(invalid("tower.ring_outer", "must exceed ring_inner"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "player": { "fall_speed": 20.0 } }"#).unwrap();
        assert_eq!(tuning.player.fall_speed, 20.0);
        assert_eq!(tuning.player.rise_speed, 5.0);
        assert_eq!(tuning.level.obstacles_per_level, 4);
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let err = Tuning::from_json(r#"{ "level": { "difficulty_thresholds": [50, 20, 100] } }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "level.difficulty_thresholds", .. }));
    }

    #[test]
    fn test_rejects_subset_larger_than_catalog() {
        let err = Tuning::from_json(r#"{ "level": { "obstacles_per_level": 64 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "level.obstacles_per_level", .. }));
        assert!(Tuning::from_json(r#"{ "level": { "obstacles_per_level": 2 } }"#).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(Tuning::from_json("not json"), Err(TuningError::Json(_))));
    }
}
