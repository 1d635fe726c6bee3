//! Level generation
//!
//! Builds the plan for the current level from persisted preferences: the
//! level number, its color pair and the subset of ring archetypes it uses.
//! Colors and the subset are regenerated whenever the level number changes,
//! so retrying a level looks and plays the same.

use std::ops::Range;

use rand::Rng;

use super::archetype::ObstacleArchetype;
use super::palette::{EffectPalette, Rgba};
use crate::persistence::{KeyValueStore, keys};
use crate::tuning::LevelTuning;

/// One ring to spawn
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Catalog index
    pub archetype: usize,
    pub y: f32,
    pub yaw_deg: f32,
}

/// Everything needed to build a level's scene
#[derive(Debug, Clone, PartialEq)]
pub struct LevelPlan {
    pub level: u32,
    /// Catalog indices used by this level
    pub archetypes: Vec<usize>,
    pub palette: EffectPalette,
    pub placements: Vec<Placement>,
    pub goal_y: f32,
}

/// Height band a ring falls into, which decides its extra turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationZone {
    Early,
    /// Flipped half a turn
    Middle,
    /// Turned a quarter, when the level's random factor allows it
    Late,
}

impl RotationZone {
    pub fn classify(y: f32, level: u32, tuning: &LevelTuning) -> Self {
        let depth = y.abs();
        let level = level as f32;
        if depth >= level * tuning.mid_zone.0 && depth <= level * tuning.mid_zone.1 {
            RotationZone::Middle
        } else if depth >= level * tuning.late_zone {
            RotationZone::Late
        } else {
            RotationZone::Early
        }
    }
}

/// Subset slots rings are drawn from; later slots are harder
pub fn slot_range(level: u32, tuning: &LevelTuning) -> Range<usize> {
    let [easy, medium, hard] = tuning.difficulty_thresholds;
    if level < easy {
        0..2
    } else if level < medium {
        1..3
    } else if level < hard {
        2..4
    } else {
        3..4
    }
}

/// Ring yaw in degrees at height `y`
pub fn ring_yaw_deg(y: f32, level: u32, random_factor: f32, tuning: &LevelTuning) -> f32 {
    let base = y * tuning.yaw_per_unit_deg;
    match RotationZone::classify(y, level, tuning) {
        RotationZone::Middle => base + 180.0,
        RotationZone::Late if random_factor > tuning.late_turn_chance => base + 90.0,
        _ => base,
    }
}

/// Read the level number and prepare its plan, persisting anything regenerated
pub fn prepare(
    store: &mut dyn KeyValueStore,
    rng: &mut impl Rng,
    tuning: &LevelTuning,
    catalog: &[ObstacleArchetype],
) -> LevelPlan {
    let level = current_level(store, tuning);
    let level_changed = store.get_int(keys::SAVED_LEVEL) != i32::try_from(level).ok();

    let palette = level_palette(store, rng, level_changed, tuning);
    store.set_count(keys::SAVED_LEVEL, level);

    let archetypes = archetype_subset(store, rng, level_changed, tuning, catalog.len());
    let (placements, goal_y) = layout(level, &archetypes, rng, tuning);

    log::info!(
        "Prepared level {} ({}): archetypes {:?}, {} rings",
        level,
        if level_changed { "regenerated" } else { "restored" },
        archetypes,
        placements.len()
    );

    LevelPlan {
        level,
        archetypes,
        palette,
        placements,
        goal_y,
    }
}

/// Highest level a tower is built for; stored values above it are clamped
pub const MAX_LEVEL: u32 = 10_000;

pub fn current_level(store: &dyn KeyValueStore, tuning: &LevelTuning) -> u32 {
    let initial = i32::try_from(tuning.initial_level).unwrap_or(1);
    let stored = store.get_int_or(keys::LEVEL, initial).max(1) as u32;
    if stored > MAX_LEVEL {
        log::warn!("Stored level {} exceeds {}, clamping", stored, MAX_LEVEL);
    }
    stored.min(MAX_LEVEL)
}

fn level_palette(
    store: &mut dyn KeyValueStore,
    rng: &mut impl Rng,
    level_changed: bool,
    tuning: &LevelTuning,
) -> EffectPalette {
    if !level_changed {
        if let (Some(plate), Some(base)) = (
            load_color(store, keys::PLATE_COLOR),
            load_color(store, keys::BASE_COLOR),
        ) {
            return EffectPalette::from_colors(plate, base);
        }
    }

    let plate = Rgba::from_hsv(rng.random::<f32>(), rng.random_range(0.5..1.0), 1.0);
    let base = plate.lightened(tuning.base_gray);
    save_color(store, keys::PLATE_COLOR, plate);
    save_color(store, keys::BASE_COLOR, base);
    EffectPalette::from_colors(plate, base)
}

fn load_color(store: &dyn KeyValueStore, key: &str) -> Option<Rgba> {
    let json = store.get_string(key)?;
    match serde_json::from_str(&json) {
        Ok(color) => Some(color),
        Err(err) => {
            log::warn!("Discarding unreadable color under {}: {}", key, err);
            None
        }
    }
}

fn save_color(store: &mut dyn KeyValueStore, key: &str, color: Rgba) {
    match serde_json::to_string(&color) {
        Ok(json) => store.set_string(key, &json),
        Err(err) => log::warn!("Failed to encode color for {}: {}", key, err),
    }
}

/// Persisted indices, skipping anything unparsable or out of range
pub fn parse_subset(saved: &str, catalog_len: usize) -> Vec<usize> {
    saved
        .split(',')
        .filter_map(|s| s.trim().parse::<usize>().ok())
        .filter(|&i| i < catalog_len)
        .collect()
}

fn archetype_subset(
    store: &mut dyn KeyValueStore,
    rng: &mut impl Rng,
    level_changed: bool,
    tuning: &LevelTuning,
    catalog_len: usize,
) -> Vec<usize> {
    if !level_changed {
        let saved = store
            .get_string(keys::CURRENT_OBSTACLES)
            .map(|s| parse_subset(&s, catalog_len))
            .unwrap_or_default();
        if !saved.is_empty() {
            return saved;
        }
    }

    if catalog_len == 0 {
        log::warn!("Archetype catalog is empty; level will have no rings");
        return Vec::new();
    }

    let per_level = tuning.obstacles_per_level.max(1);
    let sets = (catalog_len / per_level).max(1);
    let start = rng.random_range(0..sets) * per_level;
    let subset: Vec<usize> = (start..start + per_level)
        .filter(|&i| i < catalog_len)
        .collect();

    let joined = subset
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",");
    store.set_string(keys::CURRENT_OBSTACLES, &joined);
    subset
}

fn layout(
    level: u32,
    subset: &[usize],
    rng: &mut impl Rng,
    tuning: &LevelTuning,
) -> (Vec<Placement>, f32) {
    let random_factor: f32 = rng.random();
    let bottom = -((level + tuning.level_addition) as f32);
    let slots = slot_range(level, tuning);

    let mut placements = Vec::new();
    let mut ring = 0u32;
    let mut y = 0.0f32;
    while y > bottom {
        let slot = rng.random_range(slots.clone());
        match subset.get(slot) {
            Some(&archetype) => placements.push(Placement {
                archetype,
                y: y - tuning.placement_offset,
                yaw_deg: ring_yaw_deg(y, level, random_factor, tuning),
            }),
            None => log::warn!(
                "Subset slot {} unavailable ({} archetypes), skipping ring at y={:.2}",
                slot,
                subset.len(),
                y
            ),
        }
        // Derived from the ring index so rounding can't stall the walk
        ring += 1;
        y = -(ring as f32) * tuning.ring_spacing;
    }

    (placements, y - tuning.placement_offset)
}
