//! Game state and core simulation types
//!
//! One `GameState` is one loaded scene: the tower for a single level attempt.
//! Retrying or advancing builds a fresh state from the level plan.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::archetype::ObstacleArchetype;
use super::contact::{ContactTarget, Slab};
use super::invincibility::Invincibility;
use super::level::LevelPlan;
use super::obstacle::ObstacleGroup;
use super::palette::EffectPalette;
use crate::consts::*;
use crate::normalize_angle;
use crate::tuning::Tuning;

/// Player state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// Home screen shown, ball bouncing on the top ring
    Ready,
    /// Active gameplay
    Playing,
    /// Hit a hazard; waiting for a tap to retry
    Dead,
    /// Reached the goal; waiting for a tap to advance
    Finished,
}

/// Trail point for ball rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub y: f32,
    pub speed: f32,
}

/// The ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub y: f32,
    pub vel_y: f32,
    pub radius: f32,
    /// Fall input held while playing
    pub falling: bool,
    pub invincibility: Invincibility,
    /// A passable stay contact happened since the last release
    pub touched_passable: bool,
    /// Accumulated hazard stay time since the last passable stay
    pub fail_contact_secs: f32,
    /// A hazard contact failed since the last release
    pub failed_contact: bool,
    /// Surface touched on the previous step
    pub contact: Option<ContactTarget>,
    /// Trail history for rendering (newest first)
    #[serde(skip)]
    pub trail: Vec<TrailPoint>,
}

impl Player {
    pub fn new(y: f32, radius: f32) -> Self {
        Self {
            y,
            vel_y: 0.0,
            radius,
            falling: false,
            invincibility: Invincibility::default(),
            touched_passable: false,
            fail_contact_secs: 0.0,
            failed_contact: false,
            contact: None,
            trail: Vec::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Lowest point of the ball
    #[inline]
    pub fn low(&self) -> f32 {
        self.y - self.radius
    }

    /// Input released: stop falling and clear the contact streak
    pub fn release(&mut self) {
        self.falling = false;
        self.touched_passable = false;
        self.fail_contact_secs = 0.0;
        self.failed_contact = false;
    }

    pub fn record_trail(&mut self) {
        self.trail.insert(
            0,
            TrailPoint {
                y: self.y,
                speed: self.vel_y.abs(),
            },
        );
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop();
        }
    }
}

/// The spinning column the rings are attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    /// Current rotation (radians)
    pub angle: f32,
    /// Angular speed (radians/sec)
    pub speed: f32,
}

impl Tower {
    pub fn rotate(&mut self, dt: f32) {
        self.angle = normalize_angle(self.angle + self.speed * dt);
    }
}

/// The finish ring at the bottom of the tower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalMarker {
    pub y: f32,
    pub thickness: f32,
}

impl GoalMarker {
    pub fn slab(&self) -> Slab {
        Slab::centered(self.y, self.thickness)
    }
}

/// Bounce splash particle (visual only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Screen-plane position (x across, y up)
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0-1, decreases over time
    pub life: f32,
    pub size: f32,
}

/// Game events emitted during a tick, drained by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Ready → Playing
    Started,
    /// Ball bounced off a surface
    Bounce,
    /// A ring was smashed
    Shattered {
        group_id: u32,
        points: u32,
        invincible: bool,
    },
    InvincibilityOn,
    InvincibilityOff,
    /// Playing → Dead
    Died,
    /// Playing → Finished
    LevelCompleted,
    /// Tap while dead: reload the same level
    RetryRequested,
    /// Tap after finishing: reload with the next level
    AdvanceRequested,
}

/// Complete state of one loaded level
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed for shatter randomness
    pub seed: u64,
    rng: Pcg32,
    pub level: u32,
    pub phase: PlayerState,
    pub player: Player,
    pub tower: Tower,
    /// Ring groups (sorted by id for determinism)
    pub groups: Vec<ObstacleGroup>,
    pub goal: GoalMarker,
    /// Groups spawned for this level
    pub total_groups: u32,
    /// Groups shattered so far
    pub cleared_groups: u32,
    pub palette: EffectPalette,
    pub tuning: Tuning,
    /// Ball height at scene load
    pub start_y: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    next_id: u32,
}

impl GameState {
    /// Empty tower for `level` (no rings; goal at the origin)
    pub fn new(seed: u64, level: u32, tuning: Tuning) -> Self {
        let start_y = tuning.player.start_height;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level,
            phase: PlayerState::Ready,
            player: Player::new(start_y, tuning.player.radius),
            tower: Tower {
                angle: 0.0,
                speed: tuning.tower.rotation_speed_deg.to_radians(),
            },
            groups: Vec::new(),
            goal: GoalMarker {
                y: 0.0,
                thickness: tuning.tower.goal_thickness,
            },
            total_groups: 0,
            cleared_groups: 0,
            palette: EffectPalette::default(),
            tuning,
            start_y,
            time_ticks: 0,
            events: Vec::new(),
            particles: Vec::new(),
            next_id: 1,
        }
    }

    /// Build the scene for a generated level plan
    pub fn from_plan(
        plan: &LevelPlan,
        catalog: &[ObstacleArchetype],
        tuning: Tuning,
        seed: u64,
    ) -> Self {
        let mut state = Self::new(seed, plan.level, tuning);
        state.palette = plan.palette;
        state.goal.y = plan.goal_y;

        for placement in &plan.placements {
            let Some(archetype) = catalog.get(placement.archetype) else {
                log::warn!(
                    "Archetype {} missing from catalog, skipping ring at y={:.2}",
                    placement.archetype,
                    placement.y
                );
                continue;
            };
            state.spawn_group(
                placement.y,
                placement.yaw_deg.to_radians(),
                placement.archetype,
                archetype,
            );
        }

        log::info!(
            "Level {} built: {} rings, goal at y={:.2}",
            state.level,
            state.total_groups,
            state.goal.y
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_group(
        &mut self,
        y: f32,
        yaw: f32,
        archetype_index: usize,
        archetype: &ObstacleArchetype,
    ) -> u32 {
        let id = self.next_entity_id();
        self.groups.push(ObstacleGroup::from_archetype(
            id,
            y,
            yaw,
            archetype_index,
            archetype,
            &self.tuning.tower,
        ));
        self.total_groups += 1;
        id
    }

    /// Shatter a group by id. Returns false if it is missing or already shattered.
    pub fn shatter_group(&mut self, id: u32) -> bool {
        let tower_angle = self.tower.angle;
        let Some(group) = self.groups.iter_mut().find(|g| g.id == id) else {
            return false;
        };
        if group.shatter(tower_angle, &mut self.rng, &self.tuning.shatter) {
            self.cleared_groups += 1;
            true
        } else {
            false
        }
    }

    /// Level progress fill (0-1)
    pub fn progress(&self) -> f32 {
        if self.total_groups == 0 {
            0.0
        } else {
            self.cleared_groups as f32 / self.total_groups as f32
        }
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure groups are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.groups.sort_by_key(|g| g.id);
    }
}
