//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies (level preparation only touches
//!   the `KeyValueStore` trait)

pub mod arc;
pub mod archetype;
pub mod contact;
pub mod invincibility;
pub mod level;
pub mod obstacle;
pub mod palette;
pub mod state;
pub mod tick;

pub use arc::ArcSegment;
pub use archetype::{ObstacleArchetype, PieceSpec, builtin_catalog};
pub use contact::{ContactKind, ContactTarget, Response, resolve_contact};
pub use invincibility::{Invincibility, InvincibilityChange};
pub use level::{LevelPlan, Placement, RotationZone, prepare};
pub use obstacle::{Debris, Obstacle, ObstacleGroup};
pub use palette::{EffectPalette, Rgba};
pub use state::{GameEvent, GameState, GoalMarker, Particle, Player, PlayerState, Tower, TrailPoint};
pub use tick::{TickInput, tick};
