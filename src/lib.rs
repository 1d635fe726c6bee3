//! Helix Drop - a falling-ball tower arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball physics, ring contacts, shatter, level layout)
//! - `session`: Application assembly wiring the sim to scores, sound, UI and storage
//! - `score`: Current/session/all-time score bookkeeping
//! - `audio`: Sound effects gated behind the sound toggle
//! - `ui`: HUD model mirrored by the platform layer
//! - `camera`: Camera follow and goal column sizing
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Key-value preference storage
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod camera;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod score;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use audio::{SoundEffect, SoundService};
pub use persistence::{KeyValueStore, MemoryStore, StoreError};
pub use score::ScoreTracker;
pub use session::Session;
pub use settings::{QualityPreset, Settings};
pub use tuning::{Tuning, TuningError};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Angle (radians) around the tower where the ball bounces, facing the camera
    pub const BALL_THETA: f32 = -std::f32::consts::FRAC_PI_2;

    /// Tolerance when deciding whether the ball still rests on a surface
    pub const CONTACT_SKIN: f32 = 1.0e-3;

    /// Number of recent ball positions kept for the trail
    pub const TRAIL_LENGTH: usize = 24;

    /// Maximum splash particles alive at once
    pub const MAX_PARTICLES: usize = 128;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Point on the horizontal plane around the tower axis at height `y`
#[inline]
pub fn around_axis(r: f32, theta: f32, y: f32) -> Vec3 {
    Vec3::new(r * theta.cos(), y, r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps_into_range() {
        assert!((normalize_angle(3.0 * PI) + PI).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert!(normalize_angle(PI) < PI);
    }

    #[test]
    fn test_around_axis_front_faces_camera() {
        let p = around_axis(1.0, consts::BALL_THETA, 2.0);
        assert!(p.x.abs() < 1e-6);
        assert_eq!(p.y, 2.0);
        assert!((p.z + 1.0).abs() < 1e-6);
    }
}
