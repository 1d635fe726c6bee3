//! Ring pieces and ring groups
//!
//! A group is one ring attached to the spinning tower. Shattering is
//! one-shot: the group freezes its world yaw, detaches, and every piece
//! turns into free-flying debris. The group despawns after a fixed delay.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arc::ArcSegment;
use super::archetype::ObstacleArchetype;
use super::contact::ContactKind;
use crate::normalize_angle;
use crate::tuning::{ShatterTuning, TowerTuning};

/// Free-flight body of a shattered piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debris {
    pub pos: Vec3,
    pub vel: Vec3,
    /// Tumble angle about the x axis
    pub spin: f32,
    pub spin_rate: f32,
}

/// One destructible ring piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub arc: ArcSegment,
    pub kind: ContactKind,
    pub collider_enabled: bool,
    /// Set once the piece is shattered
    pub debris: Option<Debris>,
}

impl Obstacle {
    pub fn new(arc: ArcSegment, kind: ContactKind) -> Self {
        Self {
            arc,
            kind,
            collider_enabled: true,
            debris: None,
        }
    }

    pub fn is_shattered(&self) -> bool {
        self.debris.is_some()
    }

    /// Launch the piece away from the group's axis. No-op if already shattered.
    fn shatter(&mut self, yaw: f32, y: f32, rng: &mut impl Rng, tuning: &ShatterTuning) {
        if self.is_shattered() {
            return;
        }

        let pos = self.arc.center(yaw, y);
        // Group axis is the tower axis (x = 0)
        let side = if 0.0 - pos.x < 0.0 { 1.0 } else { -1.0 };
        let dir = Vec3::new(side, tuning.upward_bias, 0.0).normalize();

        let force = roll(rng, tuning.force_range);
        let torque = roll(rng, tuning.torque_range);

        self.collider_enabled = false;
        self.debris = Some(Debris {
            pos,
            vel: Vec3::new(0.0, -tuning.settle_speed, 0.0) + dir * (force / tuning.piece_mass),
            spin: 0.0,
            // Torque about the -x axis
            spin_rate: -torque / tuning.piece_mass,
        });
    }

    fn integrate(&mut self, dt: f32, gravity: f32) {
        if let Some(body) = &mut self.debris {
            body.vel.y -= gravity * dt;
            body.pos += body.vel * dt;
            body.spin = normalize_angle(body.spin + body.spin_rate * dt);
        }
    }
}

fn roll(rng: &mut impl Rng, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// One ring of pieces around the tower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleGroup {
    pub id: u32,
    /// Height of the ring's center plane
    pub y: f32,
    /// Yaw relative to the tower while attached, world yaw once detached
    pub yaw: f32,
    pub attached: bool,
    pub pieces: Vec<Obstacle>,
    /// Seconds left before removal, counting once shattered
    pub despawn_timer: Option<f32>,
    /// Catalog entry this ring was built from
    pub archetype: usize,
}

impl ObstacleGroup {
    pub fn from_archetype(
        id: u32,
        y: f32,
        yaw: f32,
        archetype_index: usize,
        archetype: &ObstacleArchetype,
        tower: &TowerTuning,
    ) -> Self {
        let pieces = archetype
            .pieces
            .iter()
            .map(|spec| {
                let arc = ArcSegment::band(
                    tower.ring_inner,
                    tower.ring_outer,
                    spec.start_deg.to_radians(),
                    spec.end_deg.to_radians(),
                );
                Obstacle::new(arc, spec.kind)
            })
            .collect();

        Self {
            id,
            y,
            yaw,
            attached: true,
            pieces,
            despawn_timer: None,
            archetype: archetype_index,
        }
    }

    pub fn world_yaw(&self, tower_angle: f32) -> f32 {
        if self.attached {
            normalize_angle(self.yaw + tower_angle)
        } else {
            self.yaw
        }
    }

    pub fn is_shattered(&self) -> bool {
        self.despawn_timer.is_some()
    }

    /// Live piece (and its index) at a world angle, if its collider is
    /// still enabled
    pub fn solid_piece_at(&self, world_theta: f32, tower_angle: f32) -> Option<(usize, &Obstacle)> {
        let local = normalize_angle(world_theta - self.world_yaw(tower_angle));
        self.pieces
            .iter()
            .enumerate()
            .find(|(_, p)| p.collider_enabled && p.arc.contains_angle(local))
    }

    /// Detach from the tower and shatter every piece.
    /// Returns false if the group was already shattered.
    pub fn shatter(&mut self, tower_angle: f32, rng: &mut impl Rng, tuning: &ShatterTuning) -> bool {
        if self.is_shattered() {
            return false;
        }

        self.yaw = self.world_yaw(tower_angle);
        self.attached = false;
        for piece in &mut self.pieces {
            piece.shatter(self.yaw, self.y, rng, tuning);
        }
        self.despawn_timer = Some(tuning.despawn_secs);
        log::debug!("Group {} shattered at y={:.2}", self.id, self.y);
        true
    }

    /// Advance debris. Returns true once the group should be removed.
    pub fn update(&mut self, dt: f32, gravity: f32) -> bool {
        let Some(timer) = self.despawn_timer.as_mut() else {
            return false;
        };
        *timer -= dt;
        let expired = *timer <= 0.0;
        for piece in &mut self.pieces {
            piece.integrate(dt, gravity);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BALL_THETA;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn group(archetype: &ObstacleArchetype) -> ObstacleGroup {
        ObstacleGroup::from_archetype(1, -2.0, 0.0, 0, archetype, &TowerTuning::default())
    }

    #[test]
    fn test_solid_piece_follows_tower_rotation() {
        let archetype = ObstacleArchetype::ring("t", 4, &[0]);
        let g = group(&archetype);

        // Piece 0 spans 0..90°; the ball sits at -90°
        let (index, piece) = g.solid_piece_at(BALL_THETA, 0.2).unwrap();
        assert_eq!(piece.kind, ContactKind::Passable);
        assert_ne!(index, 0);

        // Turn the tower so piece 0 sweeps under the ball
        let (index, piece) = g.solid_piece_at(BALL_THETA, -135f32.to_radians()).unwrap();
        assert_eq!(piece.kind, ContactKind::Hazard);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_shatter_is_one_shot() {
        let archetype = ObstacleArchetype::ring("t", 8, &[1]);
        let mut g = group(&archetype);
        let mut rng = Pcg32::seed_from_u64(7);
        let tuning = ShatterTuning::default();

        assert!(g.shatter(0.4, &mut rng, &tuning));
        assert!(!g.attached);
        assert!((g.yaw - 0.4).abs() < 1e-6);
        assert!(g.pieces.iter().all(|p| !p.collider_enabled && p.is_shattered()));
        assert!(g.solid_piece_at(BALL_THETA, 0.0).is_none());

        let snapshot = g.clone();
        assert!(!g.shatter(1.0, &mut rng, &tuning));
        assert_eq!(g, snapshot);
    }

    #[test]
    fn test_debris_flies_away_from_axis() {
        let archetype = ObstacleArchetype::ring("t", 8, &[]);
        let mut g = group(&archetype);
        let mut rng = Pcg32::seed_from_u64(3);
        let tuning = ShatterTuning::default();
        g.shatter(0.0, &mut rng, &tuning);

        for piece in &g.pieces {
            let body = piece.debris.as_ref().unwrap();
            if body.pos.x > 1e-3 {
                assert!(body.vel.x > 0.0);
            } else if body.pos.x < -1e-3 {
                assert!(body.vel.x < 0.0);
            }
            let speed = body.vel.length();
            assert!(speed > 1.0 && speed < 6.0, "speed {speed}");
        }
    }

    #[test]
    fn test_despawn_after_delay() {
        let archetype = ObstacleArchetype::ring("t", 6, &[]);
        let mut g = group(&archetype);
        let mut rng = Pcg32::seed_from_u64(1);
        let tuning = ShatterTuning::default();

        // Unshattered groups never expire
        assert!(!g.update(5.0, 9.81));

        g.shatter(0.0, &mut rng, &tuning);
        let start_y = g.pieces[0].debris.as_ref().unwrap().pos.y;
        assert!(!g.update(0.5, 9.81));
        assert!(g.update(0.5, 9.81));
        let end_y = g.pieces[0].debris.as_ref().unwrap().pos.y;
        assert_ne!(start_y, end_y);
    }
}
