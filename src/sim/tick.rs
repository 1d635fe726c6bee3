//! Fixed timestep simulation tick
//!
//! Core game loop that advances one loaded level deterministically.

use glam::Vec2;

use super::contact::{Contact, ContactKind, ContactPhase, ContactTarget, Response, Slab, resolve_contact};
use super::invincibility::InvincibilityChange;
use super::state::{GameEvent, GameState, Particle, PlayerState};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer/space went down this frame
    pub press: bool,
    /// Pointer/space went up this frame
    pub release: bool,
    /// The press landed on a UI element rather than the game view
    pub ui_captured: bool,
    /// Autopilot plays the game (demo and native runs)
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let input = if input.autopilot {
        autopilot_input(state)
    } else {
        input.clone()
    };

    state.time_ticks += 1;
    state.tower.rotate(dt);

    match state.phase {
        PlayerState::Ready => {
            if input.press && !input.ui_captured {
                state.phase = PlayerState::Playing;
                state.events.push(GameEvent::Started);
                log::debug!("Level {} started", state.level);
            }
        }
        PlayerState::Playing => {
            if input.press {
                state.player.falling = true;
            }
            if input.release {
                state.player.release();
            }

            let charging = state.player.falling && !state.player.failed_contact;
            match state
                .player
                .invincibility
                .update(dt, charging, &state.tuning.player)
            {
                Some(InvincibilityChange::Activated) => {
                    state.events.push(GameEvent::InvincibilityOn)
                }
                Some(InvincibilityChange::Deactivated) => {
                    state.events.push(GameEvent::InvincibilityOff)
                }
                None => {}
            }
        }
        PlayerState::Dead => {
            if input.press {
                state.events.push(GameEvent::RetryRequested);
            }
        }
        PlayerState::Finished => {
            if input.press {
                state.events.push(GameEvent::AdvanceRequested);
            }
        }
    }

    // Dead freezes the ball in place
    if state.phase != PlayerState::Dead {
        step_ball(state, dt);
    }

    // Debris keeps flying and expires on its own timer
    let gravity = state.tuning.shatter.gravity;
    state.groups.retain_mut(|g| !g.update(dt, gravity));

    // Every ring gone while still playing also completes the level
    if state.phase == PlayerState::Playing && state.groups.is_empty() {
        complete_level(state);
    }

    update_particles(state, dt);
    if state.phase != PlayerState::Dead {
        state.player.record_trail();
    }

    state.normalize_order();
}

fn step_ball(state: &mut GameState, dt: f32) {
    let tuning = &state.tuning.player;
    let (gravity, fall_speed, rise_speed) = (tuning.gravity, tuning.fall_speed, tuning.rise_speed);
    let sustained_fail_secs = tuning.sustained_fail_secs;

    let player = &mut state.player;
    player.vel_y -= gravity * dt;
    if state.phase == PlayerState::Playing && player.falling {
        player.vel_y = -fall_speed;
    }

    let old_low = player.low();
    player.y += player.vel_y * dt;
    let new_low = player.low();

    let Some(contact) = find_contact(state, old_low, new_low) else {
        state.player.contact = None;
        return;
    };

    let phase = if state.player.contact == Some(contact.target) {
        ContactPhase::Stay
    } else {
        ContactPhase::Enter
    };
    let playing = state.phase == PlayerState::Playing;
    let response = resolve_contact(
        phase,
        contact.kind,
        &mut state.player,
        playing,
        dt,
        sustained_fail_secs,
    );

    match response {
        Some(Response::Shatter { invincible }) => {
            // The ball smashes through and keeps falling
            state.player.contact = None;
            if let ContactTarget::Piece { group: id, .. } = contact.target {
                if state.shatter_group(id) {
                    let points = if invincible {
                        state.tuning.player.invincible_shatter_points
                    } else {
                        state.tuning.player.shatter_points
                    };
                    state.events.push(GameEvent::Shattered {
                        group_id: id,
                        points,
                        invincible,
                    });
                }
            }
        }
        Some(Response::Bounce) => {
            land(state, &contact);
            state.player.vel_y = rise_speed;
            spawn_splash(state, contact.surface_y);
            state.events.push(GameEvent::Bounce);
        }
        Some(Response::Fail) => {
            land(state, &contact);
            state.player.vel_y = 0.0;
            state.phase = PlayerState::Dead;
            state.events.push(GameEvent::Died);
            log::info!(
                "Died on level {} ({}/{} rings cleared)",
                state.level,
                state.cleared_groups,
                state.total_groups
            );
        }
        Some(Response::Complete) => {
            land(state, &contact);
            complete_level(state);
        }
        None => land(state, &contact),
    }
}

/// Rest the ball on the touched surface
fn land(state: &mut GameState, contact: &Contact) {
    let player = &mut state.player;
    player.y = contact.surface_y + player.radius;
    player.vel_y = player.vel_y.max(0.0);
    player.contact = Some(contact.target);
}

fn complete_level(state: &mut GameState) {
    state.phase = PlayerState::Finished;
    state.player.falling = false;
    state.events.push(GameEvent::LevelCompleted);
    log::info!(
        "Level {} completed ({}/{} rings cleared)",
        state.level,
        state.cleared_groups,
        state.total_groups
    );
}

/// Highest surface under the ball that its lowest point reached this step
fn find_contact(state: &GameState, old_low: f32, new_low: f32) -> Option<Contact> {
    let thickness = state.tuning.tower.ring_thickness;

    let rings = state
        .groups
        .iter()
        .filter(|g| !g.is_shattered())
        .filter_map(|g| {
            let slab = Slab::centered(g.y, thickness);
            if !slab.swept_by(old_low, new_low, CONTACT_SKIN) {
                return None;
            }
            let (index, piece) = g.solid_piece_at(BALL_THETA, state.tower.angle)?;
            Some(Contact {
                target: ContactTarget::Piece { group: g.id, index },
                kind: piece.kind,
                surface_y: slab.top,
            })
        });

    let goal_slab = state.goal.slab();
    let goal = goal_slab
        .swept_by(old_low, new_low, CONTACT_SKIN)
        .then_some(Contact {
            target: ContactTarget::Goal,
            kind: ContactKind::Finish,
            surface_y: goal_slab.top,
        });

    rings
        .chain(goal)
        .max_by(|a, b| a.surface_y.total_cmp(&b.surface_y))
}

/// Splash under the ball on bounce
fn spawn_splash(state: &mut GameState, surface_y: f32) {
    const SPLASH_COUNT: u32 = 6;
    let seed = state.time_ticks as u32;

    for i in 0..SPLASH_COUNT {
        if state.particles.len() >= MAX_PARTICLES {
            state.particles.remove(0);
        }
        // Deterministic spread from a hash of the tick
        let hash = seed
            .wrapping_mul(2654435761)
            .wrapping_add(i * 7919);
        let spread = (hash % 1000) as f32 / 1000.0 - 0.5;
        let lift = (hash / 1000 % 1000) as f32 / 1000.0;
        let size = 0.03 + (hash / 10000 % 100) as f32 / 100.0 * 0.04;

        state.particles.push(Particle {
            pos: Vec2::new(spread * 0.2, surface_y),
            vel: Vec2::new(spread * 2.5, 0.8 + lift * 1.5),
            life: 1.0,
            size,
        });
    }
}

fn update_particles(state: &mut GameState, dt: f32) {
    let gravity = state.tuning.player.gravity;
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel * dt;
        particle.vel.y -= gravity * 0.5 * dt;
        particle.life -= dt * 2.0;
        particle.size *= 0.995;
    }
    state.particles.retain(|p| p.life > 0.0);
}

/// Synthesize input for the autopilot: start every level, fall while the
/// next surface under the ball is safe, hold back otherwise.
fn autopilot_input(state: &GameState) -> TickInput {
    let mut input = TickInput::default();
    match state.phase {
        PlayerState::Ready | PlayerState::Dead | PlayerState::Finished => {
            // Leave some time on end screens before moving on
            if state.phase == PlayerState::Ready || state.time_ticks % 120 == 119 {
                input.press = true;
            }
        }
        PlayerState::Playing => {
            let want_fall = next_surface_is_safe(state);
            if want_fall && !state.player.falling {
                input.press = true;
            } else if !want_fall && state.player.falling {
                input.release = true;
            }
        }
    }
    input
}

fn next_surface_is_safe(state: &GameState) -> bool {
    if state.player.invincibility.active {
        return true;
    }

    let low = state.player.low() + CONTACT_SKIN;
    let thickness = state.tuning.tower.ring_thickness;
    let next = state
        .groups
        .iter()
        .filter(|g| !g.is_shattered())
        .map(|g| (g, Slab::centered(g.y, thickness).top))
        .filter(|(_, top)| *top <= low)
        .max_by(|a, b| a.1.total_cmp(&b.1));

    // Nothing but the goal below
    let Some((group, top)) = next else {
        return true;
    };

    // Predict where the tower will be when the ball arrives
    let eta = (state.player.low() - top).max(0.0) / state.tuning.player.fall_speed;
    let arrival = state.tower.angle + state.tower.speed * eta;
    [-0.1f32, 0.0, 0.1].iter().all(|margin| {
        group
            .solid_piece_at(BALL_THETA, arrival + margin)
            .is_none_or(|(_, p)| p.kind == ContactKind::Passable)
    })
}
