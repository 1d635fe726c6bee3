//! Ball contact detection and the contact policy
//!
//! Contacts are detected by sweeping the ball's lowest point between the
//! previous and the current step against each ring slab. The ball lives at a
//! fixed angle around the tower, so the piece it touches is the one whose
//! arc contains that angle in the ring's (rotated) frame.
//!
//! The policy maps (enter/stay, category, falling, invincible) to a single
//! response. Categories are a closed enum so every case is matched.

use serde::{Deserialize, Serialize};

use super::state::Player;

/// Contact category of a surface the ball can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactKind {
    /// Destructible piece, scores when smashed
    Passable,
    /// Lethal piece unless the ball is invincible
    Hazard,
    /// The goal ring
    Finish,
}

impl ContactKind {
    /// Resolve a scene tag ("Passable", "Fail", "Finish")
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Passable" => Some(ContactKind::Passable),
            "Fail" => Some(ContactKind::Hazard),
            "Finish" => Some(ContactKind::Finish),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ContactKind::Passable => "Passable",
            ContactKind::Hazard => "Fail",
            ContactKind::Finish => "Finish",
        }
    }
}

/// What the ball is touching. Each ring piece is its own target, so a new
/// piece rotating under a resting ball starts a new contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactTarget {
    Piece { group: u32, index: usize },
    Goal,
}

/// First step of a contact, or a continuation of the previous step's contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Enter,
    Stay,
}

/// A surface found under the ball this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub target: ContactTarget,
    pub kind: ContactKind,
    /// Height of the touched surface
    pub surface_y: f32,
}

/// Response the simulation must carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Launch the ball upward and play the bounce sound
    Bounce,
    /// Shatter the touched group
    Shatter { invincible: bool },
    /// End the run
    Fail,
    /// Complete the level
    Complete,
}

/// Horizontal slab of a ring or the goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slab {
    pub top: f32,
    pub bottom: f32,
}

impl Slab {
    pub fn centered(y: f32, thickness: f32) -> Self {
        Self {
            top: y + thickness / 2.0,
            bottom: y - thickness / 2.0,
        }
    }

    /// Did a ball whose lowest point moved `old_low -> new_low` reach the top
    /// face from above (or keep resting on it)?
    pub fn swept_by(&self, old_low: f32, new_low: f32, skin: f32) -> bool {
        old_low >= self.top - skin && new_low <= self.top + skin
    }
}

/// Apply the contact policy, updating the player's streak flags.
///
/// `playing` gates completion: reaching the goal only finishes a level that
/// is still being played.
pub fn resolve_contact(
    phase: ContactPhase,
    kind: ContactKind,
    player: &mut Player,
    playing: bool,
    dt: f32,
    sustained_fail_secs: f32,
) -> Option<Response> {
    match phase {
        ContactPhase::Enter if !player.falling => Some(Response::Bounce),
        ContactPhase::Enter => {
            let invincible = player.invincibility.active;
            match kind {
                ContactKind::Passable => Some(Response::Shatter { invincible }),
                ContactKind::Hazard if invincible => Some(Response::Shatter { invincible }),
                ContactKind::Hazard => {
                    register_fail(player);
                    Some(Response::Fail)
                }
                ContactKind::Finish if playing => Some(Response::Complete),
                ContactKind::Finish => None,
            }
        }
        ContactPhase::Stay => match kind {
            _ if !player.falling => Some(Response::Bounce),
            ContactKind::Finish => Some(Response::Bounce),
            ContactKind::Hazard => {
                player.fail_contact_secs += dt;
                if player.touched_passable && player.fail_contact_secs >= sustained_fail_secs {
                    register_fail(player);
                    Some(Response::Fail)
                } else {
                    None
                }
            }
            ContactKind::Passable => {
                player.touched_passable = true;
                player.fail_contact_secs = 0.0;
                None
            }
        },
    }
}

/// A failed contact drains the invincibility charge and blocks recharging
/// until the input is released
fn register_fail(player: &mut Player) {
    if player.falling && !player.invincibility.active {
        player.invincibility.timer = 0.0;
        player.failed_contact = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 120.0;
    const SUSTAIN: f32 = 0.1;

    fn falling_player() -> Player {
        let mut player = Player::new(0.0, 0.15);
        player.falling = true;
        player
    }

    #[test]
    fn test_tags_map_to_kinds() {
        assert_eq!(ContactKind::from_tag("Fail"), Some(ContactKind::Hazard));
        assert_eq!(ContactKind::from_tag("Finish"), Some(ContactKind::Finish));
        assert_eq!(ContactKind::from_tag("Untagged"), None);
        assert_eq!(ContactKind::Passable.tag(), "Passable");
    }

    #[test]
    fn test_enter_while_not_falling_bounces() {
        let mut player = Player::new(0.0, 0.15);
        for kind in [ContactKind::Passable, ContactKind::Hazard, ContactKind::Finish] {
            let r = resolve_contact(ContactPhase::Enter, kind, &mut player, true, DT, SUSTAIN);
            assert_eq!(r, Some(Response::Bounce));
        }
    }

    #[test]
    fn test_falling_enter_responses() {
        let mut player = falling_player();
        assert_eq!(
            resolve_contact(ContactPhase::Enter, ContactKind::Passable, &mut player, true, DT, SUSTAIN),
            Some(Response::Shatter { invincible: false })
        );
        assert_eq!(
            resolve_contact(ContactPhase::Enter, ContactKind::Finish, &mut player, true, DT, SUSTAIN),
            Some(Response::Complete)
        );
        assert_eq!(
            resolve_contact(ContactPhase::Enter, ContactKind::Finish, &mut player, false, DT, SUSTAIN),
            None
        );

        player.invincibility.timer = 0.6;
        assert_eq!(
            resolve_contact(ContactPhase::Enter, ContactKind::Hazard, &mut player, true, DT, SUSTAIN),
            Some(Response::Fail)
        );
        assert!(player.failed_contact);
        assert_eq!(player.invincibility.timer, 0.0);
    }

    #[test]
    fn test_invincible_hazard_enter_shatters() {
        let mut player = falling_player();
        player.invincibility.active = true;
        player.invincibility.timer = 1.0;
        assert_eq!(
            resolve_contact(ContactPhase::Enter, ContactKind::Hazard, &mut player, true, DT, SUSTAIN),
            Some(Response::Shatter { invincible: true })
        );
        assert!(!player.failed_contact);
    }

    #[test]
    fn test_sustained_hazard_needs_prior_passable_stay() {
        let mut player = falling_player();

        // Hazard stay alone never fails
        for _ in 0..30 {
            let r = resolve_contact(ContactPhase::Stay, ContactKind::Hazard, &mut player, true, DT, SUSTAIN);
            assert_eq!(r, None);
        }

        // Passable stay arms the rule and resets the accumulator
        resolve_contact(ContactPhase::Stay, ContactKind::Passable, &mut player, true, DT, SUSTAIN);
        assert!(player.touched_passable);
        assert_eq!(player.fail_contact_secs, 0.0);

        let mut steps = 0;
        let outcome = loop {
            steps += 1;
            if let Some(r) =
                resolve_contact(ContactPhase::Stay, ContactKind::Hazard, &mut player, true, DT, SUSTAIN)
            {
                break r;
            }
            assert!(steps < 100);
        };
        assert_eq!(outcome, Response::Fail);
        assert!(player.fail_contact_secs >= SUSTAIN);
        assert!((12..=13).contains(&steps));
    }

    #[test]
    fn test_stay_on_finish_bounces() {
        let mut player = falling_player();
        assert_eq!(
            resolve_contact(ContactPhase::Stay, ContactKind::Finish, &mut player, true, DT, SUSTAIN),
            Some(Response::Bounce)
        );
    }

    #[test]
    fn test_slab_sweep() {
        let slab = Slab::centered(0.0, 0.1);
        // Falling through the top face
        assert!(slab.swept_by(0.2, 0.0, 1e-3));
        // Resting exactly on top
        assert!(slab.swept_by(0.05, 0.05, 1e-3));
        // Still above
        assert!(!slab.swept_by(0.3, 0.2, 1e-3));
        // Already below the top face
        assert!(!slab.swept_by(0.0, -0.1, 1e-3));
    }
}
