//! Invincibility resource
//!
//! Charges while the player keeps falling cleanly, drains otherwise. A full
//! charge turns the shield on; the shield then drains on its own until empty.

use serde::{Deserialize, Serialize};

use crate::tuning::PlayerTuning;

/// Shield state change reported by `Invincibility::update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvincibilityChange {
    Activated,
    Deactivated,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invincibility {
    /// Charge in [0, duration]
    pub timer: f32,
    /// Shield is up
    pub active: bool,
}

impl Invincibility {
    /// Advance one step. `charging` is true while falling with no failed
    /// contact since the input was last released.
    pub fn update(
        &mut self,
        dt: f32,
        charging: bool,
        tuning: &PlayerTuning,
    ) -> Option<InvincibilityChange> {
        let duration = tuning.invincibility_duration;

        if self.active {
            self.timer -= dt * tuning.shield_deactivation_rate;
            if self.timer <= 0.0 {
                self.timer = 0.0;
                self.active = false;
                return Some(InvincibilityChange::Deactivated);
            }
            return None;
        }

        if charging {
            self.timer += dt * tuning.fall_timer_increment_rate;
        } else {
            self.timer -= dt * tuning.fall_timer_decrement_rate;
        }
        self.timer = self.timer.clamp(0.0, duration);

        if self.timer >= duration {
            self.timer = duration;
            self.active = true;
            return Some(InvincibilityChange::Activated);
        }
        None
    }

    /// Meter fill ratio (0-1)
    pub fn fill(&self, duration: f32) -> f32 {
        if duration <= 0.0 {
            0.0
        } else {
            (self.timer / duration).clamp(0.0, 1.0)
        }
    }

    pub fn meter_visible(&self, threshold: f32) -> bool {
        self.active || self.timer >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 120.0;

    #[test]
    fn test_charges_to_activation() {
        let tuning = PlayerTuning::default();
        let mut inv = Invincibility::default();
        let mut activated_at = None;
        for step in 0..400 {
            if inv.update(DT, true, &tuning) == Some(InvincibilityChange::Activated) {
                activated_at = Some(step);
                break;
            }
        }
        // 1.0 / 0.8 = 1.25 s of clean falling
        let step = activated_at.expect("should activate");
        assert!((148..=152).contains(&step), "activated at {step}");
        assert!(inv.active);
        assert_eq!(inv.timer, tuning.invincibility_duration);
    }

    #[test]
    fn test_shield_drains_then_deactivates() {
        let tuning = PlayerTuning::default();
        let mut inv = Invincibility {
            timer: tuning.invincibility_duration,
            active: true,
        };
        // Charging input does not matter while active
        let mut steps = 0;
        while inv.update(DT, true, &tuning) != Some(InvincibilityChange::Deactivated) {
            steps += 1;
            assert!(steps < 1000);
        }
        assert!(!inv.active);
        assert_eq!(inv.timer, 0.0);
        // 1.0 / 0.35 ≈ 2.86 s
        assert!((340..=344).contains(&steps), "deactivated after {steps}");
    }

    #[test]
    fn test_drains_when_not_charging() {
        let tuning = PlayerTuning::default();
        let mut inv = Invincibility {
            timer: 0.5,
            active: false,
        };
        inv.update(1.0, false, &tuning);
        assert!(inv.timer.abs() < 1e-6);
        inv.update(1.0, false, &tuning);
        assert_eq!(inv.timer, 0.0);
    }

    #[test]
    fn test_meter_visibility() {
        let inv = Invincibility {
            timer: 0.1,
            active: false,
        };
        assert!(!inv.meter_visible(0.15));
        let active = Invincibility {
            timer: 0.05,
            active: true,
        };
        assert!(active.meter_visible(0.15));
        assert!((active.fill(1.0) - 0.05).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_timer_stays_bounded(inputs in prop::collection::vec((any::<bool>(), 0.0f32..0.05), 0..600)) {
            let tuning = PlayerTuning::default();
            let duration = tuning.invincibility_duration;
            let mut inv = Invincibility::default();

            for (charging, dt) in inputs {
                let before = inv.clone();
                let change = inv.update(dt, charging, &tuning);
                prop_assert!(inv.timer >= 0.0 && inv.timer <= duration);

                match change {
                    Some(InvincibilityChange::Activated) => {
                        prop_assert!(!before.active);
                        prop_assert!(before.timer < duration);
                        prop_assert_eq!(inv.timer, duration);
                    }
                    Some(InvincibilityChange::Deactivated) => {
                        prop_assert!(before.active);
                        prop_assert!(before.timer > 0.0);
                        prop_assert_eq!(inv.timer, 0.0);
                    }
                    None => prop_assert_eq!(inv.active, before.active),
                }
            }
        }
    }
}
