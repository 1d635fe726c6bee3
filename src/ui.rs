//! HUD model
//!
//! Plain data describing what the screen overlays should show. The session
//! updates it from game events; the platform layer mirrors it into the DOM.

use crate::persistence::KeyValueStore;
use crate::score::ScoreTracker;
use crate::sim::{EffectPalette, GameState, PlayerState, Rgba};
use crate::tuning::PlayerTuning;

/// Meter color while the shield is up
pub const METER_HOT: Rgba = Rgba::rgb(1.0, 0.0, 0.0);

#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub score_text: String,
    pub current_level_text: String,
    pub next_level_text: String,
    /// Level progress bar fill (0-1)
    pub progress_fill: f32,

    pub home_screen_visible: bool,
    pub game_screen_visible: bool,

    /// Invincibility meter fill (0-1)
    pub meter_fill: f32,
    pub meter_visible: bool,
    /// Meter drawn in the hot color while the shield is up
    pub meter_hot: bool,
    /// "Power on" widget shown (otherwise "power off")
    pub power_on: bool,

    pub game_over_visible: bool,
    pub game_over_text: String,
    pub level_complete_visible: bool,
    pub level_complete_text: String,

    pub sound_enabled: bool,
    pub settings_panel_open: bool,

    /// Progress fill, level badges and the completion text
    pub accent: Rgba,
    /// Progress bar background
    pub accent_soft: Rgba,
}

impl Default for Hud {
    fn default() -> Self {
        Self {
            score_text: "0".to_string(),
            current_level_text: "1".to_string(),
            next_level_text: "2".to_string(),
            progress_fill: 0.0,
            home_screen_visible: true,
            game_screen_visible: false,
            meter_fill: 0.0,
            meter_visible: false,
            meter_hot: false,
            power_on: false,
            game_over_visible: false,
            game_over_text: String::new(),
            level_complete_visible: false,
            level_complete_text: String::new(),
            sound_enabled: true,
            settings_panel_open: false,
            accent: Rgba::WHITE,
            accent_soft: Rgba::WHITE,
        }
    }
}

impl Hud {
    /// Reset overlays for a freshly loaded level
    pub fn on_scene_loaded(&mut self, level: u32, palette: &EffectPalette, score: u32) {
        let sound_enabled = self.sound_enabled;
        *self = Self {
            sound_enabled,
            ..Self::default()
        };
        self.current_level_text = level.to_string();
        self.next_level_text = (level + 1).to_string();
        self.set_score(score);
        self.accent = palette.base;
        self.accent_soft = palette.base.lightened(0.5);
    }

    pub fn on_started(&mut self) {
        self.home_screen_visible = false;
        self.game_screen_visible = true;
    }

    pub fn set_score(&mut self, score: u32) {
        self.score_text = score.to_string();
    }

    pub fn set_progress(&mut self, fill: f32) {
        self.progress_fill = fill.clamp(0.0, 1.0);
    }

    pub fn set_power(&mut self, on: bool) {
        self.power_on = on;
        self.meter_hot = on;
    }

    /// Per-frame sync of the invincibility meter
    pub fn sync_frame(&mut self, state: &GameState, tuning: &PlayerTuning) {
        let inv = &state.player.invincibility;
        if state.phase == PlayerState::Playing {
            self.meter_fill = inv.fill(tuning.invincibility_duration);
            self.meter_visible = inv.meter_visible(tuning.meter_visible_threshold);
        } else {
            self.meter_visible = false;
        }
    }

    pub fn show_game_over(&mut self, scores: &ScoreTracker, store: &dyn KeyValueStore) {
        self.game_over_visible = true;
        self.refresh_game_over_text(scores, store);
    }

    pub fn refresh_game_over_text(&mut self, scores: &ScoreTracker, store: &dyn KeyValueStore) {
        self.game_over_text = format!(
            "Game Over!\nCurrent Score: {}\nHigh Score: {}\nSession High Score: {}\nHighest Consecutive Score: {}\nSession Highest Consecutive Score: {}",
            scores.current(),
            scores.high_score(store),
            scores.session_total(),
            scores.highest_consecutive(store),
            scores.session_best_streak(),
        );
    }

    pub fn show_level_complete(&mut self, level: u32) {
        self.level_complete_visible = true;
        self.level_complete_text = format!("Level {}\nCompleted", level);
    }

    pub fn toggle_settings_panel(&mut self) -> bool {
        self.settings_panel_open = !self.settings_panel_open;
        self.settings_panel_open
    }
}
