//! Application assembly
//!
//! A `Session` owns every service the game needs (preference store, score
//! tracker, sound, HUD, camera) and the currently loaded level. The platform
//! layer feeds it input and frame time; it runs the fixed-step simulation and
//! turns game events into score, sound and HUD updates.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio::{SoundEffect, SoundService};
use crate::camera::{CameraFollow, GoalColumn};
use crate::consts::SIM_DT;
use crate::persistence::{KeyValueStore, flush_logged, keys};
use crate::score::ScoreTracker;
use crate::settings::Settings;
use crate::sim::{self, GameEvent, GameState, ObstacleArchetype, TickInput, builtin_catalog};
use crate::tuning::Tuning;
use crate::ui::Hud;

/// Volume every clip is played at
const CLIP_VOLUME: f32 = 0.5;

pub struct Session {
    tuning: Tuning,
    catalog: Vec<ObstacleArchetype>,
    store: Box<dyn KeyValueStore>,
    scores: ScoreTracker,
    sound: SoundService,
    settings: Settings,
    state: GameState,
    hud: Hud,
    camera: CameraFollow,
    column: GoalColumn,
    /// Drives level generation and per-scene seeds
    scene_rng: Pcg32,
    scenes_loaded: u32,
}

impl Session {
    pub fn new(store: Box<dyn KeyValueStore>, tuning: Tuning, seed: u64) -> Self {
        let settings = Settings::load(store.as_ref());
        let mut sound = SoundService::new(settings.sound_enabled);
        sound.set_master_volume(settings.master_volume);
        sound.set_sfx_volume(settings.sfx_volume);

        let scores = ScoreTracker::load(store.as_ref());
        let catalog = builtin_catalog();
        let camera = CameraFollow::new(&tuning.camera);
        let hud = Hud {
            sound_enabled: settings.sound_enabled,
            ..Hud::default()
        };

        let mut session = Self {
            state: GameState::new(seed, 1, tuning.clone()),
            column: GoalColumn::fit(0.0, 0.0, 0.0),
            tuning,
            catalog,
            store,
            scores,
            sound,
            settings,
            hud,
            camera,
            scene_rng: Pcg32::seed_from_u64(seed),
            scenes_loaded: 0,
        };
        session.load_scene();
        session
    }

    /// Rebuild the level from the persisted preferences
    pub fn load_scene(&mut self) {
        let plan = sim::prepare(
            self.store.as_mut(),
            &mut self.scene_rng,
            &self.tuning.level,
            &self.catalog,
        );
        flush_logged(self.store.as_mut());

        let seed = self.scene_rng.random();
        self.state = GameState::from_plan(&plan, &self.catalog, self.tuning.clone(), seed);
        self.camera = CameraFollow::new(&self.tuning.camera);
        self.column = GoalColumn::fit(
            self.state.start_y,
            self.state.goal.y,
            self.tuning.camera.column_offset,
        );
        self.hud
            .on_scene_loaded(plan.level, &self.state.palette, self.scores.current());
        self.scenes_loaded += 1;
    }

    /// Run one fixed simulation step and apply its events.
    /// Returns the events the step produced.
    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        sim::tick(&mut self.state, input, SIM_DT);
        let events = self.state.drain_events();
        for event in &events {
            self.handle_event(*event);
        }
        events
    }

    /// Per-frame visual followers
    pub fn frame(&mut self, dt: f32) {
        self.camera
            .update(dt, self.state.player.y, self.state.goal.y);
        self.hud.sync_frame(&self.state, &self.tuning.player);
    }

    fn handle_event(&mut self, event: GameEvent) {
        log::debug!("Event: {:?}", event);
        match event {
            GameEvent::Started => self.hud.on_started(),
            GameEvent::Bounce => {
                self.sound.play(SoundEffect::Bounce, CLIP_VOLUME);
            }
            GameEvent::Shattered {
                points, invincible, ..
            } => {
                self.scores.add_score(points);
                let clip = if invincible {
                    SoundEffect::InvincibleShatter
                } else {
                    SoundEffect::Shatter
                };
                self.sound.play(clip, CLIP_VOLUME);
                self.hud.set_progress(self.state.progress());
                self.hud.set_score(self.scores.current());
            }
            GameEvent::InvincibilityOn => self.hud.set_power(true),
            GameEvent::InvincibilityOff => self.hud.set_power(false),
            GameEvent::Died => {
                // Text shows the attempt's score before it is cleared
                self.hud.show_game_over(&self.scores, self.store.as_ref());
                self.hud.set_power(false);
                self.scores.check_and_update_scores(self.store.as_mut());
                flush_logged(self.store.as_mut());
                self.scores.reset_score();
                self.sound.play(SoundEffect::Death, CLIP_VOLUME);
            }
            GameEvent::LevelCompleted => {
                self.sound.play(SoundEffect::Win, CLIP_VOLUME);
                self.hud.show_level_complete(self.state.level);
                self.hud.set_power(false);
                self.scores.complete_level();
                self.hud
                    .refresh_game_over_text(&self.scores, self.store.as_ref());
                self.hud.set_score(self.scores.current());
            }
            GameEvent::RetryRequested => self.retry(),
            GameEvent::AdvanceRequested => self.advance(),
        }
    }

    /// Reload the same level with a fresh session total
    pub fn retry(&mut self) {
        log::info!("Retrying level {}", self.state.level);
        self.scores.check_and_update_scores(self.store.as_mut());
        self.scores.reset_session_scores();
        flush_logged(self.store.as_mut());
        self.load_scene();
    }

    /// Move on to the next level
    pub fn advance(&mut self) {
        let next = sim::level::current_level(self.store.as_ref(), &self.tuning.level) + 1;
        log::info!("Advancing to level {}", next);
        self.store.set_count(keys::LEVEL, next);
        self.scores.check_and_update_scores(self.store.as_mut());
        flush_logged(self.store.as_mut());
        self.load_scene();
    }

    /// Delete every preference and start over from level 1
    pub fn wipe_and_restart(&mut self) {
        self.store.delete_all();
        self.scores.reset_score();
        log::info!("All preferences deleted");
        self.store.set_int(keys::LEVEL, 1);
        flush_logged(self.store.as_mut());
        self.load_scene();
    }

    /// Flip the sound toggle and remember it
    pub fn toggle_sound(&mut self) -> bool {
        let enabled = self.sound.toggle();
        self.settings.sound_enabled = enabled;
        self.settings.save(self.store.as_mut());
        flush_logged(self.store.as_mut());
        self.hud.sound_enabled = enabled;
        enabled
    }

    pub fn toggle_settings_panel(&mut self) -> bool {
        self.hud.toggle_settings_panel()
    }

    /// Resume audio after a user gesture
    pub fn resume_audio(&self) {
        self.sound.resume();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn scores(&self) -> &ScoreTracker {
        &self.scores
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn camera(&self) -> &CameraFollow {
        &self.camera
    }

    pub fn column(&self) -> GoalColumn {
        self.column
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn scenes_loaded(&self) -> u32 {
        self.scenes_loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::PlayerState;

    fn session() -> Session {
        Session::new(Box::new(MemoryStore::new()), Tuning::default(), 42)
    }

    fn press() -> TickInput {
        TickInput {
            press: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_session_loads_level_one() {
        let s = session();
        assert_eq!(s.state().level, 1);
        assert_eq!(s.state().phase, PlayerState::Ready);
        assert_eq!(s.state().total_groups, 16);
        assert_eq!(s.hud().current_level_text, "1");
        assert_eq!(s.hud().next_level_text, "2");
        assert!(s.hud().home_screen_visible);
        assert_eq!(s.store().get_int(keys::SAVED_LEVEL), Some(1));
        assert!((s.column().top() - s.state().start_y).abs() < 1e-5);
        assert_eq!(s.scenes_loaded(), 1);
    }

    #[test]
    fn test_column_spans_ball_start_to_goal() {
        let mut s = session();
        s.advance();
        let column = s.column();
        assert!((column.top() - s.state().start_y).abs() < 1e-4);
        assert!((column.bottom() - s.state().goal.y).abs() < 1e-4);

        let mut tuning = Tuning::default();
        tuning.camera.column_offset = 5.0;
        let shifted = Session::new(Box::new(MemoryStore::new()), tuning, 42);
        let base = session();
        assert!((shifted.column().center_y - base.column().center_y - 5.0).abs() < 1e-4);
        assert_eq!(shifted.column().half_height, base.column().half_height);
    }

    #[test]
    fn test_start_switches_screens() {
        let mut s = session();
        let events = s.tick(&press());
        assert_eq!(events, vec![GameEvent::Started]);
        assert!(!s.hud().home_screen_visible);
        assert!(s.hud().game_screen_visible);
    }

    #[test]
    fn test_shatter_scores_and_fills_progress() {
        let mut s = session();
        s.handle_event(GameEvent::Shattered {
            group_id: 1,
            points: 2,
            invincible: false,
        });
        s.handle_event(GameEvent::Shattered {
            group_id: 2,
            points: 1,
            invincible: true,
        });
        assert_eq!(s.scores().current(), 3);
        assert_eq!(s.scores().session_best_streak(), 3);
        assert_eq!(s.hud().score_text, "3");
    }

    #[test]
    fn test_death_records_streak_and_resets_score() {
        let mut s = session();
        s.handle_event(GameEvent::Shattered {
            group_id: 1,
            points: 6,
            invincible: false,
        });
        s.handle_event(GameEvent::Died);

        assert!(s.hud().game_over_visible);
        assert!(s.hud().game_over_text.contains("Current Score: 6"));
        assert_eq!(s.scores().current(), 0);
        assert_eq!(s.store().get_int(keys::HIGHEST_CONSECUTIVE), Some(6));
    }

    #[test]
    fn test_completion_banks_score() {
        let mut s = session();
        s.handle_event(GameEvent::Shattered {
            group_id: 1,
            points: 4,
            invincible: false,
        });
        s.handle_event(GameEvent::LevelCompleted);

        assert!(s.hud().level_complete_visible);
        assert_eq!(s.hud().level_complete_text, "Level 1\nCompleted");
        assert_eq!(s.scores().current(), 0);
        assert_eq!(s.scores().session_total(), 4);
    }

    #[test]
    fn test_advance_moves_to_next_level() {
        let mut s = session();
        s.handle_event(GameEvent::Shattered {
            group_id: 1,
            points: 4,
            invincible: false,
        });
        s.handle_event(GameEvent::LevelCompleted);
        s.handle_event(GameEvent::AdvanceRequested);

        assert_eq!(s.state().level, 2);
        assert_eq!(s.store().get_int(keys::LEVEL), Some(2));
        assert_eq!(s.store().get_int(keys::SAVED_LEVEL), Some(2));
        assert_eq!(s.store().get_int(keys::HIGH_SCORE), Some(4));
        assert_eq!(s.state().total_groups, 18);
        assert_eq!(s.hud().current_level_text, "2");
        assert!(!s.hud().level_complete_visible);
    }

    #[test]
    fn test_retry_keeps_level_layout() {
        let mut s = session();
        let colors = s.state().palette;
        let subset = s.store().get_string(keys::CURRENT_OBSTACLES);
        s.handle_event(GameEvent::Shattered {
            group_id: 1,
            points: 2,
            invincible: false,
        });
        s.handle_event(GameEvent::Died);
        s.handle_event(GameEvent::RetryRequested);

        assert_eq!(s.state().level, 1);
        assert_eq!(s.state().phase, PlayerState::Ready);
        assert_eq!(s.state().palette, colors);
        assert_eq!(s.store().get_string(keys::CURRENT_OBSTACLES), subset);
        assert_eq!(s.scores().session_best_streak(), 0);
        assert_eq!(s.scenes_loaded(), 2);
    }

    #[test]
    fn test_wipe_resets_to_level_one() {
        let mut store = MemoryStore::new();
        store.set_int(keys::LEVEL, 9);
        store.set_int(keys::HIGH_SCORE, 100);
        let mut s = Session::new(Box::new(store), Tuning::default(), 1);
        assert_eq!(s.state().level, 9);

        s.wipe_and_restart();
        assert_eq!(s.state().level, 1);
        assert_eq!(s.store().get_int(keys::LEVEL), Some(1));
        assert!(!s.store().has_key(keys::HIGH_SCORE));
    }

    #[test]
    fn test_sound_toggle_is_persisted() {
        let mut s = session();
        assert!(!s.toggle_sound());
        assert!(!s.hud().sound_enabled);
        assert!(!Settings::load(s.store()).sound_enabled);

        // A new session over the same preferences starts muted
        let mut store = MemoryStore::new();
        Settings {
            sound_enabled: false,
            ..Settings::default()
        }
        .save(&mut store);
        let s = Session::new(Box::new(store), Tuning::default(), 1);
        assert!(!s.hud().sound_enabled);
    }

    #[test]
    fn test_settings_panel_toggle() {
        let mut s = session();
        assert!(s.toggle_settings_panel());
        assert!(!s.toggle_settings_panel());
    }

    #[test]
    fn test_autopilot_moves_through_scenes() {
        let mut s = session();
        let auto = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..(120 * 60) {
            s.tick(&auto);
            s.frame(SIM_DT);
            if s.scenes_loaded() > 1 {
                break;
            }
        }
        assert!(s.scenes_loaded() > 1);
        assert!(s.camera().position.y <= 0.0);
    }
}
