//! Score bookkeeping
//!
//! Three horizons:
//! - current: points in the attempt in progress
//! - session: totals since the app (or last retry) started
//! - all-time: totals and best streak since launch, plus the persisted
//!   high-water marks in the preference store

use crate::persistence::{KeyValueStore, keys};

/// Score counters for one running app
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTracker {
    current: u32,
    session_total: u32,
    session_best_streak: u32,
    all_time_total: u32,
    all_time_best_streak: u32,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the persisted high-water marks
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let tracker = Self {
            all_time_total: store.get_count(keys::HIGH_SCORE),
            all_time_best_streak: store.get_count(keys::HIGHEST_CONSECUTIVE),
            ..Self::default()
        };
        log::info!(
            "Loaded scores: high {}, best streak {}",
            tracker.all_time_total,
            tracker.all_time_best_streak
        );
        tracker
    }

    pub fn add_score(&mut self, points: u32) {
        self.current = self.current.saturating_add(points);
        self.session_best_streak = self.session_best_streak.max(self.current);
    }

    /// Bank the current score into the session and all-time totals
    pub fn complete_level(&mut self) {
        self.session_total = self.session_total.saturating_add(self.current);
        self.all_time_best_streak = self.all_time_best_streak.max(self.current);
        self.all_time_total = self.all_time_total.saturating_add(self.current);
        log::info!(
            "Level banked {} points (session {}, all-time {})",
            self.current,
            self.session_total,
            self.all_time_total
        );
        self.reset_score();
    }

    pub fn reset_score(&mut self) {
        self.current = 0;
    }

    /// Raise the persisted high-water marks if this session beat them.
    /// Returns true if anything was written.
    pub fn check_and_update_scores(&self, store: &mut dyn KeyValueStore) -> bool {
        let mut changed = false;
        if self.session_total > store.get_count(keys::HIGH_SCORE) {
            store.set_count(keys::HIGH_SCORE, self.session_total);
            log::info!("New high score: {}", self.session_total);
            changed = true;
        }
        if self.session_best_streak > store.get_count(keys::HIGHEST_CONSECUTIVE) {
            store.set_count(keys::HIGHEST_CONSECUTIVE, self.session_best_streak);
            log::info!("New best streak: {}", self.session_best_streak);
            changed = true;
        }
        changed
    }

    pub fn reset_session_scores(&mut self) {
        self.session_total = 0;
        self.session_best_streak = 0;
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn session_total(&self) -> u32 {
        self.session_total
    }

    pub fn session_best_streak(&self) -> u32 {
        self.session_best_streak
    }

    pub fn all_time_total(&self) -> u32 {
        self.all_time_total
    }

    pub fn all_time_best_streak(&self) -> u32 {
        self.all_time_best_streak
    }

    pub fn high_score(&self, store: &dyn KeyValueStore) -> u32 {
        store.get_count(keys::HIGH_SCORE)
    }

    pub fn highest_consecutive(&self, store: &dyn KeyValueStore) -> u32 {
        store.get_count(keys::HIGHEST_CONSECUTIVE)
    }
}
