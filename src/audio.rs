//! Sound effects behind the player's sound toggle
//!
//! In the browser, clips are procedurally generated with the Web Audio API
//! (no asset files). Natively playback is only logged.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball bounced off a ring or the goal
    Bounce,
    /// Ring smashed by a normal fall
    Shatter,
    /// Ring smashed while invincible
    InvincibleShatter,
    /// Ball hit a hazard
    Death,
    /// Level completed
    Win,
}

impl SoundEffect {
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Bounce => "bounce",
            SoundEffect::Shatter => "shatter",
            SoundEffect::InvincibleShatter => "invincible_shatter",
            SoundEffect::Death => "death",
            SoundEffect::Win => "win",
        }
    }
}

/// Gated sound playback, owned by the session
pub struct SoundService {
    enabled: bool,
    master_volume: f32,
    sfx_volume: f32,
    #[cfg(target_arch = "wasm32")]
    backend: web_audio::WebAudio,
}

impl Default for SoundService {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SoundService {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            master_volume: 0.8,
            sfx_volume: 1.0,
            #[cfg(target_arch = "wasm32")]
            backend: web_audio::WebAudio::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flip the sound toggle, returning the new state
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        log::info!("Sound {}", if self.enabled { "enabled" } else { "disabled" });
        self.enabled
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Resume audio output (browsers require a user gesture)
    pub fn resume(&self) {
        #[cfg(target_arch = "wasm32")]
        self.backend.resume();
    }

    /// Play a clip at `volume` (0.0 - 1.0). Returns false when the toggle is off.
    pub fn play(&self, effect: SoundEffect, volume: f32) -> bool {
        if !self.enabled {
            log::debug!("Sound is disabled, skipping {}", effect.name());
            return false;
        }

        let vol = volume.clamp(0.0, 1.0) * self.master_volume * self.sfx_volume;
        #[cfg(target_arch = "wasm32")]
        self.backend.play(effect, vol);
        log::debug!("Played sound: {} at {:.2}", effect.name(), vol);
        true
    }
}

#[cfg(target_arch = "wasm32")]
mod web_audio {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;

    pub struct WebAudio {
        ctx: Option<AudioContext>,
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn play(&self, effect: SoundEffect, vol: f32) {
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Bounce => play_bounce(ctx, vol),
                SoundEffect::Shatter => play_shatter(ctx, vol),
                SoundEffect::InvincibleShatter => play_invincible_shatter(ctx, vol),
                SoundEffect::Death => play_death(ctx, vol),
                SoundEffect::Win => play_win(ctx, vol),
            }
        }
    }

    /// Oscillator routed through a gain node to the output
    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Soft rubbery thump that rises slightly
    fn play_bounce(ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 180.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(140.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(260.0, t + 0.08)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Brittle crack plus a low body
    fn play_shatter(ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = create_osc(ctx, 2400.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            for (i, freq) in [2400.0, 900.0, 3100.0, 600.0, 1800.0].iter().enumerate() {
                osc.frequency()
                    .set_value_at_time(*freq, t + i as f64 * 0.02)
                    .ok();
            }
            osc.start().ok();
            osc.stop_with_when(t + 0.14).ok();
        }

        if let Some((osc, gain)) = create_osc(ctx, 90.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.35, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.12).ok();
        }
    }

    /// Heavier smash with a shimmering tail
    fn play_invincible_shatter(ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = create_osc(ctx, 110.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(40.0, t + 0.25)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        for (i, freq) in [1400.0, 2100.0].iter().enumerate() {
            if let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Sine) {
                let start = t + i as f64 * 0.03;
                gain.gain().set_value_at_time(vol * 0.15, start).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, start + 0.2)
                    .ok();
                osc.start_with_when(start).ok();
                osc.stop_with_when(start + 0.25).ok();
            }
        }
    }

    /// Descending buzz
    fn play_death(ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 320.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.6)
            .ok();
        osc.frequency().set_value_at_time(320.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(45.0, t + 0.6)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.7).ok();
    }

    /// Rising arpeggio
    fn play_win(ctx: &AudioContext, vol: f32) {
        for (i, freq) in [523.0, 659.0, 784.0, 1047.0].iter().enumerate() {
            let delay = i as f64 * 0.09;
            if let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Triangle) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.35)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_service_skips_playback() {
        let mut sound = SoundService::new(false);
        assert!(!sound.play(SoundEffect::Bounce, 0.5));
        assert!(sound.toggle());
        assert!(sound.play(SoundEffect::Bounce, 0.5));
    }

    #[test]
    fn test_volume_clamped() {
        let mut sound = SoundService::new(true);
        sound.set_master_volume(3.0);
        sound.set_sfx_volume(-1.0);
        assert!(sound.play(SoundEffect::Win, 1.0));
    }
}
