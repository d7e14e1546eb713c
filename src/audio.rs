//! Sound playback
//!
//! Mixing is the output's business; the manager only applies volumes,
//! muting and the minimum spacing between two consecutive sounds.

use crate::assets::{Assets, SoundHandle};
use crate::consts::SOUND_SPACING;

/// Audio device / mixer
pub trait AudioOutput: Send {
    fn play(&mut self, sound: &SoundHandle, volume: f32);
}

/// Output that drops everything (headless runs, tests)
#[derive(Debug, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn play(&mut self, sound: &SoundHandle, volume: f32) {
        log::trace!("(silent) play {} at {:.2}", sound.name, volume);
    }
}

/// Audio manager for the game
pub struct AudioManager {
    output: Box<dyn AudioOutput>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    /// Seconds until another sound may start
    cooldown: f32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(SilentOutput)
    }
}

impl AudioManager {
    pub fn new(output: impl AudioOutput + 'static) -> Self {
        Self {
            output: Box::new(output),
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            cooldown: 0.0,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Advance the spacing timer (once per tick)
    pub fn tick(&mut self, dt: f32) {
        self.cooldown -= dt;
    }

    /// Play a named sound at `volume`.
    ///
    /// Returns false when skipped: too soon after the previous sound, muted,
    /// or the sound is missing.
    pub fn play(&mut self, assets: &Assets, name: &str, volume: f32) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        let vol = volume * self.effective_volume();
        if vol <= 0.0 {
            return false;
        }
        let Some(sound) = assets.load_sound(name) else {
            return false;
        };
        self.output.play(&sound, vol);
        self.cooldown = SOUND_SPACING;
        true
    }
}
