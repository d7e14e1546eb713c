//! Game settings
//!
//! Read from an optional JSON file; every field falls back to its default,
//! so a settings file only needs the keys it changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_TICK_DT, RENDER_HZ, SCREEN_HEIGHT, SCREEN_WIDTH, SIM_HZ};
use crate::error::{GameError, Result};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Display ===
    pub screen_width: u32,
    pub screen_height: u32,
    /// Simulation ticks per second
    pub sim_hz: u32,
    /// Render thread frames per second
    pub render_hz: u32,
    /// Largest dt a single tick may consume
    pub max_dt: f32,

    // === Levels ===
    /// Directory of level files; the built-in set when unset
    pub levels_dir: Option<PathBuf>,
    /// Index of the first level played
    pub start_level: usize,
    /// Simulation RNG seed
    pub seed: u64,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Demo ===
    /// Seconds the headless autopilot plays before quitting
    pub demo_seconds: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            sim_hz: SIM_HZ,
            render_hz: RENDER_HZ,
            max_dt: MAX_TICK_DT,

            levels_dir: None,
            start_level: 0,
            seed: 0x5eed,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            demo_seconds: 20.0,
        }
    }
}

impl Settings {
    /// Load from `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&text, path)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(text: &str, path: &Path) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text).map_err(|source| GameError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings.sanitized())
    }

    /// Clamp rates and volumes into usable ranges
    fn sanitized(mut self) -> Self {
        self.sim_hz = self.sim_hz.clamp(1, 1000);
        self.render_hz = self.render_hz.clamp(1, 1000);
        self.max_dt = self.max_dt.clamp(0.001, MAX_TICK_DT);
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.demo_seconds = self.demo_seconds.max(0.0);
        self
    }

    /// Fixed step fed to every tick
    pub fn tick_dt(&self) -> f32 {
        (1.0 / self.sim_hz as f32).min(self.max_dt)
    }
}
