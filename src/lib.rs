//! Block'em - a bouncing-block arcade game
//!
//! Core modules:
//! - `sim`: Actor/behavior simulation (composition, messages, collisions, player physics)
//! - `render`: Draw command buffers and the render thread hand-off
//! - `engine`: Simulation loop wiring the two clocks together
//! - `level`: Level descriptions and the behavior registry
//! - `assets`: Image/sound/font lookup with caching

pub mod assets;
pub mod audio;
pub mod clock;
pub mod engine;
pub mod error;
pub mod input;
pub mod level;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Default simulation rate (ticks per second)
    pub const SIM_HZ: u32 = 60;
    /// Default render rate (frames per second)
    pub const RENDER_HZ: u32 = 60;
    /// Largest dt fed to a tick, prevents huge jumps after stalls
    pub const MAX_TICK_DT: f32 = 0.1;

    /// Viewport dimensions
    pub const SCREEN_WIDTH: u32 = 640;
    pub const SCREEN_HEIGHT: u32 = 480;

    /// Level grid
    pub const CELL_SIZE: f32 = 32.0;
    pub const GRID_COLS: usize = 20;
    pub const GRID_ROWS: usize = 15;
    /// Row holding the decorative floor tiles
    pub const FLOOR_ROW: i32 = 14;

    /// Player physics
    pub const GRAVITY: f32 = 4.9;
    pub const GRAVITY_SCALE: f32 = 200.0;
    pub const HORIZONTAL_DAMPING: f32 = 2.0;
    pub const VERTICAL_DAMPING: f32 = 3.0;
    pub const STEER_ACCEL: f32 = 600.0;
    pub const JUMP_ACCEL: f32 = 1000.0;
    pub const DIVE_ACCEL: f32 = 3000.0;
    pub const MAX_HORIZONTAL_SPEED: f32 = 1200.0;
    /// Air time assigned after bouncing off a ceiling
    pub const CEILING_AIR_TIME: f32 = 0.2;
    /// Upward bounces lose half their speed
    pub const FLOOR_RESTITUTION: f32 = 0.5;

    /// Knock-back defaults
    pub const BLAST_POWER: f32 = 500.0;
    pub const BLAST_TIME: f32 = 0.1;

    /// Seconds between two sounds
    pub const SOUND_SPACING: f32 = 0.1;
    /// Seconds between two bounce-counter increments
    pub const BOUNCE_COOLDOWN: f32 = 0.2;
    /// Points lost on death
    pub const DEATH_PENALTY: i32 = 5;
    /// Key repeat guard for level skipping
    pub const LEVEL_SKIP_REPEAT: f32 = 0.5;
    /// Diagnostics reporting interval (seconds)
    pub const DIAGNOSTICS_INTERVAL: f32 = 3.0;

    /// HUD draw priority
    pub const HUD_ZORDER: i32 = 10;
    /// Effects and the player
    pub const EFFECT_ZORDER: i32 = 9;
}
