//! Per-tick input snapshot and input sources

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Logical keys pressed during this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Space / confirm
    pub confirm: bool,
    /// Pause toggle (edge-triggered by the loop)
    pub pause: bool,
    /// Skip forward one level (debug)
    pub next_level: bool,
    /// Skip back one level (debug)
    pub prev_level: bool,
    /// Leave the game
    pub quit: bool,
}

/// Keyboard / window backend, queried once per simulation tick
pub trait InputSource {
    fn poll(&mut self, dt: f32) -> TickInput;
}

/// Replays a fixed list of snapshots, then quits
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: std::collections::VecDeque<TickInput>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = TickInput>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _dt: f32) -> TickInput {
        self.frames.pop_front().unwrap_or(TickInput {
            quit: true,
            ..Default::default()
        })
    }
}

/// Demo mode - a seeded autopilot that taps confirm and wanders left/right
#[derive(Debug, Clone)]
pub struct DemoPilot {
    rng: Pcg32,
    elapsed: f32,
    duration: f32,
    steer_timer: f32,
    steer: i8,
    confirm_timer: f32,
    jump_timer: f32,
}

impl DemoPilot {
    /// Runs for `duration` seconds (0 = forever)
    pub fn new(seed: u64, duration: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            elapsed: 0.0,
            duration,
            steer_timer: 0.0,
            steer: 0,
            confirm_timer: 0.5,
            jump_timer: 1.0,
        }
    }
}

impl InputSource for DemoPilot {
    fn poll(&mut self, dt: f32) -> TickInput {
        self.elapsed += dt;
        let mut input = TickInput::default();
        if self.duration > 0.0 && self.elapsed >= self.duration {
            input.quit = true;
            return input;
        }

        self.steer_timer -= dt;
        if self.steer_timer <= 0.0 {
            self.steer = self.rng.random_range(-1..=1);
            self.steer_timer = self.rng.random_range(0.4..1.5);
        }
        input.left = self.steer < 0;
        input.right = self.steer > 0;

        // Short taps so prompts don't chain through on a held key
        self.confirm_timer -= dt;
        if self.confirm_timer <= 0.0 {
            input.confirm = true;
            self.confirm_timer = 1.0;
        }

        self.jump_timer -= dt;
        if self.jump_timer <= 0.0 {
            input.up = true;
            if self.jump_timer <= -0.15 {
                self.jump_timer = self.rng.random_range(0.8..2.5);
            }
        }
        input
    }
}
