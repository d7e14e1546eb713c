//! Fixed timestep simulation tick
//!
//! One tick runs the lifecycle in a fixed order: input, update every live
//! actor, admit actors created during the tick, then collect the frame.
//! Actors created during tick N are first updated in tick N+1.

use super::game::Game;
use super::message::Message;
use crate::consts::{DIAGNOSTICS_INTERVAL, LEVEL_SKIP_REPEAT, MAX_TICK_DT};
use crate::error::Result;
use crate::input::TickInput;
use crate::render::RenderBuffer;

/// Loop bookkeeping carried between ticks
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    ticks: u64,
    paused: bool,
    /// Pause key was down last tick
    pause_held: bool,
    level_skip_cooldown: f32,
    diagnostics_timer: f32,
    /// Latest render-thread rate, for the diagnostics line
    pub(crate) render_fps: f32,
}

impl LoopState {
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Flip pause on the key's rising edge
    fn toggle_pause(&mut self, pressed: bool) {
        if pressed && !self.pause_held {
            self.paused = !self.paused;
            log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
        }
        self.pause_held = pressed;
    }
}

impl Game {
    pub fn loop_state(&self) -> &LoopState {
        &self.loop_state
    }
}

/// Advance the world by one step of `dt` seconds
///
/// Returns the frame's draw commands, or `None` while paused.
pub fn tick(game: &mut Game, input: TickInput, dt: f32) -> Result<Option<RenderBuffer>> {
    let dt = dt.clamp(0.0, MAX_TICK_DT);

    game.loop_state.toggle_pause(input.pause);
    if game.loop_state.paused {
        return Ok(None);
    }

    game.services.input = input;
    game.services.audio.tick(dt);
    report_diagnostics(game, dt);
    skip_levels(game, input, dt)?;

    game.update_live(dt)?;
    game.admit_pending();

    game.loop_state.ticks += 1;
    let commands = game.services.take_commands();
    Ok(Some(RenderBuffer::new(game.loop_state.ticks, commands)))
}

/// Debug keys: jump one level forward or back, at most every half second
fn skip_levels(game: &mut Game, input: TickInput, dt: f32) -> Result<()> {
    let state = &mut game.loop_state;
    state.level_skip_cooldown = (state.level_skip_cooldown - dt).max(0.0);
    if state.level_skip_cooldown > 0.0 {
        return Ok(());
    }
    let step = match (input.next_level, input.prev_level) {
        (true, false) => 1,
        (false, true) => -1,
        _ => return Ok(()),
    };
    state.level_skip_cooldown = LEVEL_SKIP_REPEAT;
    game.services.levels.advance(step);
    log::info!("Skipping to level {}", game.services.levels.current_index());
    game.send_message(&Message::StageClear)
}

fn report_diagnostics(game: &mut Game, dt: f32) {
    let state = &mut game.loop_state;
    state.diagnostics_timer += dt;
    if state.diagnostics_timer < DIAGNOSTICS_INTERVAL {
        return;
    }
    state.diagnostics_timer = 0.0;
    let (ticks, render_fps) = (state.ticks, state.render_fps);
    log::debug!(
        "tick {}: {} live, {} pending, render {:.1} fps",
        ticks,
        game.live_ids().len(),
        game.pending_ids().len(),
        render_fps
    );
}
