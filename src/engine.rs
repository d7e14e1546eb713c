//! Simulation loop
//!
//! Runs the world on the calling thread at the simulation rate and hands each
//! finished frame to the render thread through a [`FrameSlot`]. The two loops
//! only meet at the slot.

use std::sync::Arc;

use crate::clock::FrameClock;
use crate::error::Result;
use crate::input::InputSource;
use crate::render::{Display, FrameSlot, RenderHandle};
use crate::settings::Settings;
use crate::sim::{Game, tick};

/// What a finished run did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    /// Simulation ticks that produced a frame
    pub ticks: u64,
    /// Frames the render thread presented
    pub rendered: u64,
    /// Simulated seconds (paused time excluded)
    pub sim_time: f32,
}

/// Drive `game` until the input source asks to quit
pub fn run(
    game: &mut Game,
    input: &mut impl InputSource,
    display: Box<dyn Display>,
    settings: &Settings,
) -> Result<RunSummary> {
    let slot = Arc::new(FrameSlot::new());
    let renderer = RenderHandle::spawn(
        Arc::clone(&slot),
        display,
        settings.screen_width,
        settings.screen_height,
        settings.render_hz,
    )?;
    let stats = renderer.stats();

    let mut clock = FrameClock::new();
    let mut summary = RunSummary::default();
    let result = loop {
        let elapsed = clock.tick(settings.sim_hz).as_secs_f32();
        let dt = if elapsed > 0.0 {
            elapsed.min(settings.max_dt)
        } else {
            settings.tick_dt()
        };
        let keys = input.poll(dt);
        if keys.quit {
            break Ok(());
        }
        if !renderer.is_running() {
            log::warn!("Render thread exited early");
            break Ok(());
        }

        game.loop_state.render_fps = stats.fps();
        match tick(game, keys, dt) {
            Ok(Some(frame)) => {
                summary.ticks += 1;
                summary.sim_time += dt;
                slot.publish(frame);
            }
            Ok(None) => {}
            Err(e) => break Err(e),
        }
    };

    // Stop the render thread before reporting either outcome
    let shutdown = renderer.shutdown();
    summary.rendered = stats.frames();
    result?;
    shutdown?;
    log::info!(
        "Run finished: {} ticks, {} frames rendered, {:.1}s simulated",
        summary.ticks,
        summary.rendered,
        summary.sim_time
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ScriptedInput, TickInput};
    use crate::render::HeadlessDisplay;
    use crate::sim::game::tests::game;
    use crate::GameError;
    use crate::sim::actor::{Behavior, Capability};
    use crate::sim::game::Ctx;
    use crate::sim::spawn;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn fast_settings() -> Settings {
        Settings {
            sim_hz: 240,
            render_hz: 240,
            ..Settings::default()
        }
    }

    #[test]
    fn test_run_plays_script_then_quits() {
        let mut game = game();
        spawn::start_game(&mut game).unwrap();
        let confirm = TickInput {
            confirm: true,
            ..Default::default()
        };
        let mut script = ScriptedInput::new(
            std::iter::repeat_n(TickInput::default(), 10)
                .chain([confirm])
                .chain(std::iter::repeat_n(TickInput::default(), 20)),
        );
        let display = HeadlessDisplay::new();
        let presented = display.counter();

        let summary = run(&mut game, &mut script, Box::new(display), &fast_settings()).unwrap();
        assert_eq!(summary.ticks, 31);
        assert_eq!(game.loop_state().ticks(), 31);
        assert!(summary.sim_time > 0.0);
        assert_eq!(
            summary.rendered,
            presented.load(std::sync::atomic::Ordering::Relaxed)
        );
        assert!(game.find_with_behavior("player").is_some());
    }

    #[test]
    fn test_paused_ticks_publish_nothing() {
        let mut game = game();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        let mut script = ScriptedInput::new(
            [TickInput::default(), pause]
                .into_iter()
                .chain(std::iter::repeat_n(TickInput::default(), 5)),
        );
        let summary = run(
            &mut game,
            &mut script,
            Box::new(HeadlessDisplay::new()),
            &fast_settings(),
        )
        .unwrap();
        assert_eq!(summary.ticks, 1);
        assert!(game.loop_state().paused());
    }

    struct Failing;

    impl Display for Failing {
        fn present(&mut self, _canvas: &crate::render::Canvas) -> Result<()> {
            Err(crate::GameError::Display("window closed".into()))
        }
    }

    #[test]
    fn test_display_failure_surfaces_on_shutdown() {
        let mut game = game();
        let mut script = ScriptedInput::new(std::iter::repeat_n(TickInput::default(), 50));
        let err = run(&mut game, &mut script, Box::new(Failing), &fast_settings()).unwrap_err();
        assert!(matches!(err, crate::GameError::Display(_)));
    }

    /// Fails on its first update
    struct Faulty;

    impl Behavior for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }
        fn capability(&self) -> Capability {
            Capability::UpdateOnly
        }
        fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) -> Result<()> {
            Err(GameError::UnknownActor(ctx.id()))
        }
    }

    #[test]
    fn test_behavior_error_stops_renderer_and_surfaces() {
        let mut game = game();
        let mut actor = game.new_actor();
        actor.add_behavior(Faulty);
        let id = game.add_actor(actor);
        let mut script = ScriptedInput::new(std::iter::repeat_n(TickInput::default(), 50));
        let display = HeadlessDisplay::new();
        let presented = display.counter();

        let err = run(&mut game, &mut script, Box::new(display), &fast_settings()).unwrap_err();
        assert!(matches!(err, GameError::UnknownActor(failed) if failed == id));
        // Admitted on the first tick, failed on the second
        assert_eq!(game.loop_state().ticks(), 1);

        // The render thread is joined before run returns
        let frames = presented.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(presented.load(Ordering::Relaxed), frames);

        assert!(game.actor(id).unwrap().has_behavior("faulty"));
    }
}
