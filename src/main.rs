//! Block'em entry point
//!
//! Builds the world from settings and runs it headless under the demo
//! autopilot. Usage: `blockem [settings.json]`

use std::path::PathBuf;
use std::process::ExitCode;

use blockem::assets::{Assets, ProceduralAssets};
use blockem::audio::AudioManager;
use blockem::engine;
use blockem::input::DemoPilot;
use blockem::level::LevelCatalog;
use blockem::render::HeadlessDisplay;
use blockem::sim::{self, Game, Rect, Services};
use blockem::{Result, Settings};

fn build_game(settings: &Settings) -> Result<Game> {
    let assets = Assets::new(ProceduralAssets::new());
    assets.preload_sounds(&["click", "xp", "bell"]);

    let mut audio = AudioManager::default();
    audio.set_master_volume(settings.master_volume);
    audio.set_sfx_volume(settings.sfx_volume);
    audio.set_muted(settings.muted);

    let levels = match &settings.levels_dir {
        Some(dir) => LevelCatalog::load_dir(dir)?,
        None => LevelCatalog::builtin()?,
    }
    .with_start(settings.start_level);
    log::info!(
        "{} levels, starting at {}",
        levels.len(),
        levels.current_index()
    );

    let screen = Rect::new(
        0.0,
        0.0,
        settings.screen_width as f32,
        settings.screen_height as f32,
    );
    let services = Services::new(assets, audio, levels, screen, settings.seed);
    let mut game = Game::new(services);
    sim::start_game(&mut game)?;
    Ok(game)
}

fn run() -> Result<()> {
    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref())?;
    let mut game = build_game(&settings)?;

    let mut pilot = DemoPilot::new(settings.seed, settings.demo_seconds);
    let summary = engine::run(
        &mut game,
        &mut pilot,
        Box::new(HeadlessDisplay::new()),
        &settings,
    )?;
    log::info!(
        "Demo over after {} ticks ({} frames rendered)",
        summary.ticks,
        summary.rendered
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Block'em starting...");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
