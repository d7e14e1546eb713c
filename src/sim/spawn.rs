//! Actor factories
//!
//! Each factory assembles a fresh actor from behaviors and queues it; the
//! actor joins the live set at the next lifecycle pass.

use glam::Vec2;

use super::behaviors::{
    Anim, BrokenBlock, Colliding, DeathBlock, Drawing, GestureBlock, GestureSpec, Level,
    MoverBlock, MoverSpec, PlayerPause, PlayerStatus, Shaking, SleepingBlock, TextAnim,
    TextLabel, WhiteBlock, YellowBlock,
};
use super::actor::ActorId;
use super::game::Game;
use super::message::Message;
use crate::assets::Rgba;
use crate::consts::EFFECT_ZORDER;
use crate::error::Result;
use crate::level::{BehaviorSpec, BlockKind};

/// Floor tiles sway a few pixels sideways
const FLOOR_SWAY: MoverSpec = MoverSpec {
    vel: 1.0,
    dist: 8.0,
    dirx: 1.0,
    diry: 0.0,
};

/// A grid block of `kind` with its top-left at `pos`, decorated with `extras`
pub fn create_block(
    game: &mut Game,
    kind: BlockKind,
    pos: Vec2,
    extras: &[BehaviorSpec],
) -> Result<ActorId> {
    let mut actor = game.new_actor();
    let services = &mut game.services;
    let drawing = Drawing::new(&mut actor, services, Some(kind.image_name().as_str()), Some(pos), 0)?;
    actor.add_behavior(drawing);

    if kind == BlockKind::Floor {
        let mover = MoverBlock::new(&mut actor, &FLOOR_SWAY);
        actor.add_behavior(mover);
        actor.zorder = 0;
    } else {
        let colliding = Colliding::new(&mut actor);
        actor.add_behavior(colliding);
    }

    match kind {
        BlockKind::Broken => {
            let b = BrokenBlock::new(&mut actor, services)?;
            actor.add_behavior(b);
        }
        BlockKind::Yellow => {
            let gesture =
                GestureBlock::new(&mut actor, services, &GestureSpec::with_images("yblock", "yblock2"))?;
            actor.add_behavior(gesture);
            let yellow = YellowBlock::new(&mut actor, false);
            actor.add_behavior(yellow);
        }
        BlockKind::Sleeper => {
            let sleeper = SleepingBlock::new(&mut actor);
            actor.add_behavior(sleeper);
        }
        BlockKind::White => {
            let gesture =
                GestureBlock::new(&mut actor, services, &GestureSpec::with_images("wblock", "wblock2"))?;
            actor.add_behavior(gesture);
            actor.add_behavior(WhiteBlock);
        }
        BlockKind::Red => {
            actor.add_behavior(Shaking::new(services));
            let death = DeathBlock::new(&mut actor, false, 0.0);
            actor.add_behavior(death);
        }
        BlockKind::Killer => {
            let death = DeathBlock::new(&mut actor, false, 0.0);
            actor.add_behavior(death);
        }
        BlockKind::Plain | BlockKind::Metal | BlockKind::Floor => {}
    }

    for spec in extras {
        spec.attach(&mut actor, services)?;
    }
    Ok(game.add_actor(actor))
}

/// The avatar, waiting behind the first "Press Space" prompt
pub fn create_player(game: &mut Game, image: &str) -> Result<ActorId> {
    let mut actor = game.new_actor();
    let services = &mut game.services;
    let drawing = Drawing::new(&mut actor, services, Some(image), None, EFFECT_ZORDER)?;
    actor.add_behavior(drawing);
    let pause = PlayerPause::new(
        &mut actor,
        services,
        "Press Space",
        Rgba::MAGENTA,
        Message::PlayerSpawn,
    );
    actor.add_behavior(pause);
    actor.add_behavior(PlayerStatus::new());
    Ok(game.add_actor(actor))
}

/// The level actor, with the current catalog level already spawned
pub fn create_level(game: &mut Game) -> Result<ActorId> {
    let mut actor = game.new_actor();
    let mut level = Level::new(&game.services);
    level.load(game)?;
    actor.add_behavior(level);
    Ok(game.add_actor(actor))
}

/// One-shot frame animation `<anim>0..<anim>n-1` laid over the `t0` cell at `pos`
pub fn create_anim(game: &mut Game, pos: Vec2, anim: &str, frames: u32, period: f32) -> Result<ActorId> {
    let mut actor = game.new_actor();
    let services = &mut game.services;
    let drawing = Drawing::new(&mut actor, services, Some("t0"), Some(pos), EFFECT_ZORDER)?;
    actor.add_behavior(drawing);
    let anim = Anim::new(&mut actor, services, anim, frames, period)?;
    actor.add_behavior(anim);
    Ok(game.add_actor(actor))
}

/// Floating label centred on `center`, gone after `duration` seconds
pub fn create_text_anim(
    game: &mut Game,
    label: &TextLabel,
    center: Vec2,
    duration: f32,
    color: Rgba,
) -> Result<ActorId> {
    let mut actor = game.new_actor();
    let services = &mut game.services;
    let drawing = Drawing::new(&mut actor, services, None, None, EFFECT_ZORDER)?;
    actor.add_behavior(drawing);
    let text = TextAnim::new(&mut actor, services, label, center, duration, color);
    actor.add_behavior(text);
    Ok(game.add_actor(actor))
}

/// Level first, then the player, so the first spawn message finds the HUD
pub fn start_game(game: &mut Game) -> Result<()> {
    let level = create_level(game)?;
    let player = create_player(game, "blocky")?;
    log::info!("Game started (level {:?}, player {:?})", level, player);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::game::tests::game;

    #[test]
    fn test_block_kinds_get_their_behaviors() {
        let mut game = game();
        let cases: [(BlockKind, &[&str]); 5] = [
            (BlockKind::White, &["white_block", "gesture_block", "colliding", "drawing"]),
            (BlockKind::Yellow, &["yellow_block", "gesture_block", "colliding", "drawing"]),
            (BlockKind::Red, &["death_block", "shaking", "colliding", "drawing"]),
            (BlockKind::Floor, &["mover_block", "drawing"]),
            (BlockKind::Plain, &["colliding", "drawing"]),
        ];
        for (kind, names) in cases {
            let id = create_block(&mut game, kind, Vec2::new(64.0, 32.0), &[]).unwrap();
            let actor = game.actor(id).unwrap();
            assert_eq!(actor.behavior_names(), names.to_vec(), "{kind:?}");
        }
    }

    #[test]
    fn test_block_position_and_collidability() {
        let mut game = game();
        let floor = create_block(&mut game, BlockKind::Floor, Vec2::new(0.0, 448.0), &[]).unwrap();
        let wall = create_block(&mut game, BlockKind::Metal, Vec2::new(32.0, 64.0), &[]).unwrap();
        let floor = game.actor(floor).unwrap();
        assert!(!floor.collidable);
        assert_eq!(floor.zorder, 0);
        let wall = game.actor(wall).unwrap();
        assert!(wall.collidable);
        assert_eq!(wall.pos, Vec2::new(32.0, 64.0));
        assert_eq!(wall.image_name, "mblock");
    }

    #[test]
    fn test_extras_are_attached_after_base_behaviors() {
        let mut game = game();
        let id = create_block(
            &mut game,
            BlockKind::Plain,
            Vec2::ZERO,
            &[BehaviorSpec::Shaking, BehaviorSpec::BrokenBlock],
        )
        .unwrap();
        assert_eq!(
            game.actor(id).unwrap().behavior_names(),
            vec!["broken_block", "shaking", "colliding", "drawing"]
        );
    }

    #[test]
    fn test_start_game_queues_level_blocks_and_player() {
        let mut game = game();
        start_game(&mut game).unwrap();
        assert!(game.find_with_behavior("level").is_some());
        let player = game.find_with_behavior("player_status").unwrap();
        assert_eq!(game.pending_ids().last(), Some(&player));
        assert!(game.live_ids().is_empty());
    }

    #[test]
    fn test_anim_is_queued_as_effect() {
        let mut game = game();
        let id = create_anim(&mut game, Vec2::new(100.0, 100.0), "x", 6, 0.02).unwrap();
        let actor = game.actor(id).unwrap();
        assert!(actor.has_behavior("anim"));
        assert_eq!(actor.zorder, EFFECT_ZORDER);
    }
}
