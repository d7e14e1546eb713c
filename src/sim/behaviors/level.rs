//! Level actor: builds the block field and draws the HUD

use glam::Vec2;

use super::sprite::FONT_NAME;
use crate::assets::{FontHandle, ImageHandle, Rgba};
use crate::consts::{CELL_SIZE, HUD_ZORDER};
use crate::error::Result;
use crate::sim::actor::{ActorId, Behavior, Capability};
use crate::sim::game::{Ctx, Game, Services};
use crate::sim::message::Message;
use crate::sim::rect::Rect;
use crate::sim::spawn;

const HUD_MARGIN: f32 = 10.0;

type Sprite = Option<(ImageHandle, Rect)>;

/// Owns the blocks of the current level, counts the white ones left and
/// shows name, points, remaining and bounces
pub struct Level {
    font: Option<FontHandle>,
    title_font: Option<FontHandle>,
    blocks: Vec<ActorId>,
    remaining: i32,
    title: Sprite,
    points: Sprite,
    remains: Sprite,
    bounces: Sprite,
}

impl Level {
    pub fn new(services: &Services) -> Self {
        let mut level = Self {
            font: services.assets.load_font(FONT_NAME, 10),
            title_font: services.assets.load_font(FONT_NAME, 12),
            blocks: Vec::new(),
            remaining: 0,
            title: None,
            points: None,
            remains: None,
            bounces: None,
        };
        level.set_points(services, 0);
        level.set_bounces(services, 0);
        level
    }

    /// Spawn the current catalog level and announce the spawn point
    pub fn load(&mut self, game: &mut Game) -> Result<()> {
        let (name, layout, index) = {
            let levels = &game.services.levels;
            let current = levels.current();
            (
                current.name.clone(),
                current.layout()?,
                levels.current_index(),
            )
        };
        self.title = Self::text(
            &game.services,
            self.title_font.as_ref(),
            &format!("{index}:{name}"),
            Rgba::WHITE,
            |size| Rect::from_pos_size(Vec2::splat(HUD_MARGIN), size),
        );

        self.remaining = layout.white_blocks;
        self.blocks.clear();
        for placement in &layout.placements {
            let pos = Vec2::new(placement.grid_x as f32, placement.grid_y as f32) * CELL_SIZE;
            let id = spawn::create_block(game, placement.kind, pos, &placement.extras)?;
            self.blocks.push(id);
        }
        let (sx, sy) = layout.spawn;
        game.services.spawn_point = Vec2::new(sx as f32, sy as f32) * CELL_SIZE;
        self.update_remains(&game.services);
        log::info!(
            "Level {}:{} loaded ({} blocks, {} to clear)",
            index,
            name,
            self.blocks.len(),
            self.remaining
        );
        game.send_message(&Message::PlayerSpawn)
    }

    fn text(
        services: &Services,
        font: Option<&FontHandle>,
        text: &str,
        color: Rgba,
        place: impl FnOnce(Vec2) -> Rect,
    ) -> Sprite {
        services
            .assets
            .render_text(font, text, color, None)
            .map(|image| {
                let rect = place(image.size());
                (image, rect)
            })
    }

    /// Right-aligned HUD line at `y`
    fn counter(&self, services: &Services, text: &str, y: f32) -> Sprite {
        let corner = Vec2::new(services.screen.right() - HUD_MARGIN, y);
        Self::text(services, self.font.as_ref(), text, Rgba::YELLOW, |size| {
            Rect::with_top_right(size, corner)
        })
    }

    fn set_points(&mut self, services: &Services, points: i32) {
        self.points = self.counter(services, &format!("P: {points}"), 10.0);
    }

    fn update_remains(&mut self, services: &Services) {
        self.remains = self.counter(services, &format!("R: {}", self.remaining), 21.0);
    }

    fn set_bounces(&mut self, services: &Services, bounces: u32) {
        self.bounces = self.counter(services, &format!("B: {bounces}"), 32.0);
    }
}

impl Behavior for Level {
    fn name(&self) -> &'static str {
        "level"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) -> Result<()> {
        for (image, rect) in [&self.title, &self.points, &self.remains, &self.bounces]
            .into_iter()
            .flatten()
        {
            ctx.draw(HUD_ZORDER, image, *rect);
        }
        Ok(())
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        match msg {
            Message::UpdatePlayerStats {
                points, bounces, ..
            } => {
                let services = ctx.services();
                self.set_points(services, *points);
                self.set_bounces(services, *bounces);
            }
            Message::UpdateRemains { remains } => {
                self.remaining += remains;
                if self.remaining == 0 {
                    ctx.broadcast(Message::LastBlock)?;
                }
                self.update_remains(ctx.services());
            }
            Message::StageClear => {
                let game = ctx.game();
                for &id in &self.blocks {
                    if let Some(block) = game.actor_mut(id) {
                        block.terminated = true;
                    }
                }
                self.load(game)?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::GRID_COLS;
    use crate::sim::game::tests::game;

    #[test]
    fn test_load_spawns_blocks_and_sets_spawn() {
        let mut game = game();
        let id = spawn::create_level(&mut game).unwrap();
        let layout = game.services.levels.current().layout().unwrap();
        // Level actor plus every placement
        assert_eq!(game.pending_ids().len(), layout.placements.len() + 1);
        assert!(game.pending_ids().len() > GRID_COLS + 2);
        let (sx, sy) = layout.spawn;
        assert_eq!(
            game.services.spawn_point,
            Vec2::new(sx as f32 * 32.0, sy as f32 * 32.0)
        );
        game.admit_pending();
        game.update_actor(id, 0.016).unwrap();
        assert_eq!(game.services.pending_commands(), 4);
    }

    #[test]
    fn test_last_white_block_announces_last_block() {
        let mut game = game();
        let id = spawn::create_level(&mut game).unwrap();
        game.admit_pending();
        let remaining = game.services.levels.current().layout().unwrap().white_blocks;
        assert!(remaining > 0);

        for _ in 0..remaining - 1 {
            game.send_message(&Message::UpdateRemains { remains: -1 }).unwrap();
        }
        // A stand-in player gets the stage-clear prompt
        let player = spawn::create_player(&mut game, "blocky").unwrap();
        game.admit_pending();
        game.services.input.confirm = true;
        game.update_actor(player, 0.016).unwrap();
        game.services.input.confirm = false;
        assert!(game.actor(player).unwrap().has_behavior("player"));

        game.send_message(&Message::UpdateRemains { remains: -1 }).unwrap();
        assert!(game.actor(player).unwrap().has_behavior("player_pause"));
        assert_eq!(game.services.levels.current_index(), 1);
        assert!(game.actor(id).is_some());
    }

    #[test]
    fn test_stage_clear_replaces_blocks() {
        let mut game = game();
        let level = spawn::create_level(&mut game).unwrap();
        game.admit_pending();
        let old: Vec<ActorId> = game
            .live_ids()
            .iter()
            .copied()
            .filter(|&id| id != level)
            .collect();

        game.services.levels.advance(1);
        game.send_message(&Message::StageClear).unwrap();
        assert!(old.iter().all(|id| game.actor(*id).unwrap().terminated));
        let expected = game.services.levels.current().layout().unwrap().placements.len();
        assert_eq!(game.pending_ids().len(), expected);

        game.update_live(0.016).unwrap();
        game.admit_pending();
        assert_eq!(game.live_ids().len(), expected + 1);
    }
}
