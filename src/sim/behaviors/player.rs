//! Player avatar: physics, the "press space" prompts and score keeping

use glam::Vec2;

use super::sprite::{FONT_NAME, TextLabel};
use crate::assets::{ImageHandle, Rgba};
use crate::consts::{BLAST_TIME, BOUNCE_COOLDOWN, DEATH_PENALTY, HUD_ZORDER};
use crate::error::Result;
use crate::sim::actor::{Actor, Behavior, Capability};
use crate::sim::game::{Ctx, Services};
use crate::sim::message::Message;
use crate::sim::motion::{Facing, Motion, Obstacle};
use crate::sim::rect::Rect;
use crate::sim::spawn;

/// Bouncing avatar driven by the arrow keys
pub struct Player {
    motion: Motion,
    /// Facing left (mirrored), facing right
    faces: [ImageHandle; 2],
}

impl Player {
    /// Placed standing on the bottom edge of the screen, at rest
    pub fn new(actor: &mut Actor, services: &Services) -> Result<Self> {
        let faces = [
            services
                .assets
                .load_image(&actor.image_name, 0, true, false)?,
            services.image(&actor.image_name)?,
        ];
        let screen = services.screen;
        let rect = Rect::with_mid_bottom(
            actor.size(),
            Vec2::new(screen.center().x, screen.bottom()),
        );
        actor.pos = rect.pos;
        Ok(Self {
            motion: Motion::new(),
            faces,
        })
    }

    fn pause(
        ctx: &mut Ctx<'_>,
        text: &str,
        color: Rgba,
        on_confirm: Message,
    ) -> Result<()> {
        ctx.finish();
        let (actor, services) = ctx.parts()?;
        let pause = PlayerPause::new(actor, services, text, color, on_confirm);
        actor.add_behavior(pause);
        Ok(())
    }
}

impl Behavior for Player {
    fn name(&self) -> &'static str {
        "player"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        let me = ctx.id();
        let (pos, size) = {
            let actor = ctx.actor_mut()?;
            actor.pos = self.motion.advance(actor.pos, dt);
            (actor.pos, actor.size())
        };

        let query = Rect::from_pos_size(pos, size);
        let obstacle = match ctx.collision(query.center(), &query) {
            Some(hit) => {
                ctx.send_to(
                    hit,
                    Message::Collision {
                        vec: self.motion.vel,
                        player: Some(me),
                    },
                )?;
                ctx.broadcast(Message::UpdateBounces { bounces: 1 })?;
                ctx.game().actor(hit).map(|a| Obstacle {
                    rect: a.rect(),
                    response: a.response,
                })
            }
            None => None,
        };

        let (screen, input) = {
            let services = ctx.services();
            (services.screen, services.input)
        };
        let out = self
            .motion
            .resolve(pos, size, &screen, obstacle.as_ref(), &input, dt);

        if let Some(point) = out.contact {
            spawn::create_anim(ctx.game(), point, "t", 6, 0.01)?;
            ctx.services().play_sound("click", 0.1);
        }

        let actor = ctx.actor_mut()?;
        actor.pos = out.pos;
        match out.facing {
            Some(Facing::Left) => actor.image = Some(ImageHandle::clone(&self.faces[0])),
            Some(Facing::Right) => actor.image = Some(ImageHandle::clone(&self.faces[1])),
            None => {}
        }

        if out.died {
            log::debug!("Player fell off at {:?}", out.pos);
            ctx.broadcast(Message::PlayerDie)?;
        }
        Ok(())
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        match msg {
            Message::PlayerDie => {
                let center = ctx.actor()?.center();
                Self::pause(ctx, "Press Space", Rgba::MAGENTA, Message::PlayerSpawn)?;
                spawn::create_anim(ctx.game(), center, "x", 6, 0.02)?;
                ctx.services().play_sound("xp", 0.1);
            }
            Message::LastBlock => {
                ctx.services().play_sound("bell", 0.1);
                Self::pause(ctx, "Stage Clear!", Rgba::GREEN, Message::StageClear)?;
                ctx.services().levels.advance(1);
                log::info!("Stage clear");
            }
            Message::StageClear => {
                Self::pause(ctx, "Press Space", Rgba::MAGENTA, Message::PlayerSpawn)?;
            }
            Message::BlastPlayer {
                vec,
                power,
                origin,
                blast_time,
            } => {
                if let Some(origin) = origin {
                    let actor = ctx.actor_mut()?;
                    actor.pos = *origin - actor.size() / 2.0;
                }
                self.motion
                    .blast(*vec, *power, blast_time.unwrap_or(BLAST_TIME));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Hides the avatar behind a centered prompt until confirm is pressed, then
/// brings the [`Player`] back and broadcasts `on_confirm`
pub struct PlayerPause {
    prompt: Option<(ImageHandle, Rect)>,
    on_confirm: Message,
}

impl PlayerPause {
    pub fn new(
        actor: &mut Actor,
        services: &Services,
        text: &str,
        color: Rgba,
        on_confirm: Message,
    ) -> Self {
        let font = services.assets.load_font(FONT_NAME, 24);
        let prompt = services
            .assets
            .render_text(font.as_ref(), text, color, Some(Rgba::BLACK))
            .map(|image| {
                let rect = Rect::centered(services.screen.center(), image.size());
                (image, rect)
            });
        actor.visible = false;
        Self { prompt, on_confirm }
    }
}

impl Behavior for PlayerPause {
    fn name(&self) -> &'static str {
        "player_pause"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) -> Result<()> {
        if let Some((image, rect)) = &self.prompt {
            ctx.draw(HUD_ZORDER, image, *rect);
        }
        if !ctx.services().input.confirm {
            return Ok(());
        }
        ctx.finish();
        {
            let (actor, services) = ctx.parts()?;
            let player = Player::new(actor, services)?;
            actor.add_behavior(player);
            actor.visible = true;
        }
        ctx.broadcast(self.on_confirm.clone())
    }
}

/// Points and bounce counters; places the avatar on spawn
#[derive(Debug, Default)]
pub struct PlayerStatus {
    points: i32,
    bounces: u32,
    bounce_cooldown: f32,
}

impl PlayerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    fn float_label(ctx: &mut Ctx<'_>, label: TextLabel) -> Result<()> {
        let center = ctx.actor()?.center();
        spawn::create_text_anim(ctx.game(), &label, center, 0.8, Rgba::WHITE)?;
        Ok(())
    }
}

impl Behavior for PlayerStatus {
    fn name(&self) -> &'static str {
        "player_status"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn update(&mut self, _ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.bounce_cooldown -= dt;
        Ok(())
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        let changed = match msg {
            Message::PlayerDie => {
                self.points = (self.points - DEATH_PENALTY).max(0);
                Self::float_label(ctx, TextLabel::Points(-DEATH_PENALTY))?;
                true
            }
            Message::UpdatePoints { points } => {
                self.points += points;
                Self::float_label(ctx, TextLabel::Points(*points))?;
                true
            }
            Message::UpdateBounces { bounces } if self.bounce_cooldown < 0.0 => {
                self.bounce_cooldown = BOUNCE_COOLDOWN;
                self.bounces += bounces;
                true
            }
            Message::PlayerSpawn => {
                let (actor, services) = ctx.parts()?;
                actor.pos = services.spawn_point + actor.size() / 2.0;
                false
            }
            _ => false,
        };
        if changed {
            let player = ctx.id();
            ctx.broadcast(Message::UpdatePlayerStats {
                player,
                points: self.points,
                bounces: self.bounces,
            })?;
        }
        Ok(())
    }
}
