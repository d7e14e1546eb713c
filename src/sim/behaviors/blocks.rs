//! Block behaviors
//!
//! Stage progression lives here: a white block turns yellow when hit, a
//! yellow one turns into a shaking hazard, hazards kill the player unless
//! they are still blinking.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::sprite::{Blinking, Shaking, TextLabel};
use crate::assets::{ImageHandle, Rgba};
use crate::consts::{BLAST_POWER, BOUNCE_COOLDOWN};
use crate::error::Result;
use crate::sim::actor::{Actor, ActorId, Behavior, Capability};
use crate::sim::game::{Ctx, Services};
use crate::sim::message::Message;
use crate::sim::spawn;

/// Makes the actor a solid obstacle
pub struct Colliding;

impl Colliding {
    pub fn new(actor: &mut Actor) -> Self {
        actor.collidable = true;
        actor.response = true;
        Self
    }
}

impl Behavior for Colliding {
    fn name(&self) -> &'static str {
        "colliding"
    }

    fn capability(&self) -> Capability {
        Capability::Neither
    }
}

/// Breaks on the first hit, worth a point
pub struct BrokenBlock;

impl BrokenBlock {
    pub fn new(actor: &mut Actor, services: &Services) -> Result<Self> {
        actor.image = Some(services.image("bblock")?);
        Ok(Self)
    }
}

impl Behavior for BrokenBlock {
    fn name(&self) -> &'static str {
        "broken_block"
    }

    fn capability(&self) -> Capability {
        Capability::MessageOnly
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        if let Message::Collision { .. } = msg {
            ctx.actor_mut()?.terminated = true;
            ctx.broadcast(Message::UpdatePoints { points: 1 })?;
        }
        Ok(())
    }
}

/// `turning_block` registry parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurningSpec {
    /// Seconds between turns
    pub step: f32,
    /// Degrees per turn (counter-clockwise)
    pub angle: f32,
    /// Starting angle
    pub initial_angle: f32,
    /// Knock-back strength
    pub power: f32,
}

impl Default for TurningSpec {
    fn default() -> Self {
        Self {
            step: 2.0,
            angle: 90.0,
            initial_angle: 0.0,
            power: BLAST_POWER,
        }
    }
}

/// Rotating bumper: passes the player through but blasts it along the
/// direction it currently points to
pub struct TurningBlock {
    spec: TurningSpec,
    base_image: String,
    angle: f32,
    next_turn: f32,
    cooldown: f32,
}

impl TurningBlock {
    pub fn new(actor: &mut Actor, services: &Services, spec: &TurningSpec) -> Result<Self> {
        actor.response = false;
        let mut block = Self {
            spec: spec.clone(),
            base_image: actor.image_name.clone(),
            angle: 0.0,
            next_turn: spec.step,
            cooldown: 0.0,
        };
        if spec.initial_angle != 0.0 {
            block.angle = spec.initial_angle;
            block.turn(actor, services)?;
        }
        Ok(block)
    }

    fn turn(&self, actor: &mut Actor, services: &Services) -> Result<()> {
        if self.base_image.is_empty() {
            return Ok(());
        }
        let image =
            services
                .assets
                .load_image(&self.base_image, self.angle.round() as i32, false, false)?;
        actor.set_image_centered(image);
        Ok(())
    }

    /// Unit vector the bumper points to (up at angle 0)
    pub fn direction(&self) -> Vec2 {
        let r = self.angle.to_radians();
        Vec2::new(-r.sin(), -r.cos())
    }
}

impl Behavior for TurningBlock {
    fn name(&self) -> &'static str {
        "turning_block"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.cooldown -= dt;
        self.next_turn -= dt;
        if self.next_turn <= 0.0 {
            self.angle += self.spec.angle;
            self.next_turn = self.spec.step;
            let (actor, services) = ctx.parts()?;
            self.turn(actor, services)?;
        }
        Ok(())
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        if matches!(msg, Message::Collision { .. }) && self.cooldown < 0.0 {
            self.cooldown = BOUNCE_COOLDOWN;
            let origin = ctx.actor()?.center();
            ctx.broadcast(Message::BlastPlayer {
                vec: self.direction(),
                power: self.spec.power,
                origin: Some(origin),
                blast_time: None,
            })?;
        }
        Ok(())
    }
}

/// Seconds between two snoring "z" labels
const SNORE_PERIOD: f32 = 3.0;

/// Dozes until hit, then wakes up as a chasing hazard
pub struct SleepingBlock {
    snore: f32,
}

impl SleepingBlock {
    pub fn new(actor: &mut Actor) -> Self {
        actor.zorder = 7;
        Self { snore: 0.0 }
    }
}

impl Behavior for SleepingBlock {
    fn name(&self) -> &'static str {
        "sleeping_block"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.snore -= dt;
        if self.snore <= 0.0 {
            let center = ctx.actor()?.center();
            spawn::create_text_anim(
                ctx.game(),
                &TextLabel::Text("z".into()),
                center,
                1.5,
                Rgba::BLUE,
            )?;
            self.snore = SNORE_PERIOD;
        }
        Ok(())
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        if let Message::Collision {
            player: Some(player),
            ..
        } = msg
        {
            ctx.finish();
            let (actor, services) = ctx.parts()?;
            let death = DeathBlock::new(actor, true, 0.5);
            actor.add_behavior(death);
            let chase = ChasingBlock::new(*player);
            actor.add_behavior(chase);
            actor.image = Some(services.image("pblock2")?);
            log::debug!("Sleeper {:?} woke up", actor.id());
        }
        Ok(())
    }
}

/// Chase rounds give up beyond this distance (px)
const CHASE_RANGE: f32 = 280.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Chase {
    Waiting,
    Moving(Vec2),
}

/// Alternates waiting and lunging at the player; falls back asleep when the
/// player dies or gets away
pub struct ChasingBlock {
    player: ActorId,
    wait_time: f32,
    chase_time: f32,
    speed: f32,
    /// Chase rounds left; `None` chases forever
    rounds: Option<u32>,
    state: Chase,
    timer: f32,
}

impl ChasingBlock {
    pub fn new(player: ActorId) -> Self {
        Self::with_params(player, 2.0, 2.0, None, 38.0)
    }

    pub fn with_params(
        player: ActorId,
        wait_time: f32,
        chase_time: f32,
        rounds: Option<u32>,
        speed: f32,
    ) -> Self {
        Self {
            player,
            wait_time,
            chase_time,
            speed,
            rounds,
            state: Chase::Waiting,
            timer: wait_time,
        }
    }

    fn start_chase(&mut self, ctx: &mut Ctx<'_>) -> Result<()> {
        self.timer = self.chase_time;
        let me = ctx.actor()?.pos;
        let target = ctx.game().actor(self.player).map(|p| p.pos);
        let Some(target) = target else {
            return self.back_to_sleep(ctx);
        };
        let offset = target - me;
        self.state = Chase::Moving(offset.normalize_or_zero());
        if self.rounds == Some(0) || offset.length() > CHASE_RANGE {
            self.back_to_sleep(ctx)?;
        }
        Ok(())
    }

    fn start_wait(&mut self) {
        self.state = Chase::Waiting;
        self.timer = self.wait_time;
        if let Some(rounds) = self.rounds.as_mut() {
            *rounds = rounds.saturating_sub(1);
        }
    }

    fn back_to_sleep(&mut self, ctx: &mut Ctx<'_>) -> Result<()> {
        ctx.finish();
        ctx.send_self(Message::NoDeath)?;
        let (actor, services) = ctx.parts()?;
        let sleeping = SleepingBlock::new(actor);
        actor.add_behavior(sleeping);
        actor.image = Some(services.image("pblock")?);
        Ok(())
    }
}

impl Behavior for ChasingBlock {
    fn name(&self) -> &'static str {
        "chasing_block"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.timer -= dt;
        if self.timer <= 0.0 {
            match self.state {
                Chase::Moving(_) => self.start_wait(),
                Chase::Waiting => self.start_chase(ctx)?,
            }
        } else if let Chase::Moving(dir) = self.state {
            ctx.actor_mut()?.pos += dir * self.speed * dt;
        }
        Ok(())
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        if let Message::PlayerDie = msg {
            self.back_to_sleep(ctx)?;
        }
        Ok(())
    }
}

/// Must be cleared: the first hit scores and turns it yellow
pub struct WhiteBlock;

impl Behavior for WhiteBlock {
    fn name(&self) -> &'static str {
        "white_block"
    }

    fn capability(&self) -> Capability {
        Capability::MessageOnly
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        if let Message::Collision { .. } = msg {
            ctx.finish();
            ctx.send_self(Message::Turn2Yellow)?;
            ctx.broadcast(Message::UpdatePoints { points: 1 })?;
            ctx.broadcast(Message::UpdateRemains { remains: -1 })?;
            let actor = ctx.actor_mut()?;
            let yellow = YellowBlock::new(actor, true);
            actor.add_behavior(yellow);
        }
        Ok(())
    }
}

/// A second hit costs a point and turns it into a shaking hazard
pub struct YellowBlock;

impl YellowBlock {
    pub fn new(actor: &mut Actor, blink: bool) -> Self {
        if blink {
            let blinking = Blinking::new(actor, 0.8, 0.04);
            actor.add_behavior(blinking);
        } else {
            actor.blinking = false;
        }
        Self
    }
}

impl Behavior for YellowBlock {
    fn name(&self) -> &'static str {
        "yellow_block"
    }

    fn capability(&self) -> Capability {
        Capability::MessageOnly
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        if ctx.actor()?.blinking || !matches!(msg, Message::Collision { .. }) {
            return Ok(());
        }
        ctx.finish();
        {
            let (actor, services) = ctx.parts()?;
            actor.image = Some(services.image("rblock")?);
        }
        ctx.send_self(Message::Turn2Death)?;
        ctx.broadcast(Message::UpdatePoints { points: -1 })?;
        let (actor, services) = ctx.parts()?;
        let shaking = Shaking::new(services);
        actor.add_behavior(shaking);
        let death = DeathBlock::new(actor, true, 1.0);
        actor.add_behavior(death);
        Ok(())
    }
}

/// `death_block` registry parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathBlockSpec {
    /// Blink (harmless) for a while first
    pub blink: bool,
    pub blink_time: f32,
}

impl Default for DeathBlockSpec {
    fn default() -> Self {
        Self {
            blink: true,
            blink_time: 1.0,
        }
    }
}

/// Hazard: touching it kills the player, unless it is blinking
pub struct DeathBlock;

impl DeathBlock {
    pub fn new(actor: &mut Actor, blink: bool, blink_time: f32) -> Self {
        if blink {
            let blinking = Blinking::new(actor, blink_time, 0.04);
            actor.add_behavior(blinking);
        } else {
            actor.blinking = false;
        }
        Self
    }

    pub fn from_spec(actor: &mut Actor, spec: &DeathBlockSpec) -> Self {
        Self::new(actor, spec.blink, spec.blink_time)
    }
}

impl Behavior for DeathBlock {
    fn name(&self) -> &'static str {
        "death_block"
    }

    fn capability(&self) -> Capability {
        Capability::MessageOnly
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        if ctx.actor()?.blinking {
            return Ok(());
        }
        match msg {
            Message::Collision { .. } => ctx.broadcast(Message::PlayerDie)?,
            Message::NoDeath => ctx.finish(),
            _ => {}
        }
        Ok(())
    }
}

/// `alternate_death` registry parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternateDeathSpec {
    /// Harmless face
    pub img0: String,
    /// Solid face
    pub img1: String,
    /// Seconds harmless
    pub t0: f32,
    /// Seconds solid
    pub t1: f32,
    /// Non-zero starts solid
    pub alt: u32,
}

impl Default for AlternateDeathSpec {
    fn default() -> Self {
        Self {
            img0: "lblock".into(),
            img1: "kblock".into(),
            t0: 1.0,
            t1: 1.0,
            alt: 0,
        }
    }
}

/// Phases between a harmless ghost (not collidable) and a solid block
pub struct AlternateDeath {
    faces: [ImageHandle; 2],
    times: [f32; 2],
    solid: bool,
    timer: f32,
}

impl AlternateDeath {
    pub fn new(actor: &mut Actor, services: &Services, spec: &AlternateDeathSpec) -> Result<Self> {
        let mut behavior = Self {
            faces: [services.image(&spec.img0)?, services.image(&spec.img1)?],
            times: [spec.t0, spec.t1],
            solid: false,
            timer: 0.0,
        };
        behavior.set_phase(actor, spec.alt != 0);
        Ok(behavior)
    }

    fn set_phase(&mut self, actor: &mut Actor, solid: bool) {
        let idx = solid as usize;
        self.solid = solid;
        self.timer = self.times[idx];
        actor.image = Some(ImageHandle::clone(&self.faces[idx]));
        actor.collidable = solid;
    }
}

impl Behavior for AlternateDeath {
    fn name(&self) -> &'static str {
        "alternate_death"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.timer -= dt;
        if self.timer <= 0.0 {
            let solid = !self.solid;
            self.set_phase(ctx.actor_mut()?, solid);
        }
        Ok(())
    }
}
