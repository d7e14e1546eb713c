//! Presentation behaviors: drawing, frame animations, floating text and the
//! small motion/visibility effects blocks are decorated with

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::assets::{ImageHandle, Rgba};
use crate::error::Result;
use crate::sim::actor::{Actor, Behavior, Capability};
use crate::sim::game::{Ctx, Services};
use crate::sim::message::Message;

/// Font used by every text sprite
pub const FONT_NAME: &str = "type_writer.ttf";

/// Draws the actor's image at its position while visible
pub struct Drawing;

impl Drawing {
    /// Set up the sprite fields; `pos` overrides the default origin
    pub fn new(
        actor: &mut Actor,
        services: &Services,
        image: Option<&str>,
        pos: Option<Vec2>,
        zorder: i32,
    ) -> Result<Self> {
        actor.zorder = zorder;
        actor.visible = true;
        actor.image = None;
        actor.image_name.clear();
        actor.pos = Vec2::ZERO;
        if let Some(name) = image {
            actor.image = Some(services.image(name)?);
            actor.image_name = name.to_string();
        }
        if let Some(pos) = pos {
            actor.pos = pos;
        }
        Ok(Self)
    }
}

impl Behavior for Drawing {
    fn name(&self) -> &'static str {
        "drawing"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) -> Result<()> {
        let (actor, services) = ctx.parts()?;
        if !actor.visible {
            return Ok(());
        }
        if let Some(image) = &actor.image {
            services.draw(actor.zorder, image, actor.rect());
        }
        Ok(())
    }
}

/// Plays `<anim>0..<anim>n-1` once, then terminates the actor
pub struct Anim {
    frames: Vec<ImageHandle>,
    period: f32,
    timer: f32,
    current: usize,
}

impl Anim {
    pub fn new(
        actor: &mut Actor,
        services: &Services,
        anim: &str,
        frames: u32,
        period: f32,
    ) -> Result<Self> {
        let frames = (0..frames.max(1))
            .map(|i| services.image(&format!("{anim}{i}")))
            .collect::<Result<Vec<_>>>()?;
        actor.set_image_centered(ImageHandle::clone(&frames[0]));
        Ok(Self {
            frames,
            period,
            timer: period,
            current: 0,
        })
    }
}

impl Behavior for Anim {
    fn name(&self) -> &'static str {
        "anim"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.timer = self.period;
            self.current += 1;
            let actor = ctx.actor_mut()?;
            match self.frames.get(self.current) {
                Some(frame) => actor.set_image_centered(ImageHandle::clone(frame)),
                None => actor.terminated = true,
            }
        }
        Ok(())
    }
}

/// Text for a floating label
#[derive(Debug, Clone, PartialEq)]
pub enum TextLabel {
    /// Score delta: "+n" in green, negatives in red
    Points(i32),
    Text(String),
}

impl TextLabel {
    fn render(&self, color: Rgba) -> (String, Rgba) {
        match self {
            TextLabel::Points(p) if *p < 0 => (p.to_string(), Rgba::RED),
            TextLabel::Points(p) => (format!("+{p}"), Rgba::GREEN),
            TextLabel::Text(text) => (text.clone(), color),
        }
    }
}

/// Label drifting upwards for a while, then gone
pub struct TextAnim {
    remaining: f32,
}

/// Upward drift of floating labels (px/s)
const TEXT_DRIFT: f32 = 16.0;

impl TextAnim {
    pub fn new(
        actor: &mut Actor,
        services: &Services,
        label: &TextLabel,
        center: Vec2,
        duration: f32,
        color: Rgba,
    ) -> Self {
        let font = services.assets.load_font(FONT_NAME, 10);
        let (text, color) = label.render(color);
        actor.image = services
            .assets
            .render_text(font.as_ref(), &text, color, None);
        actor.pos = center - actor.size() / 2.0;
        Self {
            remaining: duration,
        }
    }
}

impl Behavior for TextAnim {
    fn name(&self) -> &'static str {
        "text_anim"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.remaining -= dt;
        let actor = ctx.actor_mut()?;
        if self.remaining <= 0.0 {
            actor.terminated = true;
        } else {
            actor.pos.y -= TEXT_DRIFT * dt;
        }
        Ok(())
    }
}

/// `blinking` registry parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkingSpec {
    /// Total blinking time (s)
    pub time: f32,
    /// Visibility toggle period (s)
    pub period: f32,
}

impl Default for BlinkingSpec {
    fn default() -> Self {
        Self {
            time: 1.0,
            period: 0.04,
        }
    }
}

/// Toggles visibility for a while; hazards hold fire meanwhile
pub struct Blinking {
    remaining: f32,
    period: f32,
    timer: f32,
}

impl Blinking {
    pub fn new(actor: &mut Actor, time: f32, period: f32) -> Self {
        actor.blinking = true;
        Self {
            remaining: time,
            period,
            timer: period,
        }
    }

    pub fn from_spec(actor: &mut Actor, spec: &BlinkingSpec) -> Self {
        Self::new(actor, spec.time, spec.period)
    }
}

impl Behavior for Blinking {
    fn name(&self) -> &'static str {
        "blinking"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        let actor = ctx.actor_mut()?;
        self.timer -= dt;
        if self.timer <= 0.0 {
            actor.visible = !actor.visible;
            self.timer = self.period;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            actor.visible = true;
            actor.blinking = false;
            ctx.finish();
        }
        Ok(())
    }
}

/// `mover_block` registry parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoverSpec {
    /// Phase speed (rad/s)
    pub vel: f32,
    /// Amplitude (px)
    pub dist: f32,
    pub dirx: f32,
    pub diry: f32,
}

impl Default for MoverSpec {
    fn default() -> Self {
        Self {
            vel: 2.0,
            dist: 64.0,
            dirx: 1.0,
            diry: 0.0,
        }
    }
}

/// Oscillates around the position it was created at: sine on x, cosine on y
pub struct MoverBlock {
    origin: Vec2,
    phase: f32,
    spec: MoverSpec,
}

impl MoverBlock {
    pub fn new(actor: &mut Actor, spec: &MoverSpec) -> Self {
        actor.zorder = 8;
        Self {
            origin: actor.pos,
            phase: 0.0,
            spec: spec.clone(),
        }
    }
}

impl Behavior for MoverBlock {
    fn name(&self) -> &'static str {
        "mover_block"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        let actor = ctx.actor_mut()?;
        actor.pos = self.origin
            + Vec2::new(
                self.phase.sin() * self.spec.dist * self.spec.dirx,
                self.phase.cos() * self.spec.dist * self.spec.diry,
            );
        self.phase += dt * self.spec.vel;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn random(rng: &mut impl Rng) -> Self {
        if rng.random_bool(0.5) { Axis::X } else { Axis::Y }
    }
}

const SHAKE_DURATION: f32 = 0.5;
const SHAKE_FREQUENCY: f32 = 64.0;
const SHAKE_AMPLITUDE: f32 = 4.0;

/// Waits a random while, then jitters along one axis for half a second
pub struct Shaking {
    wait: f32,
    /// `Some(origin)` while shaking
    shaking_from: Option<f32>,
    elapsed: f32,
    axis: Axis,
}

impl Shaking {
    pub fn new(services: &mut Services) -> Self {
        Self {
            wait: services.rng.random_range(5..=30) as f32,
            shaking_from: None,
            elapsed: 0.0,
            axis: Axis::random(&mut services.rng),
        }
    }
}

impl Behavior for Shaking {
    fn name(&self) -> &'static str {
        "shaking"
    }

    fn capability(&self) -> Capability {
        Capability::UpdateOnly
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        let (actor, services) = ctx.parts()?;
        let coord = match self.axis {
            Axis::X => &mut actor.pos.x,
            Axis::Y => &mut actor.pos.y,
        };
        match self.shaking_from {
            None => {
                self.wait -= dt;
                if self.wait <= 0.0 {
                    self.wait = services.rng.random_range(15..=30) as f32;
                    self.shaking_from = Some(*coord);
                }
            }
            Some(origin) => {
                self.elapsed += dt;
                *coord = origin + (self.elapsed * SHAKE_FREQUENCY).sin() * SHAKE_AMPLITUDE;
                if self.elapsed > SHAKE_DURATION {
                    *coord = origin;
                    self.elapsed = 0.0;
                    self.shaking_from = None;
                    self.axis = Axis::random(&mut services.rng);
                }
            }
        }
        Ok(())
    }
}

/// `gesture_block` registry parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSpec {
    pub img0: String,
    pub img1: String,
    /// Rest time range between gestures (whole seconds)
    pub rest_min: u32,
    pub rest_max: u32,
    /// Upper bound of a gesture's length (s)
    pub gesture_time: f32,
}

impl Default for GestureSpec {
    fn default() -> Self {
        Self {
            img0: "wblock".into(),
            img1: "wblock2".into(),
            rest_min: 10,
            rest_max: 25,
            gesture_time: 2.0,
        }
    }
}

impl GestureSpec {
    /// Defaults with a different image pair
    pub fn with_images(img0: &str, img1: &str) -> Self {
        Self {
            img0: img0.into(),
            img1: img1.into(),
            ..Default::default()
        }
    }
}

/// Flips to an alternate face now and then
pub struct GestureBlock {
    faces: [ImageHandle; 2],
    rest: (u32, u32),
    gesture_time: f32,
    gesturing: bool,
    timer: f32,
}

impl GestureBlock {
    pub fn new(actor: &mut Actor, services: &mut Services, spec: &GestureSpec) -> Result<Self> {
        let faces = [services.image(&spec.img0)?, services.image(&spec.img1)?];
        actor.image = Some(ImageHandle::clone(&faces[0]));
        let rest = (
            spec.rest_min.min(spec.rest_max),
            spec.rest_min.max(spec.rest_max),
        );
        Ok(Self {
            faces,
            rest,
            gesture_time: spec.gesture_time,
            gesturing: false,
            timer: services.rng.random_range(rest.0..=rest.1) as f32,
        })
    }
}

impl Behavior for GestureBlock {
    fn name(&self) -> &'static str {
        "gesture_block"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<()> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return Ok(());
        }
        let (actor, services) = ctx.parts()?;
        if self.gesturing {
            self.timer = services.rng.random_range(self.rest.0..=self.rest.1) as f32;
            actor.image = Some(ImageHandle::clone(&self.faces[0]));
        } else {
            self.timer = services.rng.random::<f32>() * self.gesture_time;
            actor.image = Some(ImageHandle::clone(&self.faces[1]));
        }
        self.gesturing = !self.gesturing;
        Ok(())
    }

    fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
        match msg {
            Message::Turn2Yellow => {
                let (actor, services) = ctx.parts()?;
                self.faces = [services.image("yblock")?, services.image("yblock2")?];
                actor.image = Some(ImageHandle::clone(&self.faces[0]));
            }
            Message::Turn2Death => ctx.finish(),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::game::tests::game;

    fn spawn_with<B: Behavior + 'static>(
        game: &mut crate::sim::Game,
        build: impl FnOnce(&mut Actor, &mut Services) -> B,
    ) -> crate::sim::ActorId {
        let mut actor = game.new_actor();
        actor.image = Some(game.services.image("lblock").unwrap());
        actor.pos = Vec2::new(64.0, 64.0);
        let behavior = build(&mut actor, &mut game.services);
        actor.add_behavior(behavior);
        let id = game.add_actor(actor);
        game.admit_pending();
        id
    }

    #[test]
    fn test_drawing_emits_command_only_when_visible() {
        let mut game = game();
        let id = spawn_with(&mut game, |a, s| {
            Drawing::new(a, s, Some("wblock"), Some(Vec2::new(32.0, 0.0)), 3).unwrap()
        });
        game.update_actor(id, 0.016).unwrap();
        let cmds = game.services.take_commands();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].zorder, 3);
        assert_eq!(cmds[0].rect.pos, Vec2::new(32.0, 0.0));

        game.actor_mut(id).unwrap().visible = false;
        game.update_actor(id, 0.016).unwrap();
        assert!(game.services.take_commands().is_empty());
    }

    #[test]
    fn test_anim_runs_frames_then_terminates() {
        let mut game = game();
        let id = spawn_with(&mut game, |a, s| Anim::new(a, s, "x", 3, 0.01).unwrap());
        let center = game.actor(id).unwrap().center();
        for _ in 0..2 {
            game.update_actor(id, 0.01).unwrap();
            let actor = game.actor(id).unwrap();
            assert!(!actor.terminated);
            assert!((actor.center() - center).length() < 1.0);
        }
        game.update_actor(id, 0.01).unwrap();
        assert!(game.actor(id).unwrap().terminated);
    }

    #[test]
    fn test_text_anim_drifts_and_expires() {
        let mut game = game();
        let id = spawn_with(&mut game, |a, s| {
            TextAnim::new(a, s, &TextLabel::Points(3), Vec2::new(100.0, 100.0), 0.5, Rgba::WHITE)
        });
        let y0 = game.actor(id).unwrap().pos.y;
        assert!(game.actor(id).unwrap().image.is_some());
        game.update_actor(id, 0.25).unwrap();
        assert_eq!(game.actor(id).unwrap().pos.y, y0 - 4.0);
        game.update_actor(id, 0.25).unwrap();
        assert!(game.actor(id).unwrap().terminated);
    }

    #[test]
    fn test_points_label_colors() {
        assert_eq!(
            TextLabel::Points(2).render(Rgba::WHITE),
            ("+2".to_string(), Rgba::GREEN)
        );
        assert_eq!(
            TextLabel::Points(-5).render(Rgba::WHITE),
            ("-5".to_string(), Rgba::RED)
        );
        assert_eq!(
            TextLabel::Text("z".into()).render(Rgba::BLUE),
            ("z".to_string(), Rgba::BLUE)
        );
    }

    #[test]
    fn test_blinking_restores_visibility() {
        let mut game = game();
        let id = spawn_with(&mut game, |a, _| Blinking::new(a, 0.1, 0.04));
        assert!(game.actor(id).unwrap().blinking);
        game.update_actor(id, 0.05).unwrap();
        assert!(!game.actor(id).unwrap().visible);
        game.update_actor(id, 0.06).unwrap();
        let actor = game.actor(id).unwrap();
        assert!(actor.visible && !actor.blinking);
        assert!(!actor.has_behavior("blinking"));
    }

    #[test]
    fn test_mover_oscillates_around_origin() {
        let mut game = game();
        let spec = MoverSpec {
            vel: 1.0,
            dist: 8.0,
            ..Default::default()
        };
        let id = spawn_with(&mut game, |a, _| MoverBlock::new(a, &spec));
        assert_eq!(game.actor(id).unwrap().zorder, 8);
        game.update_actor(id, std::f32::consts::FRAC_PI_2).unwrap();
        // Phase 0 on the first update
        assert_eq!(game.actor(id).unwrap().pos, Vec2::new(64.0, 64.0));
        game.update_actor(id, 0.0).unwrap();
        assert!((game.actor(id).unwrap().pos.x - 72.0).abs() < 1e-4);
    }

    #[test]
    fn test_shaking_returns_to_origin() {
        let mut game = game();
        let id = spawn_with(&mut game, |_, s| Shaking::new(s));
        // Longest possible wait, then a full shake
        for _ in 0..(31 * 10) {
            game.update_actor(id, 0.1).unwrap();
        }
        let mut t = 0.0;
        while t < 40.0 {
            game.update_actor(id, 0.01).unwrap();
            let pos = game.actor(id).unwrap().pos;
            assert!((pos - Vec2::new(64.0, 64.0)).abs().max_element() <= SHAKE_AMPLITUDE);
            t += 0.01;
        }
    }

    #[test]
    fn test_gesture_turns_yellow() {
        let mut game = game();
        let id = spawn_with(&mut game, |a, s| {
            GestureBlock::new(a, s, &GestureSpec::default()).unwrap()
        });
        let yellow = game.services.image("yblock").unwrap();
        game.deliver(id, &Message::Turn2Yellow).unwrap();
        let image = game.actor(id).unwrap().image.clone().unwrap();
        assert!(std::sync::Arc::ptr_eq(&image, &yellow));
        game.deliver(id, &Message::Turn2Death).unwrap();
        assert!(!game.actor(id).unwrap().has_behavior("gesture_block"));
    }
}
