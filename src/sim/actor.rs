//! Actors and the behaviors composed into them
//!
//! An actor is a bag of shared fields plus an ordered behavior list
//! (most recently added first). Behaviors are stored behind entries with
//! stable ids so the list can change while a pass walks a snapshot of it.

use std::collections::VecDeque;

use glam::Vec2;

use super::game::Ctx;
use super::message::Message;
use super::rect::Rect;
use crate::assets::ImageHandle;
use crate::error::Result;

/// Actor identity; never reused within a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

/// Behavior identity, unique within its actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviorId(u32);

/// Which hooks a behavior implements; read once when it is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Neither,
    UpdateOnly,
    MessageOnly,
    Both,
}

impl Capability {
    pub fn updates(self) -> bool {
        matches!(self, Capability::UpdateOnly | Capability::Both)
    }

    pub fn listens(self) -> bool {
        matches!(self, Capability::MessageOnly | Capability::Both)
    }
}

/// A unit of per-tick logic and/or message handling owned by one actor
pub trait Behavior {
    fn name(&self) -> &'static str;

    fn capability(&self) -> Capability;

    fn update(&mut self, _ctx: &mut Ctx<'_>, _dt: f32) -> Result<()> {
        Ok(())
    }

    fn message(&mut self, _ctx: &mut Ctx<'_>, _msg: &Message) -> Result<()> {
        Ok(())
    }
}

pub(crate) struct BehaviorEntry {
    pub(crate) id: BehaviorId,
    pub(crate) name: &'static str,
    pub(crate) capability: Capability,
    pub(crate) terminated: bool,
    /// `None` while the behavior is running
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    /// Messages addressed to the behavior while it was running
    pub(crate) inbox: VecDeque<Message>,
}

/// An entity in the simulation
pub struct Actor {
    id: ActorId,
    /// Top-left of the bounding box
    pub pos: Vec2,
    /// Current sprite; also defines the bounding box size
    pub image: Option<ImageHandle>,
    /// Name the sprite was loaded from (for mirrored/rotated variants)
    pub image_name: String,
    pub zorder: i32,
    pub visible: bool,
    pub terminated: bool,
    /// Eligible for collision queries
    pub collidable: bool,
    /// Contact deflects the player (false = pass-through hazard)
    pub response: bool,
    /// A blink behavior is running; hazards hold fire meanwhile
    pub blinking: bool,
    behaviors: Vec<BehaviorEntry>,
    next_behavior: u32,
}

impl Actor {
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            image: None,
            image_name: String::new(),
            zorder: 0,
            visible: true,
            terminated: false,
            collidable: false,
            response: false,
            blinking: false,
            behaviors: Vec::new(),
            next_behavior: 0,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn size(&self) -> Vec2 {
        self.image.as_ref().map(|img| img.size()).unwrap_or(Vec2::ZERO)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size())
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Swap the sprite keeping the current center
    pub fn set_image_centered(&mut self, image: ImageHandle) {
        let center = self.center();
        self.pos = center - image.size() / 2.0;
        self.image = Some(image);
    }

    /// Attach a behavior at the head of the list
    pub fn add_behavior<B: Behavior + 'static>(&mut self, behavior: B) -> BehaviorId {
        self.attach(Box::new(behavior))
    }

    pub fn attach(&mut self, behavior: Box<dyn Behavior>) -> BehaviorId {
        let id = BehaviorId(self.next_behavior);
        self.next_behavior += 1;
        self.behaviors.insert(
            0,
            BehaviorEntry {
                id,
                name: behavior.name(),
                capability: behavior.capability(),
                terminated: false,
                behavior: Some(behavior),
                inbox: VecDeque::new(),
            },
        );
        id
    }

    /// Names of the attached, non-terminated behaviors in list order
    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.behaviors
            .iter()
            .filter(|e| !e.terminated)
            .map(|e| e.name)
            .collect()
    }

    /// Entries still in the list, terminated or not
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    pub fn has_behavior(&self, name: &str) -> bool {
        self.behaviors.iter().any(|e| !e.terminated && e.name == name)
    }

    pub(crate) fn snapshot(&self) -> Vec<BehaviorId> {
        self.behaviors.iter().map(|e| e.id).collect()
    }

    pub(crate) fn entry_mut(&mut self, id: BehaviorId) -> Option<&mut BehaviorEntry> {
        self.behaviors.iter_mut().find(|e| e.id == id)
    }

    pub(crate) fn remove_behavior(&mut self, id: BehaviorId) {
        self.behaviors.retain(|e| e.id != id);
    }

    /// Drop terminated entries that aren't currently running
    pub(crate) fn compact(&mut self) {
        self.behaviors
            .retain(|e| !(e.terminated && e.behavior.is_some()));
    }
}
