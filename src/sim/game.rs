//! Game context: actor store, message dispatch and the collision query
//!
//! Everything a behavior may touch is reachable from [`Ctx`]: its own actor,
//! the shared [`Services`] and, through [`Ctx::game`], the rest of the world.
//!
//! Dispatch walks snapshots of ids, never live lists, so actors and behaviors
//! can be added or terminated from inside any call. A behavior is checked out
//! of its entry while it runs; a message addressed to it during that window is
//! queued on the entry and handed over as soon as the running call returns.

use std::collections::HashMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::actor::{Actor, ActorId, Behavior, BehaviorId};
use super::message::Message;
use super::rect::Rect;
use super::tick::LoopState;
use crate::assets::{Assets, ImageHandle};
use crate::audio::AudioManager;
use crate::error::{GameError, Result};
use crate::input::TickInput;
use crate::level::LevelCatalog;
use crate::render::DrawCommand;

/// Shared resources behaviors reach through their context
pub struct Services {
    pub assets: Assets,
    pub audio: AudioManager,
    /// Seeded; the only randomness in the simulation
    pub rng: Pcg32,
    /// Viewport rect, origin at (0, 0)
    pub screen: Rect,
    /// Keys held during the current tick
    pub input: TickInput,
    pub levels: LevelCatalog,
    /// Top-left of the spawn cell of the current level
    pub spawn_point: Vec2,
    commands: Vec<DrawCommand>,
}

impl Services {
    pub fn new(
        assets: Assets,
        audio: AudioManager,
        levels: LevelCatalog,
        screen: Rect,
        seed: u64,
    ) -> Self {
        Self {
            assets,
            audio,
            rng: Pcg32::seed_from_u64(seed),
            screen,
            input: TickInput::default(),
            levels,
            spawn_point: Vec2::ZERO,
            commands: Vec::new(),
        }
    }

    pub fn image(&self, name: &str) -> Result<ImageHandle> {
        self.assets.image(name)
    }

    /// Play a named sound (subject to the spacing rule)
    pub fn play_sound(&mut self, name: &str, volume: f32) -> bool {
        self.audio.play(&self.assets, name, volume)
    }

    /// Queue a blit for this tick's frame
    pub fn draw(&mut self, zorder: i32, image: &ImageHandle, rect: Rect) {
        self.commands.push(DrawCommand {
            zorder,
            image: ImageHandle::clone(image),
            rect,
        });
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

enum Call<'m> {
    Update(f32),
    Message(&'m Message),
}

/// The simulation world
pub struct Game {
    pub services: Services,
    actors: HashMap<ActorId, Actor>,
    /// Live actors in admission order
    live: Vec<ActorId>,
    /// Created this tick, admitted at the next lifecycle pass
    pending: Vec<ActorId>,
    next_id: u32,
    pub(crate) loop_state: LoopState,
}

impl Game {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            actors: HashMap::new(),
            live: Vec::new(),
            pending: Vec::new(),
            next_id: 1,
            loop_state: LoopState::default(),
        }
    }

    /// A detached actor with a fresh id; hand it to [`Game::add_actor`] when built
    pub fn new_actor(&mut self) -> Actor {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        Actor::new(id)
    }

    /// Queue an actor for admission at the next lifecycle pass
    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        let id = actor.id();
        log::trace!("Actor {:?} pending ({:?})", id, actor.behavior_names());
        self.actors.insert(id, actor);
        self.pending.push(id);
        id
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn live_ids(&self) -> &[ActorId] {
        &self.live
    }

    pub fn pending_ids(&self) -> &[ActorId] {
        &self.pending
    }

    /// Live and pending actors, live first
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.live
            .iter()
            .chain(self.pending.iter())
            .filter_map(|id| self.actors.get(id))
    }

    /// First live or pending actor carrying a behavior called `name`
    pub fn find_with_behavior(&self, name: &str) -> Option<ActorId> {
        self.actors()
            .find(|a| !a.terminated && a.has_behavior(name))
            .map(|a| a.id())
    }

    /// Broadcast to every non-terminated live actor, then every pending one
    pub fn send_message(&mut self, msg: &Message) -> Result<()> {
        log::trace!("Broadcast {}", msg.kind());
        let targets: Vec<ActorId> = self.live.iter().chain(self.pending.iter()).copied().collect();
        for id in targets {
            self.deliver(id, msg)?;
        }
        Ok(())
    }

    /// Actor-scoped delivery, in behavior list order
    pub fn deliver(&mut self, id: ActorId, msg: &Message) -> Result<()> {
        let Some(actor) = self.actors.get(&id) else {
            return Ok(());
        };
        for bid in actor.snapshot() {
            let Some(actor) = self.actors.get_mut(&id) else {
                break;
            };
            if actor.terminated {
                break;
            }
            let Some(entry) = actor.entry_mut(bid) else {
                continue;
            };
            if entry.terminated || !entry.capability.listens() {
                continue;
            }
            if entry.behavior.is_none() {
                entry.inbox.push_back(msg.clone());
                continue;
            }
            self.run_behavior(id, bid, Call::Message(msg))?;
        }
        Ok(())
    }

    /// One update pass over an actor's behaviors
    pub(crate) fn update_actor(&mut self, id: ActorId, dt: f32) -> Result<()> {
        let Some(actor) = self.actors.get(&id) else {
            return Ok(());
        };
        for bid in actor.snapshot() {
            let Some(actor) = self.actors.get_mut(&id) else {
                break;
            };
            if actor.terminated {
                break;
            }
            let Some(entry) = actor.entry_mut(bid) else {
                continue;
            };
            if entry.terminated {
                if entry.behavior.is_some() {
                    actor.remove_behavior(bid);
                }
                continue;
            }
            if !entry.capability.updates() {
                continue;
            }
            self.run_behavior(id, bid, Call::Update(dt))?;
        }
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.compact();
        }
        Ok(())
    }

    fn run_behavior(&mut self, id: ActorId, bid: BehaviorId, call: Call<'_>) -> Result<()> {
        let Some(mut behavior) = self
            .actors
            .get_mut(&id)
            .and_then(|a| a.entry_mut(bid))
            .and_then(|e| e.behavior.take())
        else {
            return Ok(());
        };

        let mut result = self.invoke(id, bid, behavior.as_mut(), call);
        while result.is_ok() {
            let Some(msg) = self.next_queued(id, bid) else {
                break;
            };
            result = self.invoke(id, bid, behavior.as_mut(), Call::Message(&msg));
        }

        if let Some(entry) = self.actors.get_mut(&id).and_then(|a| a.entry_mut(bid)) {
            entry.behavior = Some(behavior);
        }
        result
    }

    fn invoke(
        &mut self,
        id: ActorId,
        bid: BehaviorId,
        behavior: &mut dyn Behavior,
        call: Call<'_>,
    ) -> Result<()> {
        let mut ctx = Ctx {
            game: self,
            actor: id,
            behavior: bid,
        };
        match call {
            Call::Update(dt) => behavior.update(&mut ctx, dt),
            Call::Message(msg) => behavior.message(&mut ctx, msg),
        }
    }

    /// Next message queued for a checked-out behavior; drops the queue once
    /// the behavior or its actor has terminated
    fn next_queued(&mut self, id: ActorId, bid: BehaviorId) -> Option<Message> {
        let actor = self.actors.get_mut(&id)?;
        let actor_terminated = actor.terminated;
        let entry = actor.entry_mut(bid)?;
        if actor_terminated || entry.terminated {
            entry.inbox.clear();
            return None;
        }
        entry.inbox.pop_front()
    }

    /// Live, non-terminated, collidable actor overlapping `query` whose center
    /// is nearest to `origin` (first in live order on ties)
    pub fn collision(&self, origin: Vec2, query: &Rect) -> Option<ActorId> {
        let mut best: Option<(f32, ActorId)> = None;
        for &id in &self.live {
            let Some(actor) = self.actors.get(&id) else {
                continue;
            };
            if actor.terminated || !actor.collidable {
                continue;
            }
            let rect = actor.rect();
            if !rect.intersects(query) {
                continue;
            }
            let dist = origin.distance_squared(rect.center());
            if best.is_none_or(|(nearest, _)| dist < nearest) {
                best = Some((dist, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Update every live actor once, purging those already terminated
    pub(crate) fn update_live(&mut self, dt: f32) -> Result<()> {
        let ids = self.live.clone();
        let mut purged = 0;
        for id in ids {
            let terminated = self.actors.get(&id).is_none_or(|a| a.terminated);
            if terminated {
                self.actors.remove(&id);
                purged += 1;
            } else {
                self.update_actor(id, dt)?;
            }
        }
        if purged > 0 {
            let actors = &self.actors;
            self.live.retain(|id| actors.contains_key(id));
            log::trace!("Purged {} actors", purged);
        }
        Ok(())
    }

    /// Move pending actors into the live set
    pub(crate) fn admit_pending(&mut self) {
        for id in std::mem::take(&mut self.pending) {
            match self.actors.get(&id) {
                Some(actor) if !actor.terminated => self.live.push(id),
                _ => {
                    self.actors.remove(&id);
                }
            }
        }
    }
}

/// What a running behavior sees: its actor, the services and the world
pub struct Ctx<'a> {
    game: &'a mut Game,
    actor: ActorId,
    behavior: BehaviorId,
}

impl<'a> Ctx<'a> {
    pub fn id(&self) -> ActorId {
        self.actor
    }

    pub fn game(&mut self) -> &mut Game {
        self.game
    }

    pub fn services(&mut self) -> &mut Services {
        &mut self.game.services
    }

    pub fn actor(&self) -> Result<&Actor> {
        self.game
            .actors
            .get(&self.actor)
            .ok_or(GameError::UnknownActor(self.actor))
    }

    pub fn actor_mut(&mut self) -> Result<&mut Actor> {
        self.game
            .actors
            .get_mut(&self.actor)
            .ok_or(GameError::UnknownActor(self.actor))
    }

    /// Own actor and the services at once
    pub fn parts(&mut self) -> Result<(&mut Actor, &mut Services)> {
        let actor = self
            .game
            .actors
            .get_mut(&self.actor)
            .ok_or(GameError::UnknownActor(self.actor))?;
        Ok((actor, &mut self.game.services))
    }

    /// Terminate the running behavior; the actor drops it at its next pass
    pub fn finish(&mut self) {
        let bid = self.behavior;
        if let Some(entry) = self
            .game
            .actors
            .get_mut(&self.actor)
            .and_then(|a| a.entry_mut(bid))
        {
            entry.terminated = true;
        }
    }

    /// Attach a behavior to the own actor; it runs from the next pass on
    pub fn add_behavior<B: Behavior + 'static>(&mut self, behavior: B) -> Result<BehaviorId> {
        Ok(self.actor_mut()?.add_behavior(behavior))
    }

    pub fn broadcast(&mut self, msg: Message) -> Result<()> {
        self.game.send_message(&msg)
    }

    pub fn send_to(&mut self, id: ActorId, msg: Message) -> Result<()> {
        self.game.deliver(id, &msg)
    }

    pub fn send_self(&mut self, msg: Message) -> Result<()> {
        let id = self.actor;
        self.game.deliver(id, &msg)
    }

    pub fn draw(&mut self, zorder: i32, image: &ImageHandle, rect: Rect) {
        self.game.services.draw(zorder, image, rect);
    }

    pub fn collision(&self, origin: Vec2, query: &Rect) -> Option<ActorId> {
        self.game.collision(origin, query)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::ProceduralAssets;
    use crate::audio::AudioManager;
    use crate::sim::actor::Capability;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) fn services() -> Services {
        Services::new(
            Assets::new(ProceduralAssets::new()),
            AudioManager::default(),
            LevelCatalog::builtin().unwrap(),
            Rect::new(0.0, 0.0, 640.0, 480.0),
            42,
        )
    }

    pub(crate) fn game() -> Game {
        Game::new(services())
    }

    type Log = Rc<RefCell<Vec<String>>>;

    /// Logs every call; optionally reacts to them
    struct Probe {
        tag: &'static str,
        log: Log,
        on_update: Option<Box<dyn FnMut(&mut Ctx<'_>) -> Result<()>>>,
        on_message: Option<Box<dyn FnMut(&mut Ctx<'_>, &Message) -> Result<()>>>,
    }

    impl Probe {
        fn new(tag: &'static str, log: &Log) -> Self {
            Self {
                tag,
                log: Rc::clone(log),
                on_update: None,
                on_message: None,
            }
        }

        fn on_update(mut self, f: impl FnMut(&mut Ctx<'_>) -> Result<()> + 'static) -> Self {
            self.on_update = Some(Box::new(f));
            self
        }

        fn on_message(
            mut self,
            f: impl FnMut(&mut Ctx<'_>, &Message) -> Result<()> + 'static,
        ) -> Self {
            self.on_message = Some(Box::new(f));
            self
        }
    }

    impl Behavior for Probe {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn capability(&self) -> Capability {
            Capability::Both
        }

        fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:update", self.tag));
            match self.on_update.as_mut() {
                Some(f) => f(ctx),
                None => Ok(()),
            }
        }

        fn message(&mut self, ctx: &mut Ctx<'_>, msg: &Message) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("{}:{}", self.tag, msg.kind()));
            match self.on_message.as_mut() {
                Some(f) => f(ctx, msg),
                None => Ok(()),
            }
        }
    }

    fn spawn(game: &mut Game, probes: Vec<Probe>) -> ActorId {
        let mut actor = game.new_actor();
        for p in probes {
            actor.add_behavior(p);
        }
        game.add_actor(actor)
    }

    fn block(game: &mut Game, x: f32, y: f32) -> ActorId {
        let mut actor = game.new_actor();
        actor.pos = Vec2::new(x, y);
        actor.image = Some(game.services.image("lblock").unwrap());
        actor.collidable = true;
        game.add_actor(actor)
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn test_terminated_actor_is_silent_and_purged() {
        let mut game = game();
        let log = Log::default();
        let id = spawn(&mut game, vec![Probe::new("a", &log)]);
        game.admit_pending();
        game.actor_mut(id).unwrap().terminated = true;

        game.send_message(&Message::PlayerSpawn).unwrap();
        game.update_live(0.016).unwrap();
        assert!(entries(&log).is_empty());
        assert!(game.actor(id).is_none());
        assert!(game.live_ids().is_empty());
    }

    #[test]
    fn test_dispatch_order_is_list_order_then_pending() {
        let mut game = game();
        let log = Log::default();
        // "b" is added last, so it sits at the head of the list
        spawn(
            &mut game,
            vec![Probe::new("a", &log), Probe::new("b", &log)],
        );
        game.admit_pending();
        spawn(&mut game, vec![Probe::new("c", &log)]);

        game.send_message(&Message::StageClear).unwrap();
        assert_eq!(
            entries(&log),
            vec!["b:stageclear", "a:stageclear", "c:stageclear"]
        );
    }

    #[test]
    fn test_behavior_added_during_pass_runs_next_pass() {
        let mut game = game();
        let log = Log::default();
        let inner = Rc::clone(&log);
        let mut added = false;
        let id = spawn(
            &mut game,
            vec![Probe::new("a", &log).on_update(move |ctx| {
                if !added {
                    added = true;
                    ctx.add_behavior(Probe::new("late", &inner))?;
                }
                Ok(())
            })],
        );
        game.admit_pending();
        game.update_actor(id, 0.016).unwrap();
        assert_eq!(entries(&log), vec!["a:update"]);
        game.update_actor(id, 0.016).unwrap();
        assert_eq!(entries(&log), vec!["a:update", "late:update", "a:update"]);
    }

    #[test]
    fn test_finished_behavior_stops_and_is_compacted() {
        let mut game = game();
        let log = Log::default();
        let id = spawn(
            &mut game,
            vec![
                Probe::new("stay", &log),
                Probe::new("once", &log).on_update(|ctx| {
                    ctx.finish();
                    Ok(())
                }),
            ],
        );
        game.admit_pending();
        game.update_actor(id, 0.016).unwrap();
        assert_eq!(game.actor(id).unwrap().behavior_count(), 1);
        game.send_message(&Message::PlayerDie).unwrap();
        game.update_actor(id, 0.016).unwrap();
        assert_eq!(
            entries(&log),
            vec!["once:update", "stay:update", "stay:playerdie", "stay:update"]
        );
    }

    #[test]
    fn test_self_addressed_message_arrives_after_current_call() {
        let mut game = game();
        let log = Log::default();
        let inner = Rc::clone(&log);
        let id = spawn(
            &mut game,
            vec![Probe::new("a", &log).on_update(move |ctx| {
                ctx.broadcast(Message::LastBlock)?;
                inner.borrow_mut().push("a:after-broadcast".into());
                Ok(())
            })],
        );
        game.admit_pending();
        game.update_actor(id, 0.016).unwrap();
        assert_eq!(
            entries(&log),
            vec!["a:update", "a:after-broadcast", "a:lastblock"]
        );
    }

    #[test]
    fn test_broadcast_from_update_reaches_others_synchronously() {
        let mut game = game();
        let log = Log::default();
        let inner = Rc::clone(&log);
        let sender = spawn(
            &mut game,
            vec![Probe::new("sender", &log).on_update(move |ctx| {
                ctx.broadcast(Message::UpdatePoints { points: 1 })?;
                inner.borrow_mut().push("sender:done".into());
                Ok(())
            })],
        );
        spawn(&mut game, vec![Probe::new("other", &log)]);
        game.admit_pending();
        game.update_actor(sender, 0.016).unwrap();
        assert_eq!(
            entries(&log),
            vec![
                "sender:update",
                "other:updatepoints",
                "sender:done",
                "sender:updatepoints"
            ]
        );
    }

    #[test]
    fn test_actor_terminated_mid_delivery_stops_receiving() {
        let mut game = game();
        let log = Log::default();
        spawn(
            &mut game,
            vec![
                Probe::new("tail", &log),
                Probe::new("head", &log).on_message(|ctx, _| {
                    ctx.actor_mut()?.terminated = true;
                    Ok(())
                }),
            ],
        );
        game.admit_pending();
        game.send_message(&Message::PlayerSpawn).unwrap();
        assert_eq!(entries(&log), vec!["head:playerspawn"]);
    }

    #[test]
    fn test_pending_terminated_actor_is_never_admitted() {
        let mut game = game();
        let log = Log::default();
        let id = spawn(&mut game, vec![Probe::new("a", &log)]);
        game.actor_mut(id).unwrap().terminated = true;
        game.admit_pending();
        assert!(game.live_ids().is_empty());
        assert!(game.actor(id).is_none());
    }

    #[test]
    fn test_collision_picks_nearest() {
        let mut game = game();
        let near = block(&mut game, 10.0, 0.0);
        let far = block(&mut game, 50.0, 0.0);
        game.admit_pending();
        let query = Rect::new(0.0, 0.0, 100.0, 32.0);
        assert_eq!(game.collision(Vec2::new(26.0, 16.0), &query), Some(near));
        assert_eq!(game.collision(Vec2::new(90.0, 16.0), &query), Some(far));
        assert_eq!(
            game.collision(Vec2::ZERO, &Rect::new(200.0, 200.0, 10.0, 10.0)),
            None
        );
    }

    #[test]
    fn test_collision_skips_pending_terminated_and_passive() {
        let mut game = game();
        let dead = block(&mut game, 0.0, 0.0);
        let passive = block(&mut game, 0.0, 0.0);
        game.admit_pending();
        block(&mut game, 0.0, 0.0);
        game.actor_mut(dead).unwrap().terminated = true;
        game.actor_mut(passive).unwrap().collidable = false;
        let query = Rect::new(0.0, 0.0, 32.0, 32.0);
        assert_eq!(game.collision(Vec2::new(16.0, 16.0), &query), None);
    }

    #[test]
    fn test_collision_tie_goes_to_first_live() {
        let mut game = game();
        let first = block(&mut game, 0.0, 0.0);
        block(&mut game, 64.0, 0.0);
        game.admit_pending();
        let query = Rect::new(0.0, 0.0, 96.0, 32.0);
        assert_eq!(game.collision(Vec2::new(48.0, 16.0), &query), Some(first));
    }

    proptest! {
        #[test]
        fn prop_collision_returns_nearest_intersecting(
            blocks in prop::collection::vec((0.0f32..600.0, 0.0f32..440.0), 1..20),
            qx in 0.0f32..600.0,
            qy in 0.0f32..440.0,
        ) {
            let mut game = game();
            for &(x, y) in &blocks {
                block(&mut game, x, y);
            }
            game.admit_pending();
            let query = Rect::new(qx, qy, 48.0, 48.0);
            let origin = query.center();
            let hit = game.collision(origin, &query);

            let hits: Vec<&Actor> = game
                .actors()
                .filter(|a| a.rect().intersects(&query))
                .collect();
            match hit {
                None => prop_assert!(hits.is_empty()),
                Some(id) => {
                    let best = game.actor(id).unwrap();
                    prop_assert!(best.rect().intersects(&query));
                    let d = origin.distance_squared(best.rect().center());
                    for a in hits {
                        prop_assert!(d <= origin.distance_squared(a.rect().center()));
                    }
                }
            }
        }
    }
}
