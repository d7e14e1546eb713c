//! Broadcast message vocabulary
//!
//! Closed set of kinds; every recipient matches on the ones it cares about
//! and falls through on the rest, including [`Message::Other`].

use glam::Vec2;

use super::actor::ActorId;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The player ran into the recipient
    Collision {
        /// Player velocity at impact
        vec: Vec2,
        player: Option<ActorId>,
    },
    /// Knock the player back along `vec` with strength `power`
    BlastPlayer {
        vec: Vec2,
        power: f32,
        /// Recenter the player here first
        origin: Option<Vec2>,
        /// Seconds of suppressed input (defaults to 0.1)
        blast_time: Option<f32>,
    },
    PlayerDie,
    PlayerSpawn,
    /// Last white block was cleared
    LastBlock,
    StageClear,
    UpdatePoints {
        points: i32,
    },
    UpdateRemains {
        remains: i32,
    },
    UpdateBounces {
        bounces: u32,
    },
    /// Player stats changed (HUD refresh)
    UpdatePlayerStats {
        player: ActorId,
        points: i32,
        bounces: u32,
    },
    /// A chasing block gave up, hazards on that actor stand down
    NoDeath,
    Turn2Yellow,
    Turn2Death,
    /// Kind this build doesn't know about; always ignored
    Other(String),
}

impl Message {
    /// Wire-style kind tag, for logs
    pub fn kind(&self) -> &str {
        match self {
            Message::Collision { .. } => "collision",
            Message::BlastPlayer { .. } => "blastplayer",
            Message::PlayerDie => "playerdie",
            Message::PlayerSpawn => "playerspawn",
            Message::LastBlock => "lastblock",
            Message::StageClear => "stageclear",
            Message::UpdatePoints { .. } => "updatepoints",
            Message::UpdateRemains { .. } => "updateremains",
            Message::UpdateBounces { .. } => "updatebounces",
            Message::UpdatePlayerStats { .. } => "updplayerstats",
            Message::NoDeath => "nodeath",
            Message::Turn2Yellow => "turn2yellow",
            Message::Turn2Death => "turn2death",
            Message::Other(kind) => kind,
        }
    }
}
