//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Caller-supplied dt only (clamped per tick)
//! - Seeded RNG only
//! - Stable iteration order (admission order, behavior list order)
//! - No rendering backend or platform dependencies

pub mod actor;
pub mod behaviors;
pub mod game;
pub mod message;
pub mod motion;
pub mod rect;
pub mod spawn;
pub mod tick;

pub use actor::{Actor, ActorId, Behavior, BehaviorId, Capability};
pub use game::{Ctx, Game, Services};
pub use message::Message;
pub use motion::{Facing, Motion, Obstacle, StepOutcome};
pub use rect::Rect;
pub use spawn::{create_anim, create_block, create_level, create_player, create_text_anim, start_game};
pub use tick::{LoopState, tick};
