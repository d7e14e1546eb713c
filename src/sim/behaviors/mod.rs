//! Behavior catalogue
//!
//! Every behavior an actor can carry, plus [`BehaviorSpec::attach`], which
//! turns a level file's extra behavior entry into the live component.

pub mod blocks;
pub mod level;
pub mod player;
pub mod sprite;

pub use blocks::{
    AlternateDeath, AlternateDeathSpec, BrokenBlock, ChasingBlock, Colliding, DeathBlock,
    DeathBlockSpec, SleepingBlock, TurningBlock, TurningSpec, WhiteBlock, YellowBlock,
};
pub use level::Level;
pub use player::{Player, PlayerPause, PlayerStatus};
pub use sprite::{
    Anim, Blinking, BlinkingSpec, Drawing, GestureBlock, GestureSpec, MoverBlock, MoverSpec,
    Shaking, TextAnim, TextLabel, FONT_NAME,
};

use crate::error::Result;
use crate::level::BehaviorSpec;
use crate::sim::actor::Actor;
use crate::sim::game::Services;

impl BehaviorSpec {
    /// Build the behavior this entry names and attach it to `actor`
    pub fn attach(&self, actor: &mut Actor, services: &mut Services) -> Result<()> {
        match self {
            BehaviorSpec::TurningBlock(spec) => {
                let b = TurningBlock::new(actor, services, spec)?;
                actor.add_behavior(b);
            }
            BehaviorSpec::MoverBlock(spec) => {
                let b = MoverBlock::new(actor, spec);
                actor.add_behavior(b);
            }
            BehaviorSpec::AlternateDeath(spec) => {
                let b = AlternateDeath::new(actor, services, spec)?;
                actor.add_behavior(b);
            }
            BehaviorSpec::Shaking => {
                actor.add_behavior(Shaking::new(services));
            }
            BehaviorSpec::Blinking(spec) => {
                let b = Blinking::from_spec(actor, spec);
                actor.add_behavior(b);
            }
            BehaviorSpec::DeathBlock(spec) => {
                let b = DeathBlock::from_spec(actor, spec);
                actor.add_behavior(b);
            }
            BehaviorSpec::GestureBlock(spec) => {
                let b = GestureBlock::new(actor, services, spec)?;
                actor.add_behavior(b);
            }
            BehaviorSpec::BrokenBlock => {
                let b = BrokenBlock::new(actor, services)?;
                actor.add_behavior(b);
            }
        }
        log::trace!("Attached {:?} to {:?}", self, actor.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::game::tests::game;

    #[test]
    fn test_attach_adds_named_behavior() {
        let mut game = game();
        let cases = [
            (BehaviorSpec::TurningBlock(TurningSpec::default()), "turning_block"),
            (BehaviorSpec::MoverBlock(MoverSpec::default()), "mover_block"),
            (
                BehaviorSpec::AlternateDeath(AlternateDeathSpec::default()),
                "alternate_death",
            ),
            (BehaviorSpec::Shaking, "shaking"),
            (BehaviorSpec::Blinking(BlinkingSpec::default()), "blinking"),
            (BehaviorSpec::DeathBlock(DeathBlockSpec::default()), "death_block"),
            (BehaviorSpec::GestureBlock(GestureSpec::default()), "gesture_block"),
            (BehaviorSpec::BrokenBlock, "broken_block"),
        ];
        for (spec, name) in cases {
            let mut actor = game.new_actor();
            actor.image = Some(game.services.image("lblock").unwrap());
            spec.attach(&mut actor, &mut game.services).unwrap();
            assert!(actor.has_behavior(name), "{name}");
        }
    }

    #[test]
    fn test_attach_reports_missing_image() {
        let mut game = game();
        let mut actor = game.new_actor();
        let spec = BehaviorSpec::AlternateDeath(AlternateDeathSpec {
            img0: "nosuchblock".into(),
            ..Default::default()
        });
        assert!(spec.attach(&mut actor, &mut game.services).is_err());
    }
}
