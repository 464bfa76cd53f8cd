//! Monsters figuring out what to do on their own.

use anyhow::anyhow;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use util::{srng, RngExt};

use crate::{prelude::*, Action, ActionKind, Game, Level, Result};

/// Behaviour a monster template asks for.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Hash, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Brain {
    /// Walk towards the player and bump into them.
    #[default]
    Generic,
    MeleeBrute,
    Skirmisher,
    DiveBite,
    /// Mutters to itself until the player comes close.
    Lunatic,
    /// Bites drain mana.
    ManaBite,
    /// Never acts, for training dummies and vacated bodies.
    Idle,
}

/// Decision layer consulted once per monster turn.
///
/// Errors are not fatal, the engine waits in place of a failed decision.
pub trait Ai {
    fn choose_action(
        &self,
        game: &Game,
        level: &Level,
        actor: EntityId,
    ) -> Result<Action>;
}

/// The game's own brains.
#[derive(Copy, Clone, Default, Debug)]
pub struct StandardAi;

impl Ai for StandardAi {
    fn choose_action(
        &self,
        game: &Game,
        level: &Level,
        actor: EntityId,
    ) -> Result<Action> {
        let ent = level
            .entity(actor)
            .ok_or_else(|| anyhow!("choose_action: no entity {actor}"))?;
        let mob = ent
            .actor()
            .ok_or_else(|| anyhow!("choose_action: {actor} is not an actor"))?;
        let Some(player) = level.entity(game.player_id()) else {
            return Ok(Action::Wait);
        };

        // Keyed by actor and time so a replay makes the same choices.
        let mut rng = srng(&(actor, level.now()));
        let knows = |k: ActionKind| mob.actions.contains(&k);
        let offset = player.pos - ent.pos;

        if mob.brain == Brain::Idle {
            return Ok(Action::Wait);
        }

        if knows(ActionKind::ImpTaunt)
            && offset.cheb_len() <= game.cfg.fov_radius
            && rng.one_chance_in(6)
        {
            return Ok(Action::ImpTaunt);
        }

        Ok(match mob.brain {
            Brain::Lunatic => {
                if offset.taxi_len() <= 1 {
                    walk_towards(offset, &mut rng, knows(ActionKind::Move))
                } else if knows(ActionKind::Yawp) && rng.one_chance_in(8) {
                    Action::Yawp
                } else {
                    Action::Wait
                }
            }
            _ => walk_towards(offset, &mut rng, knows(ActionKind::Move)),
        })
    }
}

/// Bump if orthogonally adjacent, otherwise step along a random axis that
/// closes the distance.
fn walk_towards(offset: IVec2, rng: &mut impl Rng, can_move: bool) -> Action {
    if !can_move {
        return Action::Wait;
    }
    if offset.taxi_len() == 1 {
        return Action::Move(offset);
    }

    let mut steps = Vec::new();
    if offset.x != 0 {
        steps.push(ivec2(offset.x.signum(), 0));
    }
    if offset.y != 0 {
        steps.push(ivec2(0, offset.y.signum()));
    }
    match steps.choose(rng) {
        Some(&d) => Action::Move(d),
        None => Action::Wait,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn walking() {
        let mut rng = srng(&1);
        assert_eq!(
            walk_towards(ivec2(0, -1), &mut rng, true),
            Action::Move(ivec2(0, -1))
        );
        assert_eq!(walk_towards(ivec2(0, 0), &mut rng, true), Action::Wait);
        assert_eq!(walk_towards(ivec2(5, 0), &mut rng, false), Action::Wait);
        for _ in 0..20 {
            let Action::Move(d) = walk_towards(ivec2(3, -4), &mut rng, true)
            else {
                panic!("expected a step");
            };
            assert!(d == ivec2(1, 0) || d == ivec2(0, -1));
        }
    }
}
