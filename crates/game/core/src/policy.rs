//! Decision rules for computer-controlled combatants.
//!
//! Policies plug into opponents so richer behavior can replace the baseline
//! without touching the engine.

use std::fmt;

use crate::battle::{Action, Battle, FighterId};
use crate::state::StatBlock;

/// Trait for choosing an autonomous combatant's action for the round.
///
/// Implementations only read the battle; the engine validates the target and
/// records whatever action is returned. Returning `None` sits the round out,
/// which keeps the round waiting on this combatant.
pub trait OpponentPolicy: Send + Sync + fmt::Debug {
    fn decide(&self, view: &PolicyView<'_>) -> Option<Action>;
}

/// Read-only view of a battle from one combatant's seat.
pub struct PolicyView<'a> {
    battle: &'a Battle,
    actor: FighterId,
}

impl<'a> PolicyView<'a> {
    pub(crate) fn new(battle: &'a Battle, actor: FighterId) -> Self {
        Self { battle, actor }
    }

    pub fn battle(&self) -> &'a Battle {
        self.battle
    }

    pub fn actor(&self) -> FighterId {
        self.actor
    }

    pub fn stats(&self) -> StatBlock {
        self.battle.fighter_at(self.actor).stats()
    }

    /// Living members of the enemy roster, in roster order.
    pub fn living_enemies(&self) -> Vec<FighterId> {
        self.battle
            .enemies_of(self.actor)
            .iter()
            .copied()
            .filter(|&id| !self.battle.fighter_at(id).is_defeated())
            .collect()
    }

    /// The enemy this combatant is currently aiming at.
    pub fn current_target(&self) -> Option<FighterId> {
        self.battle.target_of(self.actor)
    }
}

/// Baseline policy: attack every round while an enemy still stands.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttackPolicy;

impl OpponentPolicy for AttackPolicy {
    fn decide(&self, view: &PolicyView<'_>) -> Option<Action> {
        if view.living_enemies().is_empty() {
            None
        } else {
            Some(Action::Attack)
        }
    }
}

/// Policy that never acts. Useful for holding a round open in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdlePolicy;

impl OpponentPolicy for IdlePolicy {
    fn decide(&self, _view: &PolicyView<'_>) -> Option<Action> {
        None
    }
}
