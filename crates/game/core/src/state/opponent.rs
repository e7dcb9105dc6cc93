//! Computer-controlled, ephemeral combatant.

use std::sync::Arc;

use crate::policy::{AttackPolicy, OpponentPolicy};

use super::{BattleId, StatBlock};

/// Blueprint for spawning opponents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpponentTemplate {
    pub name: String,
    pub attack: u32,
    pub defend: u32,
    pub speed: u32,
    pub critical_rate: u32,
    pub max_health: u32,
}

impl OpponentTemplate {
    /// The stock sparring partner for practice battles.
    pub fn practice() -> Self {
        Self {
            name: "Man".to_string(),
            attack: 5,
            defend: 5,
            speed: 1,
            critical_rate: 0,
            max_health: 20,
        }
    }

    /// Spawns a full-health opponent driven by [`AttackPolicy`].
    pub fn spawn(&self) -> Opponent {
        self.spawn_with_policy(Arc::new(AttackPolicy))
    }

    pub fn spawn_with_policy(&self, policy: Arc<dyn OpponentPolicy>) -> Opponent {
        Opponent {
            name: self.name.clone(),
            stats: StatBlock {
                attack: self.attack,
                defend: self.defend,
                speed: self.speed,
                critical_rate: self.critical_rate,
                health: self.max_health,
                max_health: self.max_health,
            },
            battle: None,
            policy,
        }
    }
}

/// An opponent taking part in a battle. Never persisted.
#[derive(Clone, Debug)]
pub struct Opponent {
    pub name: String,
    pub stats: StatBlock,
    pub battle: Option<BattleId>,
    pub policy: Arc<dyn OpponentPolicy>,
}
