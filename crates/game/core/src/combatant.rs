//! Capability contract shared by every battle participant.
//!
//! The engine only talks to [`Combatant`]; whether a participant is a player's
//! character or a computer-controlled opponent is a [`Mind`] tag plus the
//! optional policy capability, not a type hierarchy.

use std::sync::Arc;

use crate::policy::OpponentPolicy;
use crate::state::{BattleId, ChannelId, Character, CharacterHandle, Opponent, StatBlock, UserId};

/// Who decides a combatant's actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mind {
    Human,
    Autonomous,
}

pub trait Combatant {
    fn name(&self) -> &str;

    fn stats(&self) -> StatBlock;

    /// Sets health, clamped to `[0, max_health]`.
    fn set_health(&mut self, health: u32);

    /// The battle this combatant currently fights in.
    fn battle(&self) -> Option<BattleId>;

    fn set_battle(&mut self, battle: Option<BattleId>);

    fn mind(&self) -> Mind;

    /// Decision rule for autonomous combatants.
    fn policy(&self) -> Option<Arc<dyn OpponentPolicy>> {
        None
    }

    fn health(&self) -> u32 {
        self.stats().health
    }

    fn is_defeated(&self) -> bool {
        self.health() == 0
    }
}

impl Combatant for Character {
    fn name(&self) -> &str {
        self.display_name()
    }

    fn stats(&self) -> StatBlock {
        Character::stats(self)
    }

    fn set_health(&mut self, health: u32) {
        self.health = health.min(self.max_health);
    }

    fn battle(&self) -> Option<BattleId> {
        self.battle
    }

    fn set_battle(&mut self, battle: Option<BattleId>) {
        self.battle = battle;
    }

    fn mind(&self) -> Mind {
        Mind::Human
    }
}

impl Combatant for Opponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> StatBlock {
        self.stats
    }

    fn set_health(&mut self, health: u32) {
        self.stats.health = health.min(self.stats.max_health);
    }

    fn battle(&self) -> Option<BattleId> {
        self.battle
    }

    fn set_battle(&mut self, battle: Option<BattleId>) {
        self.battle = battle;
    }

    fn mind(&self) -> Mind {
        Mind::Autonomous
    }

    fn policy(&self) -> Option<Arc<dyn OpponentPolicy>> {
        Some(Arc::clone(&self.policy))
    }
}

/// A roster entry: either a shared character or an opponent owned by the battle.
#[derive(Clone, Debug)]
pub enum Fighter {
    Character(CharacterHandle),
    Opponent(Opponent),
}

impl Fighter {
    /// Runs `f` against the combatant behind this entry.
    pub fn view<R>(&self, f: impl FnOnce(&dyn Combatant) -> R) -> R {
        match self {
            Fighter::Character(handle) => f(&*handle.read()),
            Fighter::Opponent(opponent) => f(opponent),
        }
    }

    /// Runs `f` against the combatant behind this entry, mutably.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut dyn Combatant) -> R) -> R {
        match self {
            Fighter::Character(handle) => f(&mut *handle.write()),
            Fighter::Opponent(opponent) => f(opponent),
        }
    }

    pub fn name(&self) -> String {
        self.view(|c| c.name().to_string())
    }

    pub fn stats(&self) -> StatBlock {
        self.view(|c| c.stats())
    }

    pub fn is_defeated(&self) -> bool {
        self.view(|c| c.is_defeated())
    }

    pub fn mind(&self) -> Mind {
        self.view(|c| c.mind())
    }

    pub fn policy(&self) -> Option<Arc<dyn OpponentPolicy>> {
        self.view(|c| c.policy())
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Fighter::Character(handle) => Some(handle.user_id()),
            Fighter::Opponent(_) => None,
        }
    }

    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            Fighter::Character(handle) => handle.read().last_channel,
            Fighter::Opponent(_) => None,
        }
    }

    pub fn character(&self) -> Option<&CharacterHandle> {
        match self {
            Fighter::Character(handle) => Some(handle),
            Fighter::Opponent(_) => None,
        }
    }
}

impl From<CharacterHandle> for Fighter {
    fn from(handle: CharacterHandle) -> Self {
        Fighter::Character(handle)
    }
}

impl From<Opponent> for Fighter {
    fn from(opponent: Opponent) -> Self {
        Fighter::Opponent(opponent)
    }
}
