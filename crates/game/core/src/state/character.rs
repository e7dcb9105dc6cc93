//! Player-controlled, persisted combatant.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::StartingStats;
use crate::error::CharacterError;
use crate::progression::{self, Stat};

use super::{BattleId, ChannelId, StatBlock, UserId};

/// A registered player's character.
///
/// Everything except the transient fields (`name`, `last_channel`, `battle`)
/// is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Character {
    pub user_id: UserId,
    pub attack: u32,
    pub defend: u32,
    pub speed: u32,
    pub critical_rate: u32,
    pub max_health: u32,
    pub health: u32,
    pub experience: u64,
    /// Unspent stat points.
    pub points: u32,
    pub money: u32,

    /// Display name resolved from the external identity.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub name: Option<String>,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub last_channel: Option<ChannelId>,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub battle: Option<BattleId>,
}

impl Character {
    pub const FALLBACK_NAME: &'static str = "Player";

    pub fn new(user_id: UserId, starting: &StartingStats) -> Self {
        Self {
            user_id,
            attack: starting.attack,
            defend: starting.defend,
            speed: starting.speed,
            critical_rate: starting.critical_rate,
            max_health: starting.max_health,
            health: starting.max_health,
            experience: 0,
            points: 0,
            money: starting.money,
            name: None,
            last_channel: None,
            battle: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(Self::FALLBACK_NAME)
    }

    pub fn level(&self) -> u32 {
        progression::level_for(self.experience)
    }

    pub fn stats(&self) -> StatBlock {
        StatBlock {
            attack: self.attack,
            defend: self.defend,
            speed: self.speed,
            critical_rate: self.critical_rate,
            health: self.health,
            max_health: self.max_health,
        }
    }

    /// Adds experience and grants one point per level gained.
    ///
    /// Returns the number of levels gained (possibly zero).
    pub fn add_experience(&mut self, amount: u64) -> u32 {
        let before = self.experience;
        self.experience = before.saturating_add(amount);
        let gained = progression::levels_gained(before, self.experience);
        self.points = self.points.saturating_add(gained);
        gained
    }

    /// Pays `cost` to restore full health.
    pub fn heal(&mut self, cost: u32) -> Result<(), CharacterError> {
        if self.health >= self.max_health {
            return Err(CharacterError::AlreadyFullHealth);
        }
        if self.money < cost {
            return Err(CharacterError::InsufficientFunds {
                cost,
                available: self.money,
            });
        }
        self.money -= cost;
        self.health = self.max_health;
        Ok(())
    }

    /// Spends `amount` unspent points on `stat`, returning the new stat value.
    pub fn spend_points(&mut self, stat: Stat, amount: u32) -> Result<u32, CharacterError> {
        if amount == 0 {
            return Err(CharacterError::ZeroAmount);
        }
        if self.points < amount {
            return Err(CharacterError::InsufficientPoints {
                requested: amount,
                available: self.points,
            });
        }
        self.points -= amount;
        let value = match stat {
            Stat::Health => {
                self.max_health = self
                    .max_health
                    .saturating_add(amount.saturating_mul(Stat::HEALTH_PER_POINT));
                self.max_health
            }
            Stat::Attack => {
                self.attack = self.attack.saturating_add(amount);
                self.attack
            }
            Stat::Defend => {
                self.defend = self.defend.saturating_add(amount);
                self.defend
            }
            Stat::Speed => {
                self.speed = self.speed.saturating_add(amount);
                self.speed
            }
        };
        Ok(value)
    }

    /// Restores the starting stat block, keeping identity and transient fields.
    pub fn reset(&mut self, starting: &StartingStats) {
        let fresh = Self::new(self.user_id, starting);
        *self = Self {
            name: self.name.take(),
            last_channel: self.last_channel,
            battle: self.battle,
            ..fresh
        };
    }
}

/// Shared handle to a character.
///
/// The registry owns the handle; battles hold clones for the duration of a
/// fight. A poisoned lock still yields the inner value since every mutation
/// leaves the character in a consistent state.
#[derive(Clone, Debug)]
pub struct CharacterHandle(Arc<RwLock<Character>>);

impl CharacterHandle {
    pub fn new(character: Character) -> Self {
        Self(Arc::new(RwLock::new(character)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Character> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Character> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_id(&self) -> UserId {
        self.read().user_id
    }

    /// Owned copy of the current state, for persistence and inspection.
    pub fn snapshot(&self) -> Character {
        self.read().clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Character {
        Character::new(UserId(7), &StartingStats::default())
    }

    #[test]
    fn new_character_uses_starting_block() {
        let c = fresh();
        assert_eq!((c.attack, c.defend, c.speed), (10, 10, 1));
        assert_eq!((c.health, c.max_health), (100, 100));
        assert_eq!((c.money, c.experience, c.points), (250, 0, 0));
        assert_eq!(c.level(), 1);
        assert_eq!(c.display_name(), "Player");
    }

    #[test]
    fn experience_grants_points_per_level() {
        let mut c = fresh();
        assert_eq!(c.add_experience(8), 2);
        assert_eq!(c.level(), 3);
        assert_eq!(c.points, 2);
        assert_eq!(c.add_experience(1), 0);
        assert_eq!(c.points, 2);
    }

    #[test]
    fn heal_costs_money_and_restores_health() {
        let mut c = fresh();
        assert_eq!(c.heal(25), Err(CharacterError::AlreadyFullHealth));

        c.health = 40;
        c.heal(25).unwrap();
        assert_eq!(c.health, 100);
        assert_eq!(c.money, 225);

        c.health = 1;
        c.money = 10;
        assert_eq!(
            c.heal(25),
            Err(CharacterError::InsufficientFunds {
                cost: 25,
                available: 10
            })
        );
        assert_eq!(c.health, 1);
    }

    #[test]
    fn spending_points_raises_the_stat() {
        let mut c = fresh();
        c.points = 3;
        assert_eq!(c.spend_points(Stat::Health, 2), Ok(110));
        assert_eq!(c.spend_points(Stat::Speed, 1), Ok(2));
        assert_eq!(c.points, 0);
        assert_eq!(
            c.spend_points(Stat::Attack, 1),
            Err(CharacterError::InsufficientPoints {
                requested: 1,
                available: 0
            })
        );
        assert_eq!(c.attack, 10);
    }

    #[test]
    fn reset_keeps_transient_fields() {
        let mut c = fresh().with_name("ayla");
        c.last_channel = Some(ChannelId(3));
        c.attack = 40;
        c.experience = 99;
        c.reset(&StartingStats::default());
        assert_eq!(c.attack, 10);
        assert_eq!(c.experience, 0);
        assert_eq!(c.display_name(), "ayla");
        assert_eq!(c.last_channel, Some(ChannelId(3)));
    }
}
