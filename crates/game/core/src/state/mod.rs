//! Combatant state: ids, characters and opponents.

mod character;
mod common;
mod opponent;

pub use character::{Character, CharacterHandle};
pub use common::{BattleId, ChannelId, StatBlock, UserId};
pub use opponent::{Opponent, OpponentTemplate};
