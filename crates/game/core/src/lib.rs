//! Deterministic battle rules and data types shared across the arena crates.
//!
//! `arena-core` defines the canonical rules (combatants, progression, damage
//! and the battle state machine) as pure, synchronous APIs. Every battle
//! mutation flows through [`battle::Battle`]; side effects come back as a
//! [`battle::Report`] for the runtime to deliver and persist.
pub mod battle;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod error;
pub mod policy;
pub mod progression;
pub mod state;

pub use battle::{
    Action, Audience, Battle, BattleEnd, BattleState, FighterId, Notice, Report, Side, Submission,
    TargetSelection,
};
pub use combatant::{Combatant, Fighter, Mind};
pub use config::{BattleConfig, ExperienceSplit, StartingStats};
pub use error::{BattleError, BattleResult, CharacterError, ErrorSeverity, GameError};
pub use policy::{AttackPolicy, IdlePolicy, OpponentPolicy, PolicyView};
pub use progression::{Stat, level_for};
pub use state::{
    BattleId, ChannelId, Character, CharacterHandle, Opponent, OpponentTemplate, StatBlock, UserId,
};
