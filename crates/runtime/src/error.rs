//! Unified error type surfaced by the arena service.
//!
//! Wraps failures from the engine, the character rules and the durable store,
//! and adds the precondition checks the command layer renders to players.
use arena_core::{BattleError, BattleId, CharacterError, ErrorSeverity, GameError, UserId};
use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Character(#[from] CharacterError),

    #[error("{0} is not registered")]
    NotRegistered(UserId),

    #[error("{0} is already in a battle")]
    AlreadyInBattle(UserId),

    #[error("{0} is not in a battle")]
    NotInBattle(UserId),

    #[error("{user} cannot do that while fighting in {battle}")]
    InBattle { user: UserId, battle: BattleId },

    #[error("a player cannot duel themselves")]
    SelfDuel,

    #[error("both sides need at least one combatant")]
    EmptyRoster,

    #[error("{0} was entered more than once")]
    DuplicateEntrant(UserId),
}

impl RuntimeError {
    /// How loudly the caller should report this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Repository(_) => ErrorSeverity::Internal,
            Self::Battle(err) => err.severity(),
            Self::Character(err) => err.severity(),
            _ => ErrorSeverity::Validation,
        }
    }
}
