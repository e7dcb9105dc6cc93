//! Common error infrastructure for arena-core.
//!
//! Domain errors are kept deliberately small: user-facing rejections (target
//! out of range, not leaveable, ...) are reported as notices, not errors. The
//! types here cover contract violations and rejected stat mutations.

use crate::state::{BattleId, UserId};

/// Severity level of an error, used by callers to choose how loudly to log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Invalid input; the caller should reject without retrying.
    Validation,

    /// Call-site guards should have prevented this. Indicates a bug.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all arena-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for this error variant, for metrics and tests.
    fn error_code(&self) -> &'static str;
}

/// Errors raised by battle mutators.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("{user} is not a participant in {battle}")]
    NotParticipant { user: UserId, battle: BattleId },

    #[error("{0} is not active")]
    NotActive(BattleId),
}

impl GameError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotParticipant { .. } => ErrorSeverity::Internal,
            Self::NotActive(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotParticipant { .. } => "BATTLE_NOT_PARTICIPANT",
            Self::NotActive(_) => "BATTLE_NOT_ACTIVE",
        }
    }
}

/// Errors raised by stat mutations outside of battle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CharacterError {
    #[error("already on full health")]
    AlreadyFullHealth,

    #[error("not enough money: {cost} needed, {available} available")]
    InsufficientFunds { cost: u32, available: u32 },

    #[error("not enough points: {requested} requested, {available} available")]
    InsufficientPoints { requested: u32, available: u32 },

    #[error("amount must be at least one")]
    ZeroAmount,
}

impl GameError for CharacterError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyFullHealth => "CHARACTER_FULL_HEALTH",
            Self::InsufficientFunds { .. } => "CHARACTER_INSUFFICIENT_FUNDS",
            Self::InsufficientPoints { .. } => "CHARACTER_INSUFFICIENT_POINTS",
            Self::ZeroAmount => "CHARACTER_ZERO_AMOUNT",
        }
    }
}

pub type BattleResult<T> = Result<T, BattleError>;
