//! Vocabulary of the battle engine.

use std::fmt;

/// Action a combatant commits for the round.
///
/// An empty pending-action slot stands for "no action yet".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    Attack,
}

/// One of the two rosters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    /// Heading used on the board.
    pub const fn label(self) -> &'static str {
        match self {
            Side::A => "Attackers",
            Side::B => "Opponents",
        }
    }
}

/// Index of a participant slot inside one battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FighterId(pub usize);

impl fmt::Display for FighterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fighter#{}", self.0)
    }
}

/// Lifecycle of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BattleState {
    /// Constructed, not started.
    Forming,
    /// Collecting actions for the current round.
    Active,
    /// Running a resolution pass.
    Resolving,
    /// Terminal.
    Ended,
}

/// What happened to a submitted action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Recorded; the round still waits on other combatants.
    Waiting,
    /// Recorded and the round (and possibly following ones) resolved.
    Resolved,
    /// The target was defeated, a new one was picked, and the action must be
    /// submitted again.
    Retargeted { target: String },
    /// The submitter is defeated and cannot act.
    Defeated,
}

/// Result of a human picking a target by its 1-based board number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetSelection {
    Selected { target: String },
    OutOfRange,
    Defeated { target: String },
}
