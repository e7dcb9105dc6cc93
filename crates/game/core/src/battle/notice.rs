//! Outbound messages and per-call reports.

use crate::state::{ChannelId, CharacterHandle, UserId};

use super::Side;

/// Who a notice is meant for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Audience {
    /// Every participant of the battle.
    Battle,
    /// A single participant.
    Participant(UserId),
}

/// A message waiting to be delivered.
///
/// `channels` is resolved when the notice is queued and holds every
/// destination once, even when several participants share it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub audience: Audience,
    pub channels: Vec<ChannelId>,
    pub text: String,
}

/// How a battle ended.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEnd {
    Victory { side: Side, winners: Vec<String> },
    /// Both rosters fell in the same round.
    Draw,
    /// A roster emptied through leaving.
    Abandoned,
}

/// Side effects accumulated by engine calls, drained by the caller.
///
/// State is already committed when a report is drained; delivering notices
/// and persisting characters are the caller's follow-up work.
#[derive(Debug, Default)]
pub struct Report {
    pub notices: Vec<Notice>,
    /// Characters whose final state must be written to the durable store.
    pub persist: Vec<CharacterHandle>,
    /// Rounds resolved since the last drain.
    pub rounds: u32,
    pub ended: Option<BattleEnd>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty() && self.persist.is_empty() && self.rounds == 0 && self.ended.is_none()
    }

    /// Texts of all notices, in queue order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().map(|notice| notice.text.as_str())
    }

    pub(crate) fn queue_persist(&mut self, handle: &CharacterHandle) {
        if !self.persist.iter().any(|queued| queued.ptr_eq(handle)) {
            self.persist.push(handle.clone());
        }
    }
}
