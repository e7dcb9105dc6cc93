//! Broadcast bus for arena lifecycle events.
//!
//! Publishing is best-effort: with no subscribers the event is dropped, and a
//! lagging subscriber loses the oldest events.

use arena_core::{BattleEnd, BattleId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaEvent {
    PlayerRegistered {
        user: UserId,
    },
    BattleStarted {
        battle: BattleId,
        attackers: Vec<String>,
        opponents: Vec<String>,
        leaveable: bool,
    },
    RoundResolved {
        battle: BattleId,
        /// Rounds resolved by one call; autonomous rounds chain.
        rounds: u32,
    },
    BattleEnded {
        battle: BattleId,
        end: BattleEnd,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ArenaEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ArenaEvent) {
        if self.sender.send(event).is_err() {
            // No subscribers - this is normal, not an error
            tracing::trace!("No subscribers for arena event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArenaEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
