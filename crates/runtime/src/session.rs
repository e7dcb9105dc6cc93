//! One battle behind one async mutex.

use arena_core::{Battle, BattleId, Report, UserId};
use tokio::sync::Mutex;

/// Serialises every engine call on a battle.
///
/// Callers get the engine result together with the drained [`Report`]; the
/// lock is already released by then, so persistence and delivery never hold
/// up other participants of the same battle.
#[derive(Debug)]
pub struct BattleSession {
    id: BattleId,
    leaveable: bool,
    battle: Mutex<Battle>,
}

impl BattleSession {
    pub fn new(battle: Battle) -> Self {
        Self {
            id: battle.id(),
            leaveable: battle.is_leaveable(),
            battle: Mutex::new(battle),
        }
    }

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn is_leaveable(&self) -> bool {
        self.leaveable
    }

    /// Runs `f` under the lock and drains what it produced.
    pub async fn run<T>(&self, f: impl FnOnce(&mut Battle) -> T) -> (T, Report) {
        let mut battle = self.battle.lock().await;
        let value = f(&mut battle);
        let report = battle.drain();
        (value, report)
    }

    /// Read-only access under the lock.
    pub async fn inspect<T>(&self, f: impl FnOnce(&Battle) -> T) -> T {
        let battle = self.battle.lock().await;
        f(&battle)
    }

    pub async fn is_active(&self) -> bool {
        self.inspect(Battle::is_active).await
    }

    pub async fn participants(&self) -> Vec<UserId> {
        self.inspect(Battle::participants).await
    }

    pub async fn board(&self, viewer: UserId) -> String {
        self.inspect(|battle| battle.board(viewer)).await
    }
}
