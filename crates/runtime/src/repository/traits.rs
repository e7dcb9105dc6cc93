//! Repository contract for the durable character store.

use arena_core::{Character, UserId};

use super::Result;

/// Durable store for character records.
///
/// Only the persisted part of a [`Character`] survives a round trip; the
/// transient fields (display name, last channel, battle) come back empty.
pub trait CharacterRepository: Send + Sync {
    /// Insert or replace the record for `character.user_id`.
    fn save(&self, character: &Character) -> Result<()>;

    fn load(&self, user: UserId) -> Result<Option<Character>>;

    /// Every readable record. Records that cannot be decoded are skipped.
    fn load_all(&self) -> Result<Vec<Character>>;

    fn delete(&self, user: UserId) -> Result<()>;

    fn exists(&self, user: UserId) -> bool {
        matches!(self.load(user), Ok(Some(_)))
    }
}
