//! In-memory CharacterRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use arena_core::{Character, UserId};

use super::{CharacterRepository, RepositoryError, Result};

/// In-memory implementation of [`CharacterRepository`].
#[derive(Debug, Default)]
pub struct InMemoryCharacterRepo {
    records: RwLock<HashMap<UserId, Character>>,
}

impl InMemoryCharacterRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create pre-populated with `characters`.
    pub fn with_characters(characters: impl IntoIterator<Item = Character>) -> Self {
        let records = characters
            .into_iter()
            .map(|character| (character.user_id, strip_transient(character)))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CharacterRepository for InMemoryCharacterRepo {
    fn save(&self, character: &Character) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.insert(character.user_id, strip_transient(character.clone()));
        Ok(())
    }

    fn load(&self, user: UserId) -> Result<Option<Character>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.get(&user).cloned())
    }

    fn load_all(&self) -> Result<Vec<Character>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut all: Vec<Character> = records.values().cloned().collect();
        all.sort_unstable_by_key(|character| character.user_id);
        Ok(all)
    }

    fn delete(&self, user: UserId) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.remove(&user);
        Ok(())
    }
}

/// Mirrors what a serialized record keeps.
fn strip_transient(mut character: Character) -> Character {
    character.name = None;
    character.last_channel = None;
    character.battle = None;
    character
}
