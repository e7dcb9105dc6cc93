//! File-based CharacterRepository implementation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use arena_core::{Character, UserId};
use tempfile::NamedTempFile;

use super::{CharacterRepository, RepositoryError, Result};

/// File-based implementation of [`CharacterRepository`].
///
/// # File Format
///
/// Each character is stored as `character_{user_id}.bin` in bincode format.
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileCharacterRepository {
    base_dir: PathBuf,
}

impl FileCharacterRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, user: UserId) -> PathBuf {
        self.base_dir.join(format!("character_{}.bin", user.0))
    }

    fn decode(path: &Path) -> Result<Character> {
        let bytes = fs::read(path)?;
        bincode::deserialize(&bytes).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

impl CharacterRepository for FileCharacterRepository {
    fn save(&self, character: &Character) -> Result<()> {
        let path = self.record_path(character.user_id);

        let bytes = bincode::serialize(character)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        // Each save gets its own temporary file, so concurrent saves of one
        // user never share a partially written file.
        let mut temp = NamedTempFile::new_in(&self.base_dir)?;
        temp.write_all(&bytes)?;
        temp.persist(&path).map_err(|e| RepositoryError::Io(e.error))?;

        tracing::debug!("Saved {} to {}", character.user_id, path.display());
        Ok(())
    }

    fn load(&self, user: UserId) -> Result<Option<Character>> {
        let path = self.record_path(user);
        if !path.exists() {
            return Ok(None);
        }

        let character = Self::decode(&path)?;
        tracing::debug!("Loaded {} from {}", user, path.display());
        Ok(Some(character))
    }

    fn load_all(&self) -> Result<Vec<Character>> {
        let mut characters = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();

            let Some(id) = path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|name| name.strip_prefix("character_"))
                .and_then(|s| s.strip_suffix(".bin"))
                .and_then(|s| s.parse::<u64>().ok())
            else {
                continue;
            };

            match Self::decode(&path) {
                Ok(character) if character.user_id == UserId(id) => characters.push(character),
                Ok(character) => tracing::warn!(
                    "Skipping {}: record belongs to {}",
                    path.display(),
                    character.user_id
                ),
                Err(err) => tracing::warn!("Skipping unreadable record {}: {}", path.display(), err),
            }
        }

        characters.sort_unstable_by_key(|character| character.user_id);
        tracing::debug!(
            "Loaded {} character records from {}",
            characters.len(),
            self.base_dir.display()
        );
        Ok(characters)
    }

    fn delete(&self, user: UserId) -> Result<()> {
        let path = self.record_path(user);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted {}", user);
        }
        Ok(())
    }

    fn exists(&self, user: UserId) -> bool {
        self.record_path(user).exists()
    }
}

#[cfg(test)]
mod tests {
    use arena_core::StartingStats;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn save_replaces_the_previous_record() {
        let dir = TempDir::new().unwrap();
        let repo = FileCharacterRepository::new(dir.path()).unwrap();

        let mut character = Character::new(UserId(5), &StartingStats::default());
        repo.save(&character).unwrap();
        character.money = 3;
        repo.save(&character).unwrap();

        assert_eq!(repo.load(UserId(5)).unwrap().map(|c| c.money), Some(3));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn concurrent_saves_of_one_user_leave_a_single_readable_record() {
        let dir = TempDir::new().unwrap();
        let repo = FileCharacterRepository::new(dir.path()).unwrap();

        std::thread::scope(|scope| {
            for money in 0..8 {
                let repo = &repo;
                scope.spawn(move || {
                    let mut character = Character::new(UserId(3), &StartingStats::default());
                    character.money = money;
                    repo.save(&character).unwrap();
                });
            }
        });

        let money = repo.load(UserId(3)).unwrap().map(|c| c.money);
        assert!(matches!(money, Some(0..=7)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn load_all_skips_garbage() {
        let dir = TempDir::new().unwrap();
        let repo = FileCharacterRepository::new(dir.path()).unwrap();
        repo.save(&Character::new(UserId(1), &StartingStats::default()))
            .unwrap();
        fs::write(dir.path().join("character_2.bin"), b"not bincode").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let all = repo.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_id, UserId(1));
    }

    #[test]
    fn missing_record_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let repo = FileCharacterRepository::new(dir.path()).unwrap();
        assert_eq!(repo.load(UserId(9)).unwrap(), None);
        assert!(!repo.exists(UserId(9)));
        repo.delete(UserId(9)).unwrap();
    }
}
