//! Concurrent in-memory index of every known character.
//!
//! The registry is the source of truth for lookups during command handling.
//! Reads take a shared lock; registration takes the exclusive lock so that
//! simultaneous registrations of the same identity insert exactly once.
//! Stat mutations outside of battle go through here and are persisted on
//! success.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use arena_core::{Character, CharacterError, CharacterHandle, ChannelId, StartingStats, Stat, UserId};
use tracing::{debug, info, warn};

use crate::error::{Result, RuntimeError};
use crate::identity::IdentityResolver;
use crate::repository::CharacterRepository;

pub struct PlayerRegistry {
    players: RwLock<HashMap<UserId, CharacterHandle>>,
    repository: Arc<dyn CharacterRepository>,
    resolver: Arc<dyn IdentityResolver>,
    starting: StartingStats,
    heal_cost: u32,
}

impl PlayerRegistry {
    pub fn new(
        repository: Arc<dyn CharacterRepository>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            repository,
            resolver,
            starting: StartingStats::default(),
            heal_cost: crate::config::ArenaConfig::DEFAULT_HEAL_COST,
        }
    }

    pub fn with_starting_stats(mut self, starting: StartingStats) -> Self {
        self.starting = starting;
        self
    }

    pub fn with_heal_cost(mut self, heal_cost: u32) -> Self {
        self.heal_cost = heal_cost;
        self
    }

    /// Populates the index from the durable store.
    ///
    /// Names are resolved per record; an unresolvable identity keeps its
    /// record under the fallback name. Characters already in the index are
    /// left untouched. Returns the number of records added.
    pub fn load(&self) -> Result<usize> {
        let records = self.repository.load_all()?;

        let mut players = self.write_players();
        let mut loaded = 0;
        for mut character in records {
            let user = character.user_id;
            if players.contains_key(&user) {
                continue;
            }
            match self.resolver.resolve(user) {
                Some(identity) => character.name = Some(identity.name),
                None => warn!("Could not resolve identity of {}; keeping record", user),
            }
            players.insert(user, CharacterHandle::new(character));
            loaded += 1;
        }

        info!("Loaded {} characters into the registry", loaded);
        Ok(loaded)
    }

    pub fn get_player(&self, user: UserId) -> Option<CharacterHandle> {
        self.read_players().get(&user).cloned()
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.read_players().contains_key(&user)
    }

    /// Creates a default character for `user`.
    ///
    /// Returns `false` without touching anything when `user` already has one.
    /// The character is visible in memory before it is persisted.
    pub fn register(&self, user: UserId) -> Result<bool> {
        let handle = {
            let mut players = self.write_players();
            if players.contains_key(&user) {
                return Ok(false);
            }
            let handle = CharacterHandle::new(self.new_character(user));
            players.insert(user, handle.clone());
            handle
        };

        self.persist(&handle)?;
        info!("Registered {}", user);
        Ok(true)
    }

    /// Records where `user` was last seen. Transient, so nothing is persisted.
    pub fn touch(&self, user: UserId, channel: ChannelId) -> Result<()> {
        let handle = self.require(user)?;
        handle.write().last_channel = Some(channel);
        Ok(())
    }

    /// Restores full health for the configured price.
    pub fn heal(&self, user: UserId) -> Result<()> {
        let cost = self.heal_cost;
        self.mutate_idle(user, |character| character.heal(cost))?;
        debug!("{} healed for {}", user, cost);
        Ok(())
    }

    /// Spends unspent points on `stat`; returns the stat's new value.
    pub fn spend_points(&self, user: UserId, stat: Stat, amount: u32) -> Result<u32> {
        let value = self.mutate_idle(user, |character| character.spend_points(stat, amount))?;
        debug!("{} spent {} points on {}", user, amount, stat);
        Ok(value)
    }

    /// Restores the starting stat block.
    pub fn reset(&self, user: UserId) -> Result<()> {
        let starting = self.starting.clone();
        self.mutate_idle(user, |character| {
            character.reset(&starting);
            Ok(())
        })?;
        info!("Reset {}", user);
        Ok(())
    }

    /// Writes the current state of `handle` to the durable store.
    ///
    /// The read lock is held across the save. A newer state needs the write
    /// lock, so it cannot reach the store ahead of an older one.
    pub fn persist(&self, handle: &CharacterHandle) -> Result<()> {
        let character = handle.read();
        self.repository.save(&character)?;
        debug!("Persisted {}", character.user_id);
        Ok(())
    }

    pub fn starting_stats(&self) -> &StartingStats {
        &self.starting
    }

    pub fn len(&self) -> usize {
        self.read_players().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn require(&self, user: UserId) -> Result<CharacterHandle> {
        self.get_player(user)
            .ok_or(RuntimeError::NotRegistered(user))
    }

    /// Applies `f` to an idle character under its write lock, then persists.
    ///
    /// The battle check and the mutation share one lock so a battle starting
    /// concurrently cannot slip in between.
    fn mutate_idle<T>(
        &self,
        user: UserId,
        f: impl FnOnce(&mut Character) -> std::result::Result<T, CharacterError>,
    ) -> Result<T> {
        let handle = self.require(user)?;
        let value = {
            let mut character = handle.write();
            if let Some(battle) = character.battle {
                return Err(RuntimeError::InBattle { user, battle });
            }
            f(&mut character)?
        };
        self.persist(&handle)?;
        Ok(value)
    }

    fn new_character(&self, user: UserId) -> Character {
        let character = Character::new(user, &self.starting);
        match self.resolver.resolve(user) {
            Some(identity) => character.with_name(identity.name),
            None => character,
        }
    }

    // The map itself is never left half-updated, so a poisoned lock is safe
    // to keep using.
    fn read_players(&self) -> RwLockReadGuard<'_, HashMap<UserId, CharacterHandle>> {
        self.players.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_players(&self) -> RwLockWriteGuard<'_, HashMap<UserId, CharacterHandle>> {
        self.players.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use arena_core::BattleId;

    use super::*;
    use crate::identity::StaticResolver;
    use crate::repository::InMemoryCharacterRepo;

    fn registry() -> (PlayerRegistry, Arc<InMemoryCharacterRepo>) {
        let repo = Arc::new(InMemoryCharacterRepo::new());
        let resolver = StaticResolver::new().with(UserId(1), "ayla");
        let registry = PlayerRegistry::new(repo.clone(), Arc::new(resolver));
        (registry, repo)
    }

    #[test]
    fn register_twice_inserts_once() {
        let (registry, repo) = registry();
        assert!(registry.register(UserId(1)).unwrap());
        assert!(!registry.register(UserId(1)).unwrap());
        assert_eq!(registry.len(), 1);
        assert_eq!(repo.len(), 1);
        let handle = registry.get_player(UserId(1)).unwrap();
        assert_eq!(handle.read().display_name(), "ayla");
    }

    #[test]
    fn unresolved_identity_falls_back() {
        let (registry, _) = registry();
        registry.register(UserId(2)).unwrap();
        let handle = registry.get_player(UserId(2)).unwrap();
        assert_eq!(handle.read().display_name(), "Player");
    }

    #[test]
    fn mutations_are_rejected_mid_battle() {
        let (registry, _) = registry();
        registry.register(UserId(1)).unwrap();
        let handle = registry.get_player(UserId(1)).unwrap();
        {
            let mut character = handle.write();
            character.health = 10;
            character.battle = Some(BattleId(4));
        }

        assert!(matches!(
            registry.heal(UserId(1)),
            Err(RuntimeError::InBattle {
                battle: BattleId(4),
                ..
            })
        ));
        assert_eq!(handle.read().health, 10);

        handle.write().battle = None;
        registry.heal(UserId(1)).unwrap();
        assert_eq!(handle.read().health, 100);
        assert_eq!(handle.read().money, 225);
    }

    /// Stalls the first save so a second mutation can queue up behind it.
    struct StallingRepo {
        inner: InMemoryCharacterRepo,
        stalled: AtomicBool,
    }

    impl CharacterRepository for StallingRepo {
        fn save(&self, character: &Character) -> crate::repository::Result<()> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(200));
            }
            self.inner.save(character)
        }

        fn load(&self, user: UserId) -> crate::repository::Result<Option<Character>> {
            self.inner.load(user)
        }

        fn load_all(&self) -> crate::repository::Result<Vec<Character>> {
            self.inner.load_all()
        }

        fn delete(&self, user: UserId) -> crate::repository::Result<()> {
            self.inner.delete(user)
        }
    }

    #[test]
    fn store_keeps_the_latest_state_under_concurrent_mutations() {
        let mut character = Character::new(UserId(1), &StartingStats::default());
        character.health = 10;
        character.points = 1;
        let repo = Arc::new(StallingRepo {
            inner: InMemoryCharacterRepo::new(),
            // Seeding the index must not consume the stall.
            stalled: AtomicBool::new(true),
        });
        repo.inner.save(&character).unwrap();
        let registry = Arc::new(PlayerRegistry::new(
            repo.clone(),
            Arc::new(StaticResolver::new()),
        ));
        registry.load().unwrap();
        repo.stalled.store(false, Ordering::SeqCst);

        let spender = {
            let registry = registry.clone();
            thread::spawn(move || registry.spend_points(UserId(1), Stat::Attack, 1))
        };
        thread::sleep(Duration::from_millis(50));
        registry.heal(UserId(1)).unwrap();
        spender.join().unwrap().unwrap();

        let memory = registry.get_player(UserId(1)).unwrap().snapshot();
        let stored = repo.load(UserId(1)).unwrap().unwrap();
        assert_eq!(memory.health, memory.max_health);
        assert_eq!(stored.health, memory.health);
        assert_eq!(stored.money, memory.money);
        assert_eq!(stored.attack, memory.attack);
        assert_eq!(stored.points, 0);
    }

    #[test]
    fn heal_on_full_health_is_rejected() {
        let (registry, _) = registry();
        registry.register(UserId(1)).unwrap();
        assert!(matches!(
            registry.heal(UserId(1)),
            Err(RuntimeError::Character(CharacterError::AlreadyFullHealth))
        ));
    }

    #[test]
    fn unknown_user_is_not_registered() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.spend_points(UserId(8), Stat::Attack, 1),
            Err(RuntimeError::NotRegistered(UserId(8)))
        ));
    }
}
