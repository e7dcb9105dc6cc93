//! The arena service.
//!
//! [`Arena`] is constructed once and passed explicitly to whatever handles
//! player commands. It owns the battle directory, checks command
//! preconditions, and performs the follow-up work of every engine call:
//! persisting characters first, then delivering notices, then publishing
//! events.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arena_core::{
    Action, Battle, BattleId, Fighter, OpponentTemplate, Report, Side, Submission,
    TargetSelection, UserId,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::{RwLock, broadcast};
use tracing::{error, info, warn};

use crate::config::ArenaConfig;
use crate::error::{Result, RuntimeError};
use crate::events::{ArenaEvent, EventBus};
use crate::identity::{IdentityResolver, StaticResolver};
use crate::notify::{Notifier, NullNotifier, dispatch};
use crate::registry::PlayerRegistry;
use crate::repository::{CharacterRepository, InMemoryCharacterRepo};
use crate::session::BattleSession;

/// One roster entry when starting a battle.
#[derive(Clone, Debug)]
pub enum Entrant {
    /// A registered player's character.
    Player(UserId),
    /// A fresh opponent spawned from a template.
    Opponent(OpponentTemplate),
}

pub struct Arena {
    registry: Arc<PlayerRegistry>,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    config: ArenaConfig,
    battles: RwLock<HashMap<BattleId, Arc<BattleSession>>>,
    next_battle: AtomicU64,
    seeds: Mutex<StdRng>,
}

impl Arena {
    pub fn builder() -> ArenaBuilder {
        ArenaBuilder::new()
    }

    pub fn new(registry: Arc<PlayerRegistry>, notifier: Arc<dyn Notifier>, config: ArenaConfig) -> Self {
        let seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            registry,
            notifier,
            events: EventBus::with_capacity(config.event_buffer_size),
            config,
            battles: RwLock::new(HashMap::new()),
            next_battle: AtomicU64::new(1),
            seeds: Mutex::new(seeds),
        }
    }

    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArenaEvent> {
        self.events.subscribe()
    }

    /// Registers `user`, announcing new players on the event bus.
    pub fn register(&self, user: UserId) -> Result<bool> {
        let created = self.registry.register(user)?;
        if created {
            self.events.publish(ArenaEvent::PlayerRegistered { user });
        }
        Ok(created)
    }

    // ========================================================================
    // Starting battles
    // ========================================================================

    /// Player-versus-player battle. Duels cannot be left.
    pub async fn begin_duel(&self, challenger: UserId, defender: UserId) -> Result<BattleId> {
        if challenger == defender {
            return Err(RuntimeError::SelfDuel);
        }
        self.begin_battle(
            vec![Entrant::Player(challenger)],
            vec![Entrant::Player(defender)],
            false,
        )
        .await
    }

    /// Sparring match against the stock practice opponent.
    pub async fn begin_practice(&self, user: UserId) -> Result<BattleId> {
        self.begin_battle(
            vec![Entrant::Player(user)],
            vec![Entrant::Opponent(OpponentTemplate::practice())],
            true,
        )
        .await
    }

    /// Starts a battle between two rosters.
    ///
    /// Every player must be registered and idle. The availability check and
    /// the start happen under the directory's write lock, so nobody can end
    /// up in two battles at once.
    pub async fn begin_battle(
        &self,
        side_a: Vec<Entrant>,
        side_b: Vec<Entrant>,
        leaveable: bool,
    ) -> Result<BattleId> {
        if side_a.is_empty() || side_b.is_empty() {
            return Err(RuntimeError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        let side_a = self.fighters(side_a, &mut seen)?;
        let side_b = self.fighters(side_b, &mut seen)?;

        let mut battles = self.battles.write().await;
        for fighter in side_a.iter().chain(&side_b) {
            if let Some(handle) = fighter.character()
                && handle.read().battle.is_some()
            {
                return Err(RuntimeError::AlreadyInBattle(handle.user_id()));
            }
        }

        let id = BattleId(self.next_battle.fetch_add(1, Ordering::Relaxed));
        let mut battle = Battle::new(id, side_a, side_b, self.config.battle.clone(), self.next_seed())
            .leaveable(leaveable);
        let names = |battle: &Battle, side: Side| -> Vec<String> {
            battle
                .roster(side)
                .iter()
                .filter_map(|&fighter| battle.fighter(fighter).map(Fighter::name))
                .collect()
        };
        let started = ArenaEvent::BattleStarted {
            battle: id,
            attackers: names(&battle, Side::A),
            opponents: names(&battle, Side::B),
            leaveable,
        };

        battle.start();
        let report = battle.drain();
        if report.ended.is_none() {
            battles.insert(id, Arc::new(BattleSession::new(battle)));
        }
        drop(battles);

        info!("Started {} (leaveable: {})", id, leaveable);
        self.events.publish(started);
        self.follow_up(id, report).await?;
        Ok(id)
    }

    // ========================================================================
    // Battle commands
    // ========================================================================

    /// The battle `user` currently fights in.
    pub async fn battle_of(&self, user: UserId) -> Option<Arc<BattleSession>> {
        let battle = self.registry.get_player(user)?.read().battle?;
        self.battles.read().await.get(&battle).cloned()
    }

    pub async fn submit_action(&self, user: UserId, action: Action) -> Result<Submission> {
        let session = self.session_for(user).await?;
        let (submission, report) = session.run(|battle| battle.set_action(user, action)).await;
        self.follow_up(session.id(), report).await?;
        Ok(submission?)
    }

    /// Sets the raw target index of `user`; validated when the action resolves.
    pub async fn submit_target(&self, user: UserId, index: usize) -> Result<()> {
        let session = self.session_for(user).await?;
        let (outcome, report) = session.run(|battle| battle.set_target(user, index)).await;
        self.follow_up(session.id(), report).await?;
        Ok(outcome?)
    }

    /// Picks a target by its 1-based number on the board.
    pub async fn select_target(&self, user: UserId, number: usize) -> Result<TargetSelection> {
        let session = self.session_for(user).await?;
        let (selection, report) = session
            .run(|battle| battle.select_target(user, number))
            .await;
        self.follow_up(session.id(), report).await?;
        Ok(selection?)
    }

    pub async fn leave(&self, user: UserId) -> Result<bool> {
        let session = self.session_for(user).await?;
        let (left, report) = session.run(|battle| battle.leave(user)).await;
        self.follow_up(session.id(), report).await?;
        Ok(left?)
    }

    pub async fn board(&self, user: UserId) -> Result<String> {
        let session = self.session_for(user).await?;
        Ok(session.board(user).await)
    }

    /// Number of battles still running.
    pub async fn active_battles(&self) -> usize {
        self.battles.read().await.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn session_for(&self, user: UserId) -> Result<Arc<BattleSession>> {
        let handle = self
            .registry
            .get_player(user)
            .ok_or(RuntimeError::NotRegistered(user))?;
        let battle = handle.read().battle.ok_or(RuntimeError::NotInBattle(user))?;
        self.battles
            .read()
            .await
            .get(&battle)
            .cloned()
            .ok_or(RuntimeError::NotInBattle(user))
    }

    fn fighters(&self, entrants: Vec<Entrant>, seen: &mut HashSet<UserId>) -> Result<Vec<Fighter>> {
        entrants
            .into_iter()
            .map(|entrant| match entrant {
                Entrant::Player(user) => {
                    if !seen.insert(user) {
                        return Err(RuntimeError::DuplicateEntrant(user));
                    }
                    let handle = self
                        .registry
                        .get_player(user)
                        .ok_or(RuntimeError::NotRegistered(user))?;
                    Ok(Fighter::from(handle))
                }
                Entrant::Opponent(template) => Ok(Fighter::from(template.spawn())),
            })
            .collect()
    }

    fn next_seed(&self) -> u64 {
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_u64()
    }

    /// Post-commit work for one engine call.
    ///
    /// Persistence failures are logged and the first one is returned, but
    /// only after notices went out; delivery failures are logged only.
    async fn follow_up(&self, battle: BattleId, report: Report) -> Result<()> {
        if report.is_empty() {
            return Ok(());
        }

        let mut first_error = None;
        for handle in &report.persist {
            if let Err(err) = self.registry.persist(handle) {
                error!("Failed to persist {} after {}: {}", handle.user_id(), battle, err);
                first_error.get_or_insert(err);
            }
        }

        let failed = dispatch(self.notifier.as_ref(), &report.notices).await;
        if failed > 0 {
            warn!("{} notices from {} were not delivered", failed, battle);
        }

        if report.rounds > 0 {
            self.events.publish(ArenaEvent::RoundResolved {
                battle,
                rounds: report.rounds,
            });
        }
        if let Some(end) = report.ended {
            self.battles.write().await.remove(&battle);
            info!("{} ended: {:?}", battle, end);
            self.events.publish(ArenaEvent::BattleEnded { battle, end });
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Builder for [`Arena`] with in-memory defaults.
pub struct ArenaBuilder {
    config: ArenaConfig,
    repository: Option<Arc<dyn CharacterRepository>>,
    resolver: Option<Arc<dyn IdentityResolver>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ArenaBuilder {
    fn new() -> Self {
        Self {
            config: ArenaConfig::default(),
            repository: None,
            resolver: None,
            notifier: None,
        }
    }

    pub fn config(mut self, config: ArenaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn repository(mut self, repository: Arc<dyn CharacterRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Builds the registry, loads it from the repository and wraps it in an
    /// arena.
    pub fn build(self) -> Result<Arena> {
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryCharacterRepo::new()));
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(StaticResolver::new()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(NullNotifier));

        let registry = PlayerRegistry::new(repository, resolver)
            .with_starting_stats(self.config.starting.clone())
            .with_heal_cost(self.config.heal_cost);
        registry.load()?;

        Ok(Arena::new(Arc::new(registry), notifier, self.config))
    }
}
