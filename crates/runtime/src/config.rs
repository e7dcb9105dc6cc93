//! Arena configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use arena_core::{BattleConfig, StartingStats};

/// Configuration for an [`Arena`](crate::Arena) and its registry.
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    pub battle: BattleConfig,
    pub starting: StartingStats,
    /// Money charged for a full heal.
    pub heal_cost: u32,
    /// Where character records live. `None` falls back to the platform data
    /// directory.
    pub data_dir: Option<PathBuf>,
    pub event_buffer_size: usize,
    /// Seeds the generator that hands out per-battle seeds. Random when unset.
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            starting: StartingStats::default(),
            heal_cost: Self::DEFAULT_HEAL_COST,
            data_dir: None,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER,
            seed: None,
        }
    }
}

impl ArenaConfig {
    pub const DEFAULT_HEAL_COST: u32 = 25;
    pub const DEFAULT_EVENT_BUFFER: usize = 100;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ARENA_DATA_DIR` - Directory for character records (default: platform-specific)
    /// - `ARENA_CRIT_MULTIPLIER` - Critical hit multiplier (default: 2)
    /// - `ARENA_EXPERIENCE_SPLIT` - `rewarded_team` or `defeated_team` (default: rewarded_team)
    /// - `ARENA_HEAL_COST` - Money charged per heal (default: 25)
    /// - `ARENA_MAX_CHAINED_ROUNDS` - Rounds resolved without a human submission (default: 1000)
    /// - `ARENA_EVENT_BUFFER` - Event bus capacity (default: 100)
    /// - `ARENA_SEED` - Fixed seed for reproducible battles (default: random)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.data_dir = env::var("ARENA_DATA_DIR").ok().map(PathBuf::from);

        if let Some(multiplier) = read_env::<u32>("ARENA_CRIT_MULTIPLIER") {
            config.battle.crit_multiplier = multiplier;
        }
        if let Some(split) = read_env("ARENA_EXPERIENCE_SPLIT") {
            config.battle.experience_split = split;
        }
        if let Some(rounds) = read_env::<u32>("ARENA_MAX_CHAINED_ROUNDS") {
            config.battle.max_chained_rounds = rounds.max(1);
        }
        if let Some(cost) = read_env::<u32>("ARENA_HEAL_COST") {
            config.heal_cost = cost;
        }
        if let Some(capacity) = read_env::<usize>("ARENA_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        config.seed = read_env::<u64>("ARENA_SEED");

        config
    }

    /// Configured data directory, or the platform default.
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(default_data_dir)
    }
}

/// Platform data directory for character records.
pub fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "arena").map(|dirs| dirs.data_dir().join("characters"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let value = env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", key, value);
            None
        }
    }
}
